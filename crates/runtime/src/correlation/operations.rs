//! In-flight asynchronous operations.
//!
//! Each asynchronous adapter (script evaluation, cookie fetch, screenshot,
//! find) registers a [`PendingOperation`] before handing work to the engine.
//! The operation resolves exactly once, by whichever comes first:
//!
//! - the engine completion calling [`PendingOperation::complete`]
//! - [`OperationRegistry::cancel_all`] during teardown
//! - the operation being dropped unresolved
//!
//! The last two deliver the cancellation value supplied at registration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Identifier of an in-flight operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId(u64);

impl OperationId {
	pub fn get(self) -> u64 {
		self.0
	}
}

type Canceller = Box<dyn FnOnce() + Send + 'static>;
type Completion<T> = Box<dyn FnOnce(T) + Send + 'static>;

#[derive(Default)]
struct RegistryState {
	closed: bool,
	pending: HashMap<OperationId, Canceller>,
}

struct RegistryInner {
	next_id: AtomicU64,
	state: Mutex<RegistryState>,
}

/// Holds the completion callback until it fires.
struct Slot<T> {
	completion: Mutex<Option<Completion<T>>>,
}

impl<T> Slot<T> {
	fn fire(&self, value: T) -> bool {
		// Take under the lock, call outside it.
		let completion = self.completion.lock().take();
		match completion {
			Some(completion) => {
				completion(value);
				true
			}
			None => false,
		}
	}

	fn is_armed(&self) -> bool {
		self.completion.lock().is_some()
	}
}

/// Registry of in-flight operations for one session.
#[derive(Clone)]
pub struct OperationRegistry {
	inner: Arc<RegistryInner>,
}

impl Default for OperationRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for OperationRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.inner.state.lock();
		f.debug_struct("OperationRegistry")
			.field("closed", &state.closed)
			.field("pending", &state.pending.len())
			.finish()
	}
}

impl OperationRegistry {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(RegistryInner {
				next_id: AtomicU64::new(1),
				state: Mutex::new(RegistryState::default()),
			}),
		}
	}

	/// Registers an operation.
	///
	/// `completion` receives exactly one value: the engine's result, or
	/// `cancelled` if the registry is cancelled or the operation is dropped
	/// unresolved. If the registry is already closed, `completion` receives
	/// `cancelled` before this returns.
	pub fn begin<T, F>(&self, cancelled: T, completion: F) -> PendingOperation<T>
	where
		T: Clone + Send + 'static,
		F: FnOnce(T) + Send + 'static,
	{
		let id = OperationId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));
		let slot = Arc::new(Slot {
			completion: Mutex::new(Some(Box::new(completion) as Completion<T>)),
		});

		let rejected = {
			let mut state = self.inner.state.lock();
			if state.closed {
				true
			} else {
				let cancel_slot = Arc::clone(&slot);
				let cancel_value = cancelled.clone();
				state.pending.insert(
					id,
					Box::new(move || {
						cancel_slot.fire(cancel_value);
					}),
				);
				false
			}
		};

		if rejected {
			tracing::debug!(id = id.0, "operation registered after cancellation");
			slot.fire(cancelled.clone());
		}

		PendingOperation {
			id,
			slot,
			cancelled,
			registry: Arc::downgrade(&self.inner),
		}
	}

	/// Resolves every pending operation with its cancellation value and
	/// rejects future registrations. Returns how many were cancelled.
	///
	/// Completions run on the calling thread, after the registry lock is
	/// released.
	pub fn cancel_all(&self) -> usize {
		let drained: Vec<Canceller> = {
			let mut state = self.inner.state.lock();
			state.closed = true;
			state.pending.drain().map(|(_, cancel)| cancel).collect()
		};
		let count = drained.len();
		for cancel in drained {
			cancel();
		}
		count
	}

	/// Returns true once [`cancel_all`](Self::cancel_all) has run.
	pub fn is_closed(&self) -> bool {
		self.inner.state.lock().closed
	}

	/// Number of operations still awaiting resolution.
	pub fn len(&self) -> usize {
		self.inner.state.lock().pending.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Handle to one in-flight operation.
///
/// Move it into the engine completion and call
/// [`complete`](Self::complete) there. Dropping it unresolved delivers the
/// cancellation value.
pub struct PendingOperation<T: Clone + Send + 'static> {
	id: OperationId,
	slot: Arc<Slot<T>>,
	cancelled: T,
	registry: Weak<RegistryInner>,
}

impl<T: Clone + Send + 'static> std::fmt::Debug for PendingOperation<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PendingOperation")
			.field("id", &self.id)
			.field("live", &self.is_live())
			.finish()
	}
}

impl<T: Clone + Send + 'static> PendingOperation<T> {
	pub fn id(&self) -> OperationId {
		self.id
	}

	/// Returns false once the operation has resolved, including by
	/// cancellation.
	pub fn is_live(&self) -> bool {
		self.slot.is_armed()
	}

	/// Delivers the engine's result.
	///
	/// Returns false if the operation had already been cancelled; the value
	/// is dropped in that case.
	pub fn complete(self, value: T) -> bool {
		self.finish(value)
	}

	fn finish(&self, value: T) -> bool {
		if let Some(registry) = self.registry.upgrade() {
			registry.state.lock().pending.remove(&self.id);
		}
		self.slot.fire(value)
	}
}

impl<T: Clone + Send + 'static> Drop for PendingOperation<T> {
	fn drop(&mut self) {
		if self.slot.is_armed() && self.finish(self.cancelled.clone()) {
			tracing::debug!(id = self.id.0, "operation dropped unresolved");
		}
	}
}
