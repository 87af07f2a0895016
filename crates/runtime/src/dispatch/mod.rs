//! Owner-thread dispatch.
//!
//! Engine objects may only be touched from the thread that owns the engine's
//! main loop. [`Dispatcher`] marshals closures onto that thread: synchronously
//! with [`run_on_owner_thread`](Dispatcher::run_on_owner_thread), or
//! fire-and-forget with [`invoke`](Dispatcher::invoke).
//!
//! Calls made from the owner thread itself run inline, so reentrant calls
//! (a callback that calls back into the session) never deadlock.

mod main_loop;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

pub use main_loop::{LoopHandle, MainLoop};

use crate::error::{Error, Result};

/// A unit of work queued onto an owner loop.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A loop bound to a single owner thread.
///
/// Engine bindings implement this over their toolkit's main loop (idle
/// sources, posted messages, and so on). [`MainLoop`] is a ready-made
/// implementation for hosts without one.
pub trait RunLoop: Send + Sync {
	/// Returns true if the calling thread is the loop's owner thread.
	fn is_owner(&self) -> bool;

	/// Queues a task to run on the owner thread.
	///
	/// Returns false if the loop no longer accepts work. The task is dropped
	/// in that case.
	fn post(&self, task: Task) -> bool;
}

/// Marshals work onto a [`RunLoop`]'s owner thread.
#[derive(Clone)]
pub struct Dispatcher {
	run_loop: Arc<dyn RunLoop>,
}

impl std::fmt::Debug for Dispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Dispatcher")
			.field("on_owner_thread", &self.is_owner_thread())
			.finish()
	}
}

impl Dispatcher {
	pub fn new(run_loop: Arc<dyn RunLoop>) -> Self {
		Self { run_loop }
	}

	/// Returns true if the calling thread is the owner thread.
	pub fn is_owner_thread(&self) -> bool {
		self.run_loop.is_owner()
	}

	/// Runs `action` on the owner thread and returns its value.
	///
	/// On the owner thread the action runs inline. From any other thread it is
	/// queued and the caller blocks until it has run.
	///
	/// # Errors
	///
	/// - [`Error::LoopClosed`] if the loop refused the task
	/// - [`Error::DispatchAborted`] if the task was dropped unrun or panicked
	pub fn run_on_owner_thread<F, R>(&self, action: F) -> Result<R>
	where
		F: FnOnce() -> R + Send + 'static,
		R: Send + 'static,
	{
		if self.run_loop.is_owner() {
			return Ok(action());
		}

		let call = Arc::new(SyncCall::new());
		let guard = CompletionGuard {
			call: Arc::clone(&call),
		};

		let task: Task = Box::new(move || {
			let value = action();
			guard.complete(value);
		});

		if !self.run_loop.post(task) {
			tracing::debug!("owner loop refused synchronous dispatch");
			return Err(Error::LoopClosed);
		}

		call.wait()
	}

	/// Queues `action` on the owner thread without waiting for it.
	///
	/// The action is always queued, even when called from the owner thread, so
	/// it runs after the current callback returns.
	pub fn invoke<F>(&self, action: F) -> Result<()>
	where
		F: FnOnce() + Send + 'static,
	{
		if self.run_loop.post(Box::new(action)) {
			Ok(())
		} else {
			tracing::debug!("owner loop refused queued dispatch");
			Err(Error::LoopClosed)
		}
	}
}

enum CallState<R> {
	Pending,
	Finished(R),
	Aborted,
}

/// Rendezvous between a blocked caller and its queued task.
struct SyncCall<R> {
	state: Mutex<CallState<R>>,
	done: Condvar,
}

impl<R> SyncCall<R> {
	fn new() -> Self {
		Self {
			state: Mutex::new(CallState::Pending),
			done: Condvar::new(),
		}
	}

	/// Stores the outcome. Only the first call has any effect.
	fn finish(&self, outcome: CallState<R>) {
		let mut state = self.state.lock();
		if matches!(*state, CallState::Pending) {
			*state = outcome;
			self.done.notify_one();
		}
	}

	fn wait(&self) -> Result<R> {
		let mut state = self.state.lock();
		while matches!(*state, CallState::Pending) {
			self.done.wait(&mut state);
		}
		match std::mem::replace(&mut *state, CallState::Aborted) {
			CallState::Finished(value) => Ok(value),
			_ => Err(Error::DispatchAborted),
		}
	}
}

/// Wakes the caller with [`Error::DispatchAborted`] if the task is dropped
/// without finishing, whether unrun or unwinding.
struct CompletionGuard<R> {
	call: Arc<SyncCall<R>>,
}

impl<R> CompletionGuard<R> {
	fn complete(&self, value: R) {
		self.call.finish(CallState::Finished(value));
	}
}

impl<R> Drop for CompletionGuard<R> {
	fn drop(&mut self) {
		self.call.finish(CallState::Aborted);
	}
}
