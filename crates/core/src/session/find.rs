//! Find-in-page adapter.
//!
//! A search issues both a search and a match count. The first find signal
//! to arrive resolves the callback; the listener is then disconnected.
//!
//! Find signals are view-wide, so a session has at most one pending search.
//! Starting another search or calling `stop_find` resolves the pending one
//! with `(-1, 0)`.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use wv_protocol::{FindOptions, FindResult};
use wv_runtime::PendingOperation;

use super::Session;
use crate::engine::{FindController, FindListener, FindSignal, SignalHandlerId};

/// Upper bound passed to the engine's match counter.
const MAX_MATCHES: u32 = u32::MAX;

/// State shared between the adapter and its signal listener.
pub(super) struct FindState {
	operation: Mutex<Option<PendingOperation<FindResult>>>,
	handler: Mutex<Option<SignalHandlerId>>,
	controller: Weak<dyn FindController>,
}

impl FindState {
	fn on_signal(&self, signal: FindSignal) {
		let Some(operation) = self.operation.lock().take() else {
			return;
		};
		self.disconnect();
		let result = match signal {
			FindSignal::CountedMatches(total) => FindResult::from_count(total),
			FindSignal::FailedToFind => FindResult::NOT_FOUND,
		};
		tracing::debug!(total = result.total_matches, "find resolved");
		operation.complete(result);
	}

	/// Resolves as not found if no signal got there first.
	fn supersede(&self) {
		let Some(operation) = self.operation.lock().take() else {
			return;
		};
		self.disconnect();
		tracing::debug!("find superseded");
		operation.complete(FindResult::NOT_FOUND);
	}

	pub(super) fn disconnect(&self) {
		let handler = self.handler.lock().take();
		if let (Some(handler), Some(controller)) = (handler, self.controller.upgrade()) {
			controller.disconnect(handler);
		}
	}
}

impl Session {
	/// Searches the page for `text`, wrapping around the document.
	///
	/// `callback` receives `(0, n)` when `n > 0` matches exist and
	/// `(-1, 0)` when nothing matched, the text is empty, or there is no live
	/// view.
	pub fn find_text<F>(&self, text: &str, case_sensitive: bool, forward: bool, callback: F)
	where
		F: FnOnce(FindResult) + Send + 'static,
	{
		let operation = self.inner.operations.begin(FindResult::NOT_FOUND, callback);
		if text.is_empty() {
			operation.complete(FindResult::NOT_FOUND);
			return;
		}

		let text = text.to_string();
		let options = FindOptions::new(case_sensitive, forward);

		self.post_to_view(move |inner, view| {
			let previous = inner.pending_find.lock().take();
			if let Some(previous) = previous {
				previous.supersede();
			}

			let controller = view.find_controller();
			let state = Arc::new(FindState {
				operation: Mutex::new(Some(operation)),
				handler: Mutex::new(None),
				controller: Arc::downgrade(&controller),
			});

			let listener_state = Arc::clone(&state);
			let listener: FindListener = Arc::new(move |signal| listener_state.on_signal(signal));
			let handler = controller.connect(listener);
			*state.handler.lock() = Some(handler);
			*inner.pending_find.lock() = Some(state);

			controller.search(&text, options, MAX_MATCHES);
			controller.count_matches(&text, options, MAX_MATCHES);
		});
	}

	/// Ends the current search and clears highlights. A search still waiting
	/// for its result reports `(-1, 0)`.
	pub fn stop_find(&self) {
		self.post_to_view(|inner, view| {
			let pending = inner.pending_find.lock().take();
			if let Some(pending) = pending {
				pending.supersede();
			}
			view.find_controller().finish();
		});
	}
}
