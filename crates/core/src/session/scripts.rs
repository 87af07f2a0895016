//! Script evaluation and persistent user scripts.

use std::sync::Arc;

use wv_runtime::{Error, Result, ScriptRequestId};

use super::Session;
use crate::callbacks::ScriptResult;
use crate::engine::UserScriptId;

/// Outcome reported when the session detaches mid-evaluation.
const DETACHED: &str = "Detached";

impl Session {
	/// Evaluates `source` in the page.
	///
	/// The result arrives later through the script-result callback, tagged
	/// with `id`. Ids are chosen by the caller and echoed back unchanged.
	///
	/// Without a live view nothing is evaluated and no result is reported.
	/// If the session detaches while the evaluation is in flight, the result
	/// reports the error `"Detached"`.
	pub fn evaluate_script(&self, id: ScriptRequestId, source: &str) -> Result<()> {
		if id.0 == 0 {
			return Err(Error::InvalidArgument("script request id 0".to_string()));
		}
		let source = source.to_string();
		self.with_view(move |inner, view| {
			let session = Arc::downgrade(inner);
			let operation = inner.operations.begin(
				(None, Some(DETACHED.to_string())),
				move |(value, error): (Option<String>, Option<String>)| {
					if let Some(session) = session.upgrade() {
						session
							.callbacks
							.script_result(&ScriptResult { id, value, error });
					}
				},
			);
			tracing::debug!(%id, "evaluating script");
			view.evaluate_script(
				&source,
				Box::new(move |result| {
					let outcome = match result {
						Ok(value) => (value, None),
						Err(err) => (None, Some(err.message)),
					};
					if !operation.complete(outcome) {
						tracing::debug!(%id, "discarding late script result");
					}
				}),
			);
		})
	}

	/// Injects `source` into every document loaded from now on.
	pub fn add_user_script(&self, source: &str) -> Result<UserScriptId> {
		let source = source.to_string();
		self.on_owner(move |inner| {
			let content = inner.live_content()?;
			Ok(content.add_user_script(&source))
		})?
	}

	/// Removes every injected user script.
	pub fn remove_all_user_scripts(&self) -> Result<()> {
		self.on_owner(|inner| {
			let content = inner.live_content()?;
			content.remove_all_user_scripts();
			Ok(())
		})?
	}
}
