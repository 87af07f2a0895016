//! [`Session`]: the lifecycle container for one embedded view.
//!
//! A session starts `Created` with no engine objects. [`Session::attach`]
//! builds the view on the owner thread; [`Session::detach`] tears it down.
//! Detach is terminal and idempotent.
//!
//! Feature methods live in sibling files (`navigation.rs`, `cookies.rs`,
//! `capture.rs`, `find.rs`, `scripts.rs`, `tools.rs`, `config.rs`,
//! `futures.rs`) as further `impl Session` blocks.

mod capture;
mod config;
mod cookies;
mod find;
mod futures;
mod navigation;
mod scripts;
mod tools;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use wv_protocol::{SessionOptions, SurfaceId};
use wv_runtime::{Dispatcher, Error, OperationRegistry, PolicyRequestId, PolicyTable, Result};

pub use config::SessionConfig;
pub use cookies::CookieOpResult;

use crate::callbacks::Callbacks;
use crate::engine::{
	ContentManager, Engine, EngineError, HostSurface, SchemeHandler, ViewConfig, ViewHooks, WebView,
};
use crate::translator::Translator;
use find::FindState;

/// Name of the script-message handler page script posts to.
///
/// Pages call `window.webkit.messageHandlers.wvBridge.postMessage(...)`.
pub const MESSAGE_HANDLER_NAME: &str = "wvBridge";

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
	/// No view yet. Failed attach attempts stay here.
	Created,
	/// A live view is embedded.
	Attached,
	/// Torn down. Terminal.
	Detached,
}

/// Engine objects owned by an attached session.
pub(crate) struct Attached {
	pub(crate) host: Arc<dyn HostSurface>,
	pub(crate) view: Arc<dyn WebView>,
	pub(crate) content: Arc<dyn ContentManager>,
}

pub(crate) struct SessionInner {
	engine: Arc<dyn Engine>,
	dispatcher: Dispatcher,
	pub(crate) callbacks: Callbacks,
	config: Mutex<SessionConfig>,
	attached: Mutex<Option<Attached>>,
	pub(crate) policies: PolicyTable,
	pub(crate) operations: OperationRegistry,
	pending_find: Mutex<Option<Arc<FindState>>>,
	detached: AtomicBool,
	dev_tools_open: AtomicBool,
}

impl SessionInner {
	pub(crate) fn is_detached(&self) -> bool {
		self.detached.load(Ordering::Acquire)
	}

	/// The live view, or why there is none.
	pub(crate) fn live_view(&self) -> Result<Arc<dyn WebView>> {
		if self.is_detached() {
			return Err(Error::Detached);
		}
		self.attached
			.lock()
			.as_ref()
			.map(|attached| Arc::clone(&attached.view))
			.ok_or(Error::NotAttached)
	}

	pub(crate) fn live_content(&self) -> Result<Arc<dyn ContentManager>> {
		if self.is_detached() {
			return Err(Error::Detached);
		}
		self.attached
			.lock()
			.as_ref()
			.map(|attached| Arc::clone(&attached.content))
			.ok_or(Error::NotAttached)
	}

	/// Current top-level address of the view, if any.
	pub(crate) fn current_uri(&self) -> Option<String> {
		let view = self
			.attached
			.lock()
			.as_ref()
			.map(|attached| Arc::clone(&attached.view))?;
		view.uri()
	}

	fn attach_on_owner(self: &Arc<Self>, surface: SurfaceId) -> bool {
		if self.is_detached() {
			tracing::debug!("attach after detach");
			return false;
		}
		if self.attached.lock().is_some() {
			tracing::warn!(surface = surface.0, "session already attached");
			return false;
		}

		let config = self.config.lock().clone();
		match self.build(surface, &config) {
			Ok(attached) => {
				*self.attached.lock() = Some(attached);
				tracing::debug!(surface = surface.0, "session attached");
				true
			}
			Err(err) => {
				tracing::warn!(surface = surface.0, error = %err, "attach failed");
				false
			}
		}
	}

	/// Constructs and wires the engine objects. On failure everything built
	/// so far is torn down again.
	fn build(
		self: &Arc<Self>,
		surface: SurfaceId,
		config: &SessionConfig,
	) -> std::result::Result<Attached, EngineError> {
		let host = self.engine.create_host(surface)?;
		let translator = Arc::new(Translator::new(Arc::downgrade(self)));

		let content = match self.engine.create_content_manager() {
			Ok(content) => content,
			Err(err) => {
				host.destroy();
				return Err(err);
			}
		};
		let hooks: Arc<dyn ViewHooks> = translator.clone();
		if let Err(err) = content.register_message_handler(MESSAGE_HANDLER_NAME, Arc::clone(&hooks)) {
			host.destroy();
			return Err(err);
		}

		let view_config = ViewConfig {
			ephemeral: config.ephemeral,
		};
		let view = match self.engine.create_view(&view_config, &content) {
			Ok(view) => view,
			Err(err) => {
				content.unregister_message_handler(MESSAGE_HANDLER_NAME);
				host.destroy();
				return Err(err);
			}
		};

		view.set_developer_extras(config.enable_dev_tools);
		if let Some(user_agent) = config.user_agent.as_deref() {
			view.set_user_agent(Some(user_agent));
		}
		view.set_javascript_enabled(true);

		let schemes: Arc<dyn SchemeHandler> = translator;
		for scheme in &config.custom_schemes {
			if let Err(err) = view.register_uri_scheme(scheme, Arc::clone(&schemes)) {
				tracing::warn!(%scheme, error = %err, "custom scheme registration failed");
			}
		}

		view.connect(hooks);

		if let Err(err) = host.embed(&view) {
			content.unregister_message_handler(MESSAGE_HANDLER_NAME);
			host.destroy();
			return Err(err);
		}
		host.show();

		Ok(Attached {
			host,
			view,
			content,
		})
	}

	/// Teardown. The flag flips before anything else so hooks and late
	/// completions observe detachment.
	fn detach_on_owner(&self) {
		if self.detached.swap(true, Ordering::AcqRel) {
			return;
		}

		let attached = self.attached.lock().take();
		let pending_find = self.pending_find.lock().take();
		if let Some(pending_find) = pending_find {
			pending_find.disconnect();
		}
		if let Some(attached) = &attached {
			attached.content.unregister_message_handler(MESSAGE_HANDLER_NAME);
			attached.host.destroy();
		}

		let denied = self.policies.cancel_all();
		let cancelled = self.operations.cancel_all();
		drop(attached);
		self.dev_tools_open.store(false, Ordering::Release);

		tracing::debug!(denied, cancelled, "session detached");
	}

	/// Teardown when the owner loop is gone. No engine calls are possible, so
	/// only the bridge-side state is resolved.
	fn detach_without_loop(&self) {
		if self.detached.swap(true, Ordering::AcqRel) {
			return;
		}
		let attached = self.attached.lock().take();
		self.pending_find.lock().take();
		let denied = self.policies.cancel_all();
		let cancelled = self.operations.cancel_all();
		drop(attached);
		self.dev_tools_open.store(false, Ordering::Release);

		tracing::warn!(denied, cancelled, "session detached without owner loop");
	}
}

/// One embedded web view driven from any thread.
///
/// `Session` is `Send + Sync`; share it with `Arc<Session>`. Dropping it
/// detaches.
///
/// ```ignore
/// let engine = HeadlessEngine::new()?;
/// let session = Session::new(engine, Callbacks::new().on_navigation_completed(|nav| {
///     println!("loaded {}", nav.uri);
/// }));
/// if session.attach(SurfaceId(window_id)) {
///     session.navigate("https://example.com")?;
/// }
/// ```
pub struct Session {
	inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session")
			.field("state", &self.state())
			.field("pending_policies", &self.inner.policies.len())
			.field("pending_operations", &self.inner.operations.len())
			.finish()
	}
}

impl Session {
	/// Creates a session in the `Created` state. The engine is not touched
	/// beyond toolkit initialization.
	pub fn new(engine: Arc<dyn Engine>, callbacks: Callbacks) -> Self {
		Self::with_options(engine, callbacks, SessionOptions::default())
	}

	/// Creates a session pre-configured from `options`.
	///
	/// Invalid scheme names in `options` are skipped.
	pub fn with_options(
		engine: Arc<dyn Engine>,
		callbacks: Callbacks,
		options: SessionOptions,
	) -> Self {
		let init_engine = Arc::clone(&engine);
		if !wv_runtime::ensure_initialized(|| init_engine.initialize()) {
			tracing::warn!("engine not initialized; attach will retry");
		}

		let dispatcher = Dispatcher::new(engine.run_loop());
		Self {
			inner: Arc::new(SessionInner {
				engine,
				dispatcher,
				callbacks,
				config: Mutex::new(SessionConfig::from_options(&options)),
				attached: Mutex::new(None),
				policies: PolicyTable::new(),
				operations: OperationRegistry::new(),
				pending_find: Mutex::new(None),
				detached: AtomicBool::new(false),
				dev_tools_open: AtomicBool::new(false),
			}),
		}
	}

	pub fn state(&self) -> SessionState {
		if self.inner.is_detached() {
			SessionState::Detached
		} else if self.inner.attached.lock().is_some() {
			SessionState::Attached
		} else {
			SessionState::Created
		}
	}

	pub fn is_detached(&self) -> bool {
		self.inner.is_detached()
	}

	/// Builds the view and embeds it into `surface`.
	///
	/// Returns false if `surface` is zero, the session is detached or
	/// already attached, or any construction step fails. A failed attach
	/// leaves the session `Created` and usable.
	pub fn attach(&self, surface: SurfaceId) -> bool {
		if !surface.is_valid() {
			tracing::warn!("attach with null surface");
			return false;
		}
		if self.inner.is_detached() {
			return false;
		}

		let engine = Arc::clone(&self.inner.engine);
		if !wv_runtime::ensure_initialized(|| engine.initialize()) {
			tracing::warn!("engine initialization failed");
			return false;
		}

		match self.on_owner(move |inner| inner.attach_on_owner(surface)) {
			Ok(attached) => attached,
			Err(err) => {
				tracing::warn!(error = %err, "attach dispatch failed");
				false
			}
		}
	}

	/// Tears the view down. Idempotent.
	///
	/// Pending policy decisions are denied and in-flight operations resolve
	/// with their cancellation outcome before this returns.
	pub fn detach(&self) {
		if self.inner.is_detached() {
			return;
		}
		if let Err(err) = self.on_owner(|inner| inner.detach_on_owner()) {
			tracing::debug!(error = %err, "owner loop unavailable during detach");
			self.inner.detach_without_loop();
		}
	}

	/// Detaches, then releases the stored configuration.
	pub fn destroy(self) {
		self.detach();
		self.inner.config.lock().clear();
	}

	/// Applies the host's verdict to a pending policy request.
	///
	/// Callable from any thread without dispatch. Unknown, already-resolved
	/// and zero ids are ignored; returns false for them.
	pub fn resolve_policy(&self, id: PolicyRequestId, allow: bool) -> bool {
		if id.get() == 0 {
			return false;
		}
		self.inner.policies.resolve(id, allow)
	}

	/// Number of policy requests awaiting a verdict.
	pub fn pending_policy_count(&self) -> usize {
		self.inner.policies.len()
	}

	/// Number of asynchronous operations in flight.
	pub fn pending_operation_count(&self) -> usize {
		self.inner.operations.len()
	}

	/// Runs `action` on the owner thread and waits for it.
	fn on_owner<R, F>(&self, action: F) -> Result<R>
	where
		F: FnOnce(&Arc<SessionInner>) -> R + Send + 'static,
		R: Send + 'static,
	{
		let inner = Arc::clone(&self.inner);
		self.inner.dispatcher.run_on_owner_thread(move || action(&inner))
	}

	/// Runs `action` against the live view on the owner thread and waits.
	fn with_view<R, F>(&self, action: F) -> Result<R>
	where
		F: FnOnce(&Arc<SessionInner>, &Arc<dyn WebView>) -> R + Send + 'static,
		R: Send + 'static,
	{
		if self.inner.is_detached() {
			return Err(Error::Detached);
		}
		self.on_owner(move |inner| {
			let view = inner.live_view()?;
			Ok(action(inner, &view))
		})?
	}

	/// Queues `action` against the live view without waiting.
	///
	/// If there is no live view when the task runs, `action` is dropped
	/// unrun, which resolves any [`PendingOperation`](wv_runtime::PendingOperation)
	/// it captured with its cancellation outcome.
	fn post_to_view<F>(&self, action: F)
	where
		F: FnOnce(&Arc<SessionInner>, &Arc<dyn WebView>) + Send + 'static,
	{
		if self.inner.is_detached() {
			return;
		}
		let inner = Arc::clone(&self.inner);
		let queued = self.inner.dispatcher.invoke(move || {
			if let Ok(view) = inner.live_view() {
				action(&inner, &view);
			}
		});
		if let Err(err) = queued {
			tracing::debug!(error = %err, "dropping view task");
		}
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		self.detach();
	}
}

#[cfg(test)]
mod tests;
