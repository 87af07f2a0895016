//! The host callback set.
//!
//! A session's callbacks are fixed at creation. Each is optional; an absent
//! callback changes default behavior only where documented (no policy
//! handler means default-allow for navigations and default-deny for new
//! windows).
//!
//! Callbacks are invoked on the engine's owner thread with no session lock
//! held, so they may call back into the session.

use serde::Serialize;
use wv_protocol::{
	NavigationStatus, NavigationType, PermissionKind, PermissionVerdict, SchemeRequest,
	SchemeResponse,
};
use wv_runtime::{PolicyRequestId, ScriptRequestId};

/// A navigation awaiting the host's verdict.
///
/// Answer with [`Session::resolve_policy`](crate::Session::resolve_policy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRequest {
	pub id: PolicyRequestId,
	pub uri: String,
	pub is_main_frame: bool,
	pub is_new_window: bool,
	pub navigation_type: NavigationType,
}

/// Outcome of a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationCompleted {
	pub uri: String,
	pub status: NavigationStatus,
	/// Engine-native error code; 0 on success.
	pub error_code: i64,
	/// Error message; empty on success.
	pub message: String,
}

/// Result of a script evaluation.
///
/// `value` and `error` are both `None` when the script evaluated to null or
/// undefined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptResult {
	pub id: ScriptRequestId,
	pub value: Option<String>,
	pub error: Option<String>,
}

/// A message posted by page script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebMessage {
	pub body: String,
	/// `scheme://host[:port]` of the current page, or empty.
	pub origin: String,
}

/// A download the engine started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadStarted {
	pub uri: String,
	/// Empty when the engine suggested none.
	pub suggested_filename: String,
	/// Empty when unknown.
	pub mime_type: String,
	/// -1 when unknown.
	pub content_length: i64,
}

/// A permission request raised by page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRequested {
	pub kind: PermissionKind,
	/// Current top-level address, or empty.
	pub origin: String,
}

type Handler<E> = Box<dyn Fn(&E) + Send + Sync + 'static>;
type PermissionHandler = Box<dyn Fn(&PermissionRequested) -> PermissionVerdict + Send + Sync + 'static>;
type SchemeResolver = Box<dyn Fn(&SchemeRequest) -> Option<SchemeResponse> + Send + Sync + 'static>;

/// Event callbacks registered when a session is created.
///
/// ```ignore
/// let callbacks = Callbacks::new()
///     .on_navigation_completed(|nav| println!("{} -> {:?}", nav.uri, nav.status))
///     .on_message(|msg| println!("{}: {}", msg.origin, msg.body));
/// ```
#[derive(Default)]
pub struct Callbacks {
	policy_request: Option<Handler<PolicyRequest>>,
	navigation_completed: Option<Handler<NavigationCompleted>>,
	script_result: Option<Handler<ScriptResult>>,
	message: Option<Handler<WebMessage>>,
	download: Option<Handler<DownloadStarted>>,
	permission: Option<PermissionHandler>,
	scheme_request: Option<SchemeResolver>,
}

impl std::fmt::Debug for Callbacks {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Callbacks")
			.field("policy_request", &self.policy_request.is_some())
			.field("navigation_completed", &self.navigation_completed.is_some())
			.field("script_result", &self.script_result.is_some())
			.field("message", &self.message.is_some())
			.field("download", &self.download.is_some())
			.field("permission", &self.permission.is_some())
			.field("scheme_request", &self.scheme_request.is_some())
			.finish()
	}
}

impl Callbacks {
	/// Creates an empty callback set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Receives navigation and new-window decisions.
	///
	/// Every request must eventually be answered through
	/// [`Session::resolve_policy`](crate::Session::resolve_policy), or it is
	/// denied when the session detaches.
	pub fn on_policy_request<F>(mut self, handler: F) -> Self
	where
		F: Fn(&PolicyRequest) + Send + Sync + 'static,
	{
		self.policy_request = Some(Box::new(handler));
		self
	}

	pub fn on_navigation_completed<F>(mut self, handler: F) -> Self
	where
		F: Fn(&NavigationCompleted) + Send + Sync + 'static,
	{
		self.navigation_completed = Some(Box::new(handler));
		self
	}

	pub fn on_script_result<F>(mut self, handler: F) -> Self
	where
		F: Fn(&ScriptResult) + Send + Sync + 'static,
	{
		self.script_result = Some(Box::new(handler));
		self
	}

	pub fn on_message<F>(mut self, handler: F) -> Self
	where
		F: Fn(&WebMessage) + Send + Sync + 'static,
	{
		self.message = Some(Box::new(handler));
		self
	}

	pub fn on_download<F>(mut self, handler: F) -> Self
	where
		F: Fn(&DownloadStarted) + Send + Sync + 'static,
	{
		self.download = Some(Box::new(handler));
		self
	}

	/// Decides permission requests. Returning
	/// [`PermissionVerdict::Default`] defers to the engine.
	pub fn on_permission<F>(mut self, handler: F) -> Self
	where
		F: Fn(&PermissionRequested) -> PermissionVerdict + Send + Sync + 'static,
	{
		self.permission = Some(Box::new(handler));
		self
	}

	/// Serves fetches for registered custom schemes. Returning `None` yields
	/// a 404 response.
	pub fn on_scheme_request<F>(mut self, resolver: F) -> Self
	where
		F: Fn(&SchemeRequest) -> Option<SchemeResponse> + Send + Sync + 'static,
	{
		self.scheme_request = Some(Box::new(resolver));
		self
	}

	pub fn has_policy_handler(&self) -> bool {
		self.policy_request.is_some()
	}

	pub(crate) fn policy_request(&self, request: &PolicyRequest) {
		if let Some(handler) = &self.policy_request {
			handler(request);
		}
	}

	pub(crate) fn navigation_completed(&self, event: &NavigationCompleted) {
		if let Some(handler) = &self.navigation_completed {
			handler(event);
		}
	}

	pub(crate) fn script_result(&self, result: &ScriptResult) {
		if let Some(handler) = &self.script_result {
			handler(result);
		}
	}

	pub(crate) fn message(&self, message: &WebMessage) {
		if let Some(handler) = &self.message {
			handler(message);
		}
	}

	pub(crate) fn download(&self, download: &DownloadStarted) {
		if let Some(handler) = &self.download {
			handler(download);
		}
	}

	/// Returns `None` when no permission handler is registered.
	pub(crate) fn permission(&self, request: &PermissionRequested) -> Option<PermissionVerdict> {
		self.permission.as_ref().map(|handler| handler(request))
	}

	/// Returns `None` when no resolver is registered or it declined.
	pub(crate) fn scheme_request(&self, request: &SchemeRequest) -> Option<SchemeResponse> {
		self.scheme_request.as_ref().and_then(|resolver| resolver(request))
	}
}
