//! The engine binding boundary.
//!
//! A session never talks to a concrete engine. It drives the traits in this
//! module, which an engine binding (a WebKitGTK binding, or the in-process
//! [`HeadlessEngine`](crate::testing::HeadlessEngine)) implements.
//!
//! # Threading
//!
//! Every trait object here is `Send + Sync` so it can be stored in a session
//! shared across threads, but its methods are only ever called on the
//! engine's owner thread, the thread [`Engine::run_loop`] reports as owner.
//! The one exception is [`PolicyDecision`]: hosts resolve pending decisions
//! from any thread, so its `allow`/`deny` must tolerate off-thread calls.
//!
//! Hooks ([`ViewHooks`], [`SchemeHandler`]) are likewise invoked by the
//! binding on the owner thread.

use std::sync::Arc;

use downcast_rs::{DowncastSync, impl_downcast};
use image::RgbaImage;
use thiserror::Error;
use wv_protocol::{Cookie, FindOptions, NavigationType, PermissionKind, SchemeRequest, SurfaceId};
use wv_runtime::RunLoop;

pub use wv_runtime::PolicyDecision;

/// Error category reported by an engine binding.
///
/// Only the categories the bridge classifies are distinguished; everything
/// else is [`Other`](Self::Other).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// The load was cancelled.
	Cancelled,
	/// Transport-level network failure.
	Transport,
	/// The URI scheme is not supported.
	UnknownProtocol,
	/// Generic network failure.
	NetworkFailed,
	/// Any error from the engine's policy domain (blocked navigation, etc.).
	Policy,
	/// The server certificate did not validate.
	TlsBadCertificate,
	/// The connection was expected to use TLS but did not.
	TlsNotTls,
	/// The server demanded a client certificate.
	TlsCertificateRequired,
	/// Anything else.
	Other,
}

/// An error reported by the engine binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
	pub kind: ErrorKind,
	/// Engine-native error code, reported to hosts unchanged.
	pub code: i64,
	pub message: String,
}

impl EngineError {
	pub fn new(kind: ErrorKind, code: i64, message: impl Into<String>) -> Self {
		Self {
			kind,
			code,
			message: message.into(),
		}
	}

	/// Shorthand for an [`ErrorKind::Other`] error with code 0.
	pub fn other(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::Other, 0, message)
	}
}

/// Construction-time options for a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewConfig {
	/// Use non-persistent website data storage.
	pub ephemeral: bool,
}

/// Opaque identifier of an injected user script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserScriptId(pub u64);

impl std::fmt::Display for UserScriptId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "user-script-{}", self.0)
	}
}

/// Opaque identifier of a connected signal handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalHandlerId(pub u64);

/// Completion for a script evaluation. `Ok(None)` means null or undefined.
pub type ScriptCompletion = Box<dyn FnOnce(Result<Option<String>, EngineError>) + Send + 'static>;

/// Completion for a visible-region snapshot.
pub type SnapshotCompletion = Box<dyn FnOnce(Result<RgbaImage, EngineError>) + Send + 'static>;

/// Completion for a cookie query.
pub type CookiesCompletion = Box<dyn FnOnce(Result<Vec<Cookie>, EngineError>) + Send + 'static>;

/// Listener for find-in-page results.
pub type FindListener = Arc<dyn Fn(FindSignal) + Send + Sync + 'static>;

/// The engine: a factory for surfaces, content managers and views.
pub trait Engine: Send + Sync {
	/// Performs one-time toolkit initialization. Returns false on failure.
	///
	/// Called through [`wv_runtime::ensure_initialized`], so it runs until it
	/// first succeeds and never again after that.
	fn initialize(&self) -> bool;

	/// The loop whose thread owns every object this engine creates.
	fn run_loop(&self) -> Arc<dyn RunLoop>;

	/// Wraps the host-owned native surface a view will be embedded into.
	fn create_host(&self, surface: SurfaceId) -> Result<Arc<dyn HostSurface>, EngineError>;

	/// Creates a script-injection and message manager for a new view.
	fn create_content_manager(&self) -> Result<Arc<dyn ContentManager>, EngineError>;

	/// Creates a view bound to `content`.
	fn create_view(
		&self,
		config: &ViewConfig,
		content: &Arc<dyn ContentManager>,
	) -> Result<Arc<dyn WebView>, EngineError>;
}

/// The host-side container a view is embedded into.
pub trait HostSurface: Send + Sync {
	/// Places `view` inside the surface.
	fn embed(&self, view: &Arc<dyn WebView>) -> Result<(), EngineError>;

	/// Makes the surface and its children visible.
	fn show(&self);

	/// Destroys the surface and every widget inside it.
	fn destroy(&self);
}

/// Script-injection and script-message manager attached to a view.
///
/// Bindings can recover their concrete type through
/// [`downcast_arc`](ContentManager::downcast_arc) when building a view.
pub trait ContentManager: DowncastSync {
	/// Routes page messages posted to `name` into `hooks`.
	fn register_message_handler(
		&self,
		name: &str,
		hooks: Arc<dyn ViewHooks>,
	) -> Result<(), EngineError>;

	fn unregister_message_handler(&self, name: &str);

	/// Injects a script into every document loaded from now on.
	fn add_user_script(&self, source: &str) -> UserScriptId;

	fn remove_all_user_scripts(&self);
}
impl_downcast!(sync ContentManager);

/// A web view.
pub trait WebView: DowncastSync {
	/// Connects the view's event signals to `hooks`.
	fn connect(&self, hooks: Arc<dyn ViewHooks>);

	fn set_developer_extras(&self, enabled: bool);

	/// Overrides the user agent. `None` restores the engine default.
	fn set_user_agent(&self, user_agent: Option<&str>);

	fn set_javascript_enabled(&self, enabled: bool);

	/// Routes fetches for `scheme` to `handler`.
	fn register_uri_scheme(
		&self,
		scheme: &str,
		handler: Arc<dyn SchemeHandler>,
	) -> Result<(), EngineError>;

	fn load_uri(&self, uri: &str);

	fn load_html(&self, html: &str, base_uri: Option<&str>);

	fn reload(&self);

	fn stop_loading(&self);

	fn go_back(&self);

	fn go_forward(&self);

	fn can_go_back(&self) -> bool;

	fn can_go_forward(&self) -> bool;

	/// The current top-level address, if any.
	fn uri(&self) -> Option<String>;

	fn evaluate_script(&self, source: &str, completion: ScriptCompletion);

	fn cookie_manager(&self) -> Arc<dyn CookieManager>;

	/// Captures the visible region.
	fn snapshot(&self, completion: SnapshotCompletion);

	fn find_controller(&self) -> Arc<dyn FindController>;

	fn zoom_level(&self) -> f64;

	fn set_zoom_level(&self, level: f64);

	fn show_inspector(&self);

	fn close_inspector(&self);

	/// The engine-native view pointer, as an opaque integer.
	fn native_handle(&self) -> usize;
}
impl_downcast!(sync WebView);

/// Cookie storage of a view's website data.
pub trait CookieManager: Send + Sync {
	fn get_cookies(&self, uri: &str, completion: CookiesCompletion);

	/// Stores a cookie. Fire-and-forget.
	fn add_cookie(&self, cookie: &Cookie);

	/// Deletes the cookie matching name, domain and path. Fire-and-forget.
	fn delete_cookie(&self, cookie: &Cookie);

	/// Clears every cookie. Fire-and-forget.
	fn clear_all(&self);
}

/// Signals emitted by a [`FindController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindSignal {
	/// A match count completed.
	CountedMatches(u32),
	/// The search text was not found.
	FailedToFind,
}

/// Find-in-page controller of a view.
pub trait FindController: Send + Sync {
	/// Connects a listener that receives both find signals.
	fn connect(&self, listener: FindListener) -> SignalHandlerId;

	/// Disconnects a listener. Safe to call from inside the listener.
	fn disconnect(&self, id: SignalHandlerId);

	fn search(&self, text: &str, options: FindOptions, max_matches: u32);

	fn count_matches(&self, text: &str, options: FindOptions, max_matches: u32);

	/// Ends the current search and clears highlights.
	fn finish(&self);
}

/// A permission request raised by page content.
///
/// Dropping the request without answering leaves the engine default.
pub trait PermissionRequest: Send {
	/// Classification done by the binding.
	fn kind(&self) -> PermissionKind;

	fn allow(self: Box<Self>);

	fn deny(self: Box<Self>);
}

/// What a policy decision is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyKind {
	/// Navigation inside the view.
	Navigation {
		/// Target frame name; `None` for the main frame.
		frame_name: Option<String>,
		navigation_type: NavigationType,
	},
	/// A request to open a new window.
	NewWindow,
	/// A response-level decision (download vs. display). Left to the engine.
	Response,
}

/// A policy decision request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyAction {
	pub uri: String,
	pub kind: PolicyKind,
}

/// A download the engine is starting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadInfo {
	pub uri: String,
	pub suggested_filename: Option<String>,
	pub mime_type: Option<String>,
	/// Engine-reported length. Zero or negative means unknown.
	pub content_length: Option<i64>,
}

/// Reply to a custom-scheme fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemeReply {
	/// Stream `body` as a successful response.
	Data {
		body: Vec<u8>,
		mime_type: String,
		status: i32,
	},
	/// Fail the request.
	Error { status: i32, message: String },
}

impl SchemeReply {
	/// The reply for unhandled fetches.
	pub fn not_found() -> Self {
		Self::Error {
			status: 404,
			message: "Not Found".to_string(),
		}
	}

	pub fn is_success(&self) -> bool {
		matches!(self, Self::Data { .. })
	}
}

/// Synchronous resolver for custom-scheme fetches.
pub trait SchemeHandler: Send + Sync {
	fn handle(&self, request: &SchemeRequest) -> SchemeReply;
}

/// Receiver of a view's engine events.
pub trait ViewHooks: Send + Sync {
	/// A policy decision is needed.
	///
	/// Returns true if the decision was taken over. On false the binding
	/// applies the engine default; the decision has been dropped undecided.
	fn decide_policy(&self, action: &PolicyAction, decision: Box<dyn PolicyDecision>) -> bool;

	/// The main resource finished loading.
	fn load_finished(&self);

	/// A load failed. `error` is `None` when the engine reported no details.
	fn load_failed(&self, failing_uri: Option<&str>, error: Option<&EngineError>);

	/// A load failed certificate validation. `errors` are the certificate flags.
	fn load_failed_tls(&self, failing_uri: Option<&str>, errors: u32);

	/// Page script posted a message to the bridge handler.
	fn script_message(&self, body: &str);

	fn download_started(&self, download: &DownloadInfo);

	/// Page content requested a permission.
	///
	/// Returns true if the request was answered. On false the binding leaves
	/// the engine default in place.
	fn permission_requested(&self, request: Box<dyn PermissionRequest>) -> bool;
}
