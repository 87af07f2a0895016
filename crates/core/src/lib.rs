//! wv: drive an embedded web engine from any thread.
//!
//! A web engine's objects belong to one owner thread and report results
//! through signals on that thread. This crate lets host code on any thread
//! create a view, embed it into a native surface, command it, and receive
//! its events, without ever touching an engine object off the owner thread.
//!
//! The pieces:
//!
//! - [`Session`]: one embedded view and its lifecycle
//!   (`Created -> Attached -> Detached`).
//! - [`Callbacks`]: the host's event handlers, fixed at session creation.
//! - The engine boundary in [`engine`]: traits a concrete engine binding
//!   implements.
//! - [`testing::HeadlessEngine`]: an in-process engine for tests and smoke
//!   runs.
//!
//! Dispatch and correlation live in `wv-runtime`; value types in
//! `wv-protocol`. Both are re-exported here.
//!
//! # Examples
//!
//! ```ignore
//! use wv::testing::HeadlessEngine;
//! use wv::{Callbacks, NavigationStatus, Session, SurfaceId};
//!
//! let engine = HeadlessEngine::new()?;
//! let session = Session::new(
//!     engine.clone(),
//!     Callbacks::new()
//!         .on_navigation_completed(|nav| {
//!             assert_eq!(nav.status, NavigationStatus::Success);
//!         })
//!         .on_message(|msg| println!("{} says {}", msg.origin, msg.body)),
//! );
//!
//! assert!(session.attach(SurfaceId(7)));
//! session.navigate("https://example.com/")?;
//!
//! // From async code:
//! let png = session.capture_screenshot_async().await;
//! let cookies = session.cookies_async("https://example.com/").await;
//!
//! session.detach();
//! ```

pub mod callbacks;
pub mod engine;
pub mod session;
pub mod testing;
pub mod translator;

pub use callbacks::{
	Callbacks, DownloadStarted, NavigationCompleted, PermissionRequested, PolicyRequest,
	ScriptResult, WebMessage,
};
pub use engine::{
	ContentManager, CookieManager, DownloadInfo, Engine, EngineError, ErrorKind, FindController,
	FindSignal, HostSurface, PermissionRequest, PolicyAction, PolicyDecision, PolicyKind,
	SchemeHandler, SchemeReply, UserScriptId, ViewConfig, ViewHooks, WebView,
};
pub use session::{CookieOpResult, MESSAGE_HANDLER_NAME, Session, SessionConfig, SessionState};
pub use translator::{classify_error, origin_of};
pub use wv_protocol::{
	Cookie, CookieRecord, FindOptions, FindResult, NavigationStatus, NavigationType,
	PermissionKind, PermissionVerdict, SchemeRequest, SchemeResponse, SessionOptions, SurfaceId,
};
pub use wv_runtime::{Error, PolicyRequestId, Result, ScriptRequestId};
