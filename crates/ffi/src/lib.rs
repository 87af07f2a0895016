//! C ABI for the wv web view bridge.
//!
//! Every entry point is an `extern "C"` function prefixed `wv_`. A session is
//! an opaque [`WvSession`] pointer obtained from [`wv_create`] and released
//! with [`wv_destroy`]. All entry points are safe to call from any thread.
//!
//! Conventions:
//!
//! - Strings are NUL-terminated UTF-8. Strings passed to callbacks are valid
//!   only during the call. Strings returned to the host are freed with
//!   [`wv_string_free`].
//! - Null handles and null required arguments are ignored; queries return
//!   their neutral value (`false`, `0`, null, zoom `1.0`).
//! - Session-wide callbacks receive the `user_data` given to `wv_create`.
//!   Per-call callbacks receive their own `context` and run exactly once.
//! - Errors never cross the boundary; they are logged (see
//!   [`wv_init_logging`]) and reported as neutral values.
//!
//! An engine binding installs its engine with [`install_engine`] before
//! hosts create sessions. [`wv_install_headless_engine`] installs the
//! in-process headless engine instead.

mod callbacks;
mod commands;
mod engine;
mod logging;
mod operations;
mod session;
mod strings;

pub use callbacks::{
	WvBytesFn, WvCallbacks, WvCookieOpFn, WvCookiesFn, WvDownloadFn, WvFindFn, WvMessageFn,
	WvNavigationCompletedFn, WvPermissionFn, WvPolicyRequestFn, WvSchemeRequestFn,
	WvScriptResultFn,
};
pub use commands::*;
pub use engine::{install_engine, installed_engine, wv_install_headless_engine};
pub use logging::wv_init_logging;
pub use operations::*;
pub use session::*;
pub use strings::wv_string_free;
