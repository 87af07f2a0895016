//! Navigation, script, zoom and developer-tools entry points.
//!
//! # Safety
//!
//! Every function here takes a `handle` that must be null or a live pointer
//! from `wv_create`, and string arguments that must be null or
//! NUL-terminated.

use std::ffi::{c_char, c_void};
use std::ptr;

use wv::ScriptRequestId;

use crate::session::{WvSession, session};
use crate::strings::{from_c, to_c};

/// Starts loading `uri`.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_navigate(handle: *mut WvSession, uri: *const c_char) {
	let (Some(session), Some(uri)) = (unsafe { session(handle) }, unsafe { from_c(uri) }) else {
		return;
	};
	if let Err(err) = session.navigate(&uri) {
		tracing::debug!(error = %err, "navigate ignored");
	}
}

/// Loads inline markup. `base_uri` may be null.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_load_html(handle: *mut WvSession, html: *const c_char, base_uri: *const c_char) {
	let (Some(session), Some(html)) = (unsafe { session(handle) }, unsafe { from_c(html) }) else {
		return;
	};
	let base_uri = unsafe { from_c(base_uri) };
	if let Err(err) = session.load_html(&html, base_uri.as_deref()) {
		tracing::debug!(error = %err, "load_html ignored");
	}
}

/// Evaluates `script`; the result arrives through `on_script_result` tagged
/// with `request_id`.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_evaluate_script(handle: *mut WvSession, request_id: u64, script: *const c_char) {
	let (Some(session), Some(script)) = (unsafe { session(handle) }, unsafe { from_c(script) }) else {
		return;
	};
	if let Err(err) = session.evaluate_script(ScriptRequestId(request_id), &script) {
		tracing::debug!(request_id, error = %err, "evaluate_script ignored");
	}
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_go_back(handle: *mut WvSession) -> bool {
	unsafe { session(handle) }.is_some_and(|session| session.go_back())
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_go_forward(handle: *mut WvSession) -> bool {
	unsafe { session(handle) }.is_some_and(|session| session.go_forward())
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_reload(handle: *mut WvSession) -> bool {
	unsafe { session(handle) }.is_some_and(|session| session.reload())
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_stop(handle: *mut WvSession) {
	if let Some(session) = unsafe { session(handle) } {
		if let Err(err) = session.stop() {
			tracing::debug!(error = %err, "stop ignored");
		}
	}
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_can_go_back(handle: *mut WvSession) -> bool {
	unsafe { session(handle) }.is_some_and(|session| session.can_go_back())
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_can_go_forward(handle: *mut WvSession) -> bool {
	unsafe { session(handle) }.is_some_and(|session| session.can_go_forward())
}

/// The engine-native view handle, or null without a live view.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_native_handle(handle: *mut WvSession) -> *mut c_void {
	unsafe { session(handle) }
		.and_then(|session| session.native_handle())
		.map_or(ptr::null_mut(), |native| native as *mut c_void)
}

/// Zoom factor; 1.0 without a live view.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_get_zoom(handle: *mut WvSession) -> f64 {
	unsafe { session(handle) }.map_or(1.0, |session| session.zoom())
}

/// Sets the zoom factor. Non-positive or non-finite values are ignored.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_set_zoom(handle: *mut WvSession, level: f64) {
	if let Some(session) = unsafe { session(handle) } {
		if let Err(err) = session.set_zoom(level) {
			tracing::debug!(level, error = %err, "set_zoom ignored");
		}
	}
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_open_dev_tools(handle: *mut WvSession) -> bool {
	unsafe { session(handle) }.is_some_and(|session| session.open_dev_tools())
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_close_dev_tools(handle: *mut WvSession) {
	if let Some(session) = unsafe { session(handle) } {
		session.close_dev_tools();
	}
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_is_dev_tools_open(handle: *mut WvSession) -> bool {
	unsafe { session(handle) }.is_some_and(|session| session.is_dev_tools_open())
}

/// Injects `script` into every document loaded from now on.
///
/// Returns an owned id string (free with `wv_string_free`), or null on
/// failure.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_add_user_script(handle: *mut WvSession, script: *const c_char) -> *mut c_char {
	let (Some(session), Some(script)) = (unsafe { session(handle) }, unsafe { from_c(script) }) else {
		return ptr::null_mut();
	};
	match session.add_user_script(&script) {
		Ok(id) => to_c(&id.to_string()).into_raw(),
		Err(err) => {
			tracing::debug!(error = %err, "add_user_script ignored");
			ptr::null_mut()
		}
	}
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_remove_all_user_scripts(handle: *mut WvSession) {
	if let Some(session) = unsafe { session(handle) } {
		if let Err(err) = session.remove_all_user_scripts() {
			tracing::debug!(error = %err, "remove_all_user_scripts ignored");
		}
	}
}
