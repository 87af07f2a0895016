//! Session lifecycle and configuration entry points.

use std::ffi::{c_char, c_void};
use std::ptr;

use wv::{PolicyRequestId, Session, SessionOptions, SurfaceId};

use crate::callbacks::{Opaque, WvCallbacks, into_callbacks};
use crate::engine::installed_engine;
use crate::strings::from_c;

/// Opaque session handle.
pub struct WvSession {
	pub(crate) session: Session,
}

/// Borrows the session behind `handle`.
///
/// # Safety
/// `handle` must be null or a live pointer from `wv_create`.
pub(crate) unsafe fn session<'a>(handle: *const WvSession) -> Option<&'a Session> {
	unsafe { handle.as_ref() }.map(|handle| &handle.session)
}

unsafe fn create(
	callbacks: *const WvCallbacks,
	user_data: *mut c_void,
	options: SessionOptions,
) -> *mut WvSession {
	let Some(engine) = installed_engine() else {
		tracing::warn!("wv_create called before an engine was installed");
		return ptr::null_mut();
	};
	let table = unsafe { callbacks.as_ref() }.copied().unwrap_or_default();
	let session = Session::with_options(engine, into_callbacks(table, Opaque::new(user_data)), options);
	Box::into_raw(Box::new(WvSession { session }))
}

/// Creates a session. Returns null if no engine is installed.
///
/// # Safety
/// `callbacks` must be null or point to a valid table; it is copied.
/// `user_data` is handed to every session callback.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_create(callbacks: *const WvCallbacks, user_data: *mut c_void) -> *mut WvSession {
	unsafe { create(callbacks, user_data, SessionOptions::default()) }
}

/// Creates a session configured from a JSON options object, e.g.
/// `{"enableDevTools": true, "customSchemes": ["app"]}`.
///
/// Returns null if no engine is installed or the options do not parse.
///
/// # Safety
/// As [`wv_create`]; `options_json` must be null or a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_create_with_options(
	callbacks: *const WvCallbacks,
	user_data: *mut c_void,
	options_json: *const c_char,
) -> *mut WvSession {
	let options = match unsafe { from_c(options_json) } {
		None => SessionOptions::default(),
		Some(json) => match serde_json::from_str(&json) {
			Ok(options) => options,
			Err(err) => {
				tracing::warn!(error = %err, "invalid session options");
				return ptr::null_mut();
			}
		},
	};
	unsafe { create(callbacks, user_data, options) }
}

/// Detaches and frees the session.
///
/// # Safety
/// `handle` must be null or a live pointer from `wv_create`. It is invalid
/// afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_destroy(handle: *mut WvSession) {
	if handle.is_null() {
		return;
	}
	let handle = unsafe { Box::from_raw(handle) };
	handle.session.destroy();
}

/// Builds the view and embeds it into the native surface `surface_id`.
///
/// # Safety
/// `handle` must be null or a live pointer from `wv_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_attach(handle: *mut WvSession, surface_id: u64) -> bool {
	unsafe { session(handle) }.is_some_and(|session| session.attach(SurfaceId(surface_id)))
}

/// Tears the view down. Idempotent.
///
/// # Safety
/// `handle` must be null or a live pointer from `wv_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_detach(handle: *mut WvSession) {
	if let Some(session) = unsafe { session(handle) } {
		session.detach();
	}
}

/// Answers a policy request. Unknown ids are ignored and return false.
///
/// # Safety
/// `handle` must be null or a live pointer from `wv_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_resolve_policy(handle: *mut WvSession, request_id: u64, allow: bool) -> bool {
	unsafe { session(handle) }
		.is_some_and(|session| session.resolve_policy(PolicyRequestId::from_raw(request_id), allow))
}

/// Registers a custom scheme. Only valid before attach.
///
/// # Safety
/// `handle` must be null or a live pointer from `wv_create`; `scheme` must be
/// null or a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_register_custom_scheme(handle: *mut WvSession, scheme: *const c_char) -> bool {
	let (Some(session), Some(scheme)) = (unsafe { session(handle) }, unsafe { from_c(scheme) }) else {
		return false;
	};
	session.register_custom_scheme(&scheme)
}

/// # Safety
/// `handle` must be null or a live pointer from `wv_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_set_dev_tools_enabled(handle: *mut WvSession, enable: bool) {
	if let Some(session) = unsafe { session(handle) } {
		session.set_developer_tools_enabled(enable);
	}
}

/// Selects ephemeral storage. Only valid before attach.
///
/// # Safety
/// `handle` must be null or a live pointer from `wv_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_set_ephemeral(handle: *mut WvSession, ephemeral: bool) -> bool {
	unsafe { session(handle) }.is_some_and(|session| session.set_ephemeral(ephemeral))
}

/// Overrides the user agent; null restores the default.
///
/// # Safety
/// `handle` must be null or a live pointer from `wv_create`; `user_agent`
/// must be null or a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_set_user_agent(handle: *mut WvSession, user_agent: *const c_char) {
	if let Some(session) = unsafe { session(handle) } {
		let user_agent = unsafe { from_c(user_agent) };
		session.set_user_agent(user_agent.as_deref());
	}
}
