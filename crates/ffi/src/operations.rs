//! Entry points with a per-call completion callback.
//!
//! Each callback runs exactly once with its `context`, usually on the owner
//! thread. A null handle or missing required argument skips the call
//! entirely; the callback is not invoked.
//!
//! # Safety
//!
//! As for every entry point: `handle` must be null or a live pointer from
//! `wv_create`, strings null or NUL-terminated. `context` is handed back
//! verbatim.

use std::ffi::{c_char, c_void};
use std::ptr;

use wv::{Cookie, CookieOpResult, FindResult};

use crate::callbacks::{Opaque, WvBytesFn, WvCookieOpFn, WvCookiesFn, WvFindFn};
use crate::session::{WvSession, session};
use crate::strings::{from_c, to_c};

fn cookie_op(callback: Option<WvCookieOpFn>, context: Opaque) -> impl FnOnce(CookieOpResult) + Send + 'static {
	move |result| {
		let Some(callback) = callback else {
			return;
		};
		match result {
			Ok(()) => unsafe { callback(context.get(), true, ptr::null()) },
			Err(message) => {
				let message = to_c(&message);
				unsafe { callback(context.get(), false, message.as_ptr()) };
			}
		}
	}
}

fn bytes(callback: Option<WvBytesFn>, context: Opaque) -> impl FnOnce(Option<Vec<u8>>) + Send + 'static {
	move |data| {
		let Some(callback) = callback else {
			return;
		};
		match data {
			Some(data) => unsafe { callback(context.get(), data.as_ptr(), data.len()) },
			None => unsafe { callback(context.get(), ptr::null(), 0) },
		}
	}
}

/// Fetches the cookies for `uri` as a JSON array.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_cookies_get(
	handle: *mut WvSession,
	uri: *const c_char,
	callback: Option<WvCookiesFn>,
	context: *mut c_void,
) {
	let (Some(session), Some(uri)) = (unsafe { session(handle) }, unsafe { from_c(uri) }) else {
		return;
	};
	let context = Opaque::new(context);
	session.cookies(&uri, move |json| {
		if let Some(callback) = callback {
			let json = to_c(&json);
			unsafe { callback(context.get(), json.as_ptr()) };
		}
	});
}

/// Stores a cookie. `path` may be null for `/`; `expires` of zero or less
/// stores a session cookie.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn wv_cookie_set(
	handle: *mut WvSession,
	name: *const c_char,
	value: *const c_char,
	domain: *const c_char,
	path: *const c_char,
	expires: f64,
	secure: bool,
	http_only: bool,
	callback: Option<WvCookieOpFn>,
	context: *mut c_void,
) {
	let Some(session) = (unsafe { session(handle) }) else {
		return;
	};
	let (Some(name), Some(domain)) = (unsafe { from_c(name) }, unsafe { from_c(domain) }) else {
		return;
	};
	let value = unsafe { from_c(value) }.unwrap_or_default();
	let path = unsafe { from_c(path) }.unwrap_or_default();

	let cookie = Cookie::new(name, value, domain)
		.path(path)
		.expires(expires)
		.secure(secure)
		.http_only(http_only);
	session.set_cookie(cookie, cookie_op(callback, Opaque::new(context)));
}

/// Deletes the cookie matching `name`, `domain` and `path`.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_cookie_delete(
	handle: *mut WvSession,
	name: *const c_char,
	domain: *const c_char,
	path: *const c_char,
	callback: Option<WvCookieOpFn>,
	context: *mut c_void,
) {
	let Some(session) = (unsafe { session(handle) }) else {
		return;
	};
	let (Some(name), Some(domain)) = (unsafe { from_c(name) }, unsafe { from_c(domain) }) else {
		return;
	};
	let path = unsafe { from_c(path) }.unwrap_or_default();
	session.delete_cookie(&name, &domain, &path, cookie_op(callback, Opaque::new(context)));
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_cookies_clear_all(
	handle: *mut WvSession,
	callback: Option<WvCookieOpFn>,
	context: *mut c_void,
) {
	if let Some(session) = unsafe { session(handle) } {
		session.clear_cookies(cookie_op(callback, Opaque::new(context)));
	}
}

/// Captures the visible region as PNG. Null and 0 on failure.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_capture_screenshot(
	handle: *mut WvSession,
	callback: Option<WvBytesFn>,
	context: *mut c_void,
) {
	if let Some(session) = unsafe { session(handle) } {
		session.capture_screenshot(bytes(callback, Opaque::new(context)));
	}
}

/// Document export. Unsupported: always reports null and 0.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_print_to_file(
	handle: *mut WvSession,
	callback: Option<WvBytesFn>,
	context: *mut c_void,
) {
	if let Some(session) = unsafe { session(handle) } {
		session.print_to_file(bytes(callback, Opaque::new(context)));
	}
}

/// Searches the page. Reports `(0, n)` for `n` matches, `(-1, 0)` for none.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_find_text(
	handle: *mut WvSession,
	text: *const c_char,
	case_sensitive: bool,
	forward: bool,
	callback: Option<WvFindFn>,
	context: *mut c_void,
) {
	let (Some(session), Some(text)) = (unsafe { session(handle) }, unsafe { from_c(text) }) else {
		return;
	};
	let context = Opaque::new(context);
	session.find_text(&text, case_sensitive, forward, move |result: FindResult| {
		if let Some(callback) = callback {
			unsafe { callback(context.get(), result.active_index, result.total_matches) };
		}
	});
}

/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_stop_find(handle: *mut WvSession) {
	if let Some(session) = unsafe { session(handle) } {
		session.stop_find();
	}
}
