//! Host callback tables.
//!
//! Strings passed to callbacks are NUL-terminated UTF-8 and valid only for
//! the duration of the call. All callbacks run on the engine's owner thread.

use std::ffi::{CString, c_char, c_void};
use std::ptr;

use wv::{Callbacks, PermissionVerdict, SchemeResponse};

use crate::strings::{from_c, to_c};

/// Navigation or new-window decision. Answer with `wv_resolve_policy`.
pub type WvPolicyRequestFn = unsafe extern "C" fn(
	user_data: *mut c_void,
	request_id: u64,
	uri: *const c_char,
	is_main_frame: bool,
	is_new_window: bool,
	navigation_type: i32,
);

/// Navigation outcome. `status` is 0 Success, 1 Failure, 2 Canceled,
/// 4 Network or 5 Ssl.
pub type WvNavigationCompletedFn = unsafe extern "C" fn(
	user_data: *mut c_void,
	uri: *const c_char,
	status: i32,
	error_code: i64,
	message: *const c_char,
);

/// Script evaluation result. `result` and `error` may each be null.
pub type WvScriptResultFn = unsafe extern "C" fn(
	user_data: *mut c_void,
	request_id: u64,
	result: *const c_char,
	error: *const c_char,
);

pub type WvMessageFn =
	unsafe extern "C" fn(user_data: *mut c_void, body: *const c_char, origin: *const c_char);

pub type WvDownloadFn = unsafe extern "C" fn(
	user_data: *mut c_void,
	uri: *const c_char,
	suggested_filename: *const c_char,
	mime_type: *const c_char,
	content_length: i64,
);

/// Permission request. Returns 0 Default, 1 Allow or 2 Deny.
pub type WvPermissionFn =
	unsafe extern "C" fn(user_data: *mut c_void, kind: i32, origin: *const c_char) -> i32;

/// Custom-scheme fetch. Return true and fill the out parameters to serve a
/// response. `out_data` and `out_mime` must stay valid until the function
/// returns; they are copied.
pub type WvSchemeRequestFn = unsafe extern "C" fn(
	user_data: *mut c_void,
	uri: *const c_char,
	method: *const c_char,
	out_data: *mut *const u8,
	out_len: *mut usize,
	out_mime: *mut *const c_char,
	out_status: *mut i32,
) -> bool;

/// Callbacks fixed for a session's lifetime. Null entries are skipped.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WvCallbacks {
	pub on_policy_request: Option<WvPolicyRequestFn>,
	pub on_navigation_completed: Option<WvNavigationCompletedFn>,
	pub on_script_result: Option<WvScriptResultFn>,
	pub on_message: Option<WvMessageFn>,
	pub on_download: Option<WvDownloadFn>,
	pub on_permission: Option<WvPermissionFn>,
	pub on_scheme_request: Option<WvSchemeRequestFn>,
}

/// Cookie fetch result: a JSON array.
pub type WvCookiesFn = unsafe extern "C" fn(context: *mut c_void, json: *const c_char);

/// Cookie mutation result. `error` is null on success.
pub type WvCookieOpFn =
	unsafe extern "C" fn(context: *mut c_void, success: bool, error: *const c_char);

/// Byte result of a screenshot or print. Null and 0 on failure.
pub type WvBytesFn = unsafe extern "C" fn(context: *mut c_void, data: *const u8, len: usize);

/// Find result: active match index (-1 if none) and total matches.
pub type WvFindFn = unsafe extern "C" fn(context: *mut c_void, active_index: i32, total_matches: i32);

/// Host pointer handed back verbatim.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Opaque(*mut c_void);

// SAFETY: the pointer is never dereferenced here, only handed back to the
// host, which allows its use from the owner thread.
unsafe impl Send for Opaque {}
unsafe impl Sync for Opaque {}

impl Opaque {
	pub(crate) fn new(ptr: *mut c_void) -> Self {
		Self(ptr)
	}

	pub(crate) fn get(self) -> *mut c_void {
		self.0
	}
}

fn nullable(text: Option<&CString>) -> *const c_char {
	text.map_or(ptr::null(), |text| text.as_ptr())
}

/// Builds the session callback set from a host table.
pub(crate) fn into_callbacks(table: WvCallbacks, user_data: Opaque) -> Callbacks {
	let mut callbacks = Callbacks::new();

	if let Some(callback) = table.on_policy_request {
		callbacks = callbacks.on_policy_request(move |request| {
			let uri = to_c(&request.uri);
			unsafe {
				callback(
					user_data.get(),
					request.id.get(),
					uri.as_ptr(),
					request.is_main_frame,
					request.is_new_window,
					request.navigation_type.code(),
				);
			}
		});
	}

	if let Some(callback) = table.on_navigation_completed {
		callbacks = callbacks.on_navigation_completed(move |nav| {
			let uri = to_c(&nav.uri);
			let message = to_c(&nav.message);
			unsafe {
				callback(
					user_data.get(),
					uri.as_ptr(),
					nav.status.code(),
					nav.error_code,
					message.as_ptr(),
				);
			}
		});
	}

	if let Some(callback) = table.on_script_result {
		callbacks = callbacks.on_script_result(move |result| {
			let value = result.value.as_deref().map(to_c);
			let error = result.error.as_deref().map(to_c);
			unsafe {
				callback(
					user_data.get(),
					result.id.0,
					nullable(value.as_ref()),
					nullable(error.as_ref()),
				);
			}
		});
	}

	if let Some(callback) = table.on_message {
		callbacks = callbacks.on_message(move |message| {
			let body = to_c(&message.body);
			let origin = to_c(&message.origin);
			unsafe { callback(user_data.get(), body.as_ptr(), origin.as_ptr()) };
		});
	}

	if let Some(callback) = table.on_download {
		callbacks = callbacks.on_download(move |download| {
			let uri = to_c(&download.uri);
			let filename = to_c(&download.suggested_filename);
			let mime_type = to_c(&download.mime_type);
			unsafe {
				callback(
					user_data.get(),
					uri.as_ptr(),
					filename.as_ptr(),
					mime_type.as_ptr(),
					download.content_length,
				);
			}
		});
	}

	if let Some(callback) = table.on_permission {
		callbacks = callbacks.on_permission(move |request| {
			let origin = to_c(&request.origin);
			let verdict = unsafe { callback(user_data.get(), request.kind.code(), origin.as_ptr()) };
			PermissionVerdict::from_code(verdict)
		});
	}

	if let Some(callback) = table.on_scheme_request {
		callbacks = callbacks.on_scheme_request(move |request| {
			let uri = to_c(&request.uri);
			let method = to_c(&request.method);
			let mut data: *const u8 = ptr::null();
			let mut len = 0usize;
			let mut mime: *const c_char = ptr::null();
			let mut status = 0i32;
			let handled = unsafe {
				callback(
					user_data.get(),
					uri.as_ptr(),
					method.as_ptr(),
					&mut data,
					&mut len,
					&mut mime,
					&mut status,
				)
			};
			if !handled || data.is_null() {
				return None;
			}
			let body = unsafe { std::slice::from_raw_parts(data, len) }.to_vec();
			let mime_type = unsafe { from_c(mime) };
			Some(SchemeResponse {
				data: Some(body),
				mime_type,
				status,
			})
		});
	}

	callbacks
}
