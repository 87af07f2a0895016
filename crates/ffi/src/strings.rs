//! UTF-8 string conversion at the C boundary.

use std::ffi::{CStr, CString, c_char};

/// Converts `text` for a callback argument. Interior NULs are dropped.
pub(crate) fn to_c(text: &str) -> CString {
	CString::new(text).unwrap_or_else(|err| {
		let mut bytes = err.into_vec();
		bytes.retain(|byte| *byte != 0);
		CString::new(bytes).unwrap_or_default()
	})
}

/// Reads a host string. Null yields `None`; invalid UTF-8 is replaced.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn from_c(ptr: *const c_char) -> Option<String> {
	if ptr.is_null() {
		return None;
	}
	let text = unsafe { CStr::from_ptr(ptr) };
	Some(text.to_string_lossy().into_owned())
}

/// Releases a string returned by this library.
///
/// # Safety
/// `ptr` must be null or a pointer returned by a `wv_*` function documented
/// as returning an owned string, not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wv_string_free(ptr: *mut c_char) {
	if ptr.is_null() {
		return;
	}
	drop(unsafe { CString::from_raw(ptr) });
}
