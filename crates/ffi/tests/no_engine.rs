// Runs in its own process so no engine is ever installed.

use std::ptr;

use wv_ffi::{installed_engine, wv_create, wv_create_with_options};

#[test]
fn test_create_without_engine_returns_null() {
	assert!(installed_engine().is_none());
	unsafe {
		assert!(wv_create(ptr::null(), ptr::null_mut()).is_null());
		assert!(wv_create_with_options(ptr::null(), ptr::null_mut(), c"{}".as_ptr()).is_null());
	}
}
