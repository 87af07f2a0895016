//! Future-returning wrappers over the callback adapters.
//!
//! Each wrapper resolves to exactly what the callback form would receive.
//! None of them block the calling thread, so they are safe to await on any
//! runtime.

use tokio::sync::oneshot;
use wv_protocol::{Cookie, CookieRecord, FindResult};

use super::{CookieOpResult, Session};

/// Failure reported if the adapter's callback is lost without running.
const LOST: &str = "Detached";

impl Session {
	/// See [`cookies`](Self::cookies).
	pub async fn cookies_async(&self, uri: &str) -> String {
		let (tx, rx) = oneshot::channel();
		self.cookies(uri, move |json| {
			let _ = tx.send(json);
		});
		rx.await
			.unwrap_or_else(|_| CookieRecord::EMPTY_ARRAY.to_string())
	}

	/// See [`set_cookie`](Self::set_cookie).
	pub async fn set_cookie_async(&self, cookie: Cookie) -> CookieOpResult {
		let (tx, rx) = oneshot::channel();
		self.set_cookie(cookie, move |result| {
			let _ = tx.send(result);
		});
		rx.await.unwrap_or_else(|_| Err(LOST.to_string()))
	}

	/// See [`delete_cookie`](Self::delete_cookie).
	pub async fn delete_cookie_async(&self, name: &str, domain: &str, path: &str) -> CookieOpResult {
		let (tx, rx) = oneshot::channel();
		self.delete_cookie(name, domain, path, move |result| {
			let _ = tx.send(result);
		});
		rx.await.unwrap_or_else(|_| Err(LOST.to_string()))
	}

	/// See [`clear_cookies`](Self::clear_cookies).
	pub async fn clear_cookies_async(&self) -> CookieOpResult {
		let (tx, rx) = oneshot::channel();
		self.clear_cookies(move |result| {
			let _ = tx.send(result);
		});
		rx.await.unwrap_or_else(|_| Err(LOST.to_string()))
	}

	/// See [`capture_screenshot`](Self::capture_screenshot).
	pub async fn capture_screenshot_async(&self) -> Option<Vec<u8>> {
		let (tx, rx) = oneshot::channel();
		self.capture_screenshot(move |png| {
			let _ = tx.send(png);
		});
		rx.await.ok().flatten()
	}

	/// See [`find_text`](Self::find_text).
	pub async fn find_text_async(&self, text: &str, case_sensitive: bool, forward: bool) -> FindResult {
		let (tx, rx) = oneshot::channel();
		self.find_text(text, case_sensitive, forward, move |result| {
			let _ = tx.send(result);
		});
		rx.await.unwrap_or(FindResult::NOT_FOUND)
	}

	/// See [`print_to_file`](Self::print_to_file).
	pub async fn print_to_file_async(&self) -> Option<Vec<u8>> {
		let (tx, rx) = oneshot::channel();
		self.print_to_file(move |data| {
			let _ = tx.send(data);
		});
		rx.await.ok().flatten()
	}
}
