//! Cookie adapters.
//!
//! Every adapter resolves its callback exactly once. Without a live view,
//! fetches report an empty JSON array and mutations report `"Detached"`.

use wv_protocol::{Cookie, CookieRecord};

use super::Session;

/// Failure reported by mutations without a live view.
const DETACHED: &str = "Detached";

/// Result of a cookie mutation.
pub type CookieOpResult = std::result::Result<(), String>;

impl Session {
	/// Fetches the cookies that apply to `uri` as a JSON array.
	///
	/// Each entry has `name`, `value`, `domain`, `path`, `expires` (Unix
	/// seconds, `-1.0` for session cookies), `isSecure` and `isHttpOnly`.
	/// Engine errors report `[]`.
	pub fn cookies<F>(&self, uri: &str, callback: F)
	where
		F: FnOnce(String) + Send + 'static,
	{
		let operation = self
			.inner
			.operations
			.begin(CookieRecord::EMPTY_ARRAY.to_string(), callback);
		let uri = uri.to_string();

		self.post_to_view(move |_, view| {
			view.cookie_manager().get_cookies(
				&uri,
				Box::new(move |result| {
					let json = match result {
						Ok(cookies) => CookieRecord::to_json_array(&cookies),
						Err(err) => {
							tracing::debug!(error = %err, "cookie fetch failed");
							CookieRecord::EMPTY_ARRAY.to_string()
						}
					};
					operation.complete(json);
				}),
			);
		});
	}

	/// Stores `cookie`.
	///
	/// An expiry that is not a positive finite number stores a session
	/// cookie; an empty path is stored as `/`.
	pub fn set_cookie<F>(&self, cookie: Cookie, callback: F)
	where
		F: FnOnce(CookieOpResult) + Send + 'static,
	{
		let operation = self.inner.operations.begin(Err(DETACHED.to_string()), callback);
		let mut cookie = with_default_path(cookie);
		cookie.expires = cookie.expires.filter(|expires| expires.is_finite() && *expires > 0.0);

		self.post_to_view(move |_, view| {
			view.cookie_manager().add_cookie(&cookie);
			operation.complete(Ok(()));
		});
	}

	/// Deletes the cookie matching `name`, `domain` and `path`.
	pub fn delete_cookie<F>(&self, name: &str, domain: &str, path: &str, callback: F)
	where
		F: FnOnce(CookieOpResult) + Send + 'static,
	{
		let operation = self.inner.operations.begin(Err(DETACHED.to_string()), callback);
		let cookie = with_default_path(Cookie::new(name, "", domain).path(path).expires(0.0));

		self.post_to_view(move |_, view| {
			view.cookie_manager().delete_cookie(&cookie);
			operation.complete(Ok(()));
		});
	}

	/// Clears every cookie of the view's website data.
	pub fn clear_cookies<F>(&self, callback: F)
	where
		F: FnOnce(CookieOpResult) + Send + 'static,
	{
		let operation = self.inner.operations.begin(Err(DETACHED.to_string()), callback);

		self.post_to_view(move |_, view| {
			view.cookie_manager().clear_all();
			operation.complete(Ok(()));
		});
	}
}

fn with_default_path(mut cookie: Cookie) -> Cookie {
	if cookie.path.is_empty() {
		cookie.path = "/".to_string();
	}
	cookie
}
