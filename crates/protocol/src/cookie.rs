//! Cookie types for the cookie adapters.
//!
//! [`Cookie`] is the value handed to and returned by the engine's cookie
//! manager. [`CookieRecord`] is the JSON shape reported to hosts by the
//! cookie fetch adapter.

use serde::{Deserialize, Serialize};

/// A browser cookie as stored by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
	/// Cookie name
	pub name: String,

	/// Cookie value
	pub value: String,

	/// Domain for the cookie
	pub domain: String,

	/// Path for the cookie (default: "/")
	pub path: String,

	/// Unix timestamp in seconds. `None` means session cookie.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires: Option<f64>,

	/// Whether the cookie requires HTTPS
	pub secure: bool,

	/// Whether the cookie is HTTP-only
	pub http_only: bool,
}

impl Cookie {
	/// Creates a session cookie with path `/`.
	pub fn new(
		name: impl Into<String>,
		value: impl Into<String>,
		domain: impl Into<String>,
	) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
			domain: domain.into(),
			path: "/".to_string(),
			expires: None,
			secure: false,
			http_only: false,
		}
	}

	/// Sets the path for the cookie.
	pub fn path(mut self, path: impl Into<String>) -> Self {
		self.path = path.into();
		self
	}

	/// Sets the expiration timestamp (Unix seconds).
	pub fn expires(mut self, expires: f64) -> Self {
		self.expires = Some(expires);
		self
	}

	/// Sets whether the cookie requires HTTPS.
	pub fn secure(mut self, secure: bool) -> Self {
		self.secure = secure;
		self
	}

	/// Sets whether the cookie is HTTP-only.
	pub fn http_only(mut self, http_only: bool) -> Self {
		self.http_only = http_only;
		self
	}

	/// Returns true if the cookie has no expiry.
	pub fn is_session(&self) -> bool {
		self.expires.is_none()
	}
}

/// One entry of the JSON array produced by the cookie fetch adapter.
///
/// `expires` is Unix seconds, `-1.0` for session cookies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
	pub name: String,
	pub value: String,
	pub domain: String,
	pub path: String,
	pub expires: f64,
	pub is_secure: bool,
	pub is_http_only: bool,
}

impl CookieRecord {
	/// Expiry reported for session cookies.
	pub const SESSION_EXPIRY: f64 = -1.0;

	/// Serializes a cookie list into the JSON array reported to hosts.
	pub fn to_json_array(cookies: &[Cookie]) -> String {
		let records: Vec<CookieRecord> = cookies.iter().map(CookieRecord::from).collect();
		serde_json::to_string(&records).unwrap_or_else(|_| Self::EMPTY_ARRAY.to_string())
	}

	/// Parses a JSON array previously produced by [`to_json_array`](Self::to_json_array).
	pub fn parse_array(json: &str) -> serde_json::Result<Vec<CookieRecord>> {
		serde_json::from_str(json)
	}

	/// JSON reported when no cookies can be fetched.
	pub const EMPTY_ARRAY: &'static str = "[]";
}

impl From<&Cookie> for CookieRecord {
	fn from(cookie: &Cookie) -> Self {
		Self {
			name: cookie.name.clone(),
			value: cookie.value.clone(),
			domain: cookie.domain.clone(),
			path: if cookie.path.is_empty() {
				"/".to_string()
			} else {
				cookie.path.clone()
			},
			expires: cookie
				.expires
				.filter(|expires| expires.is_finite())
				.unwrap_or(Self::SESSION_EXPIRY),
			is_secure: cookie.secure,
			is_http_only: cookie.http_only,
		}
	}
}
