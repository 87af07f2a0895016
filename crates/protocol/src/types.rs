//! Core value types used across the bridge boundary.
//!
//! The integer codes carried by these enums are part of the host contract:
//! they travel unchanged through the C ABI.

use serde::{Deserialize, Serialize};

/// Outcome of a navigation, reported through the navigation-completed callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum NavigationStatus {
	/// The load finished.
	Success = 0,
	/// Generic failure not covered by a more specific status.
	Failure = 1,
	/// The load was cancelled, or blocked by policy.
	Canceled = 2,
	/// Reserved. No code path produces this status.
	Timeout = 3,
	/// Transport, protocol, or generic network failure.
	Network = 4,
	/// TLS or certificate failure.
	Ssl = 5,
}

impl NavigationStatus {
	/// Returns the integer code used on the C ABI.
	pub fn code(self) -> i32 {
		self as i32
	}

	/// Decodes an integer code, returning `None` for values outside the table.
	pub fn from_code(code: i32) -> Option<Self> {
		match code {
			0 => Some(Self::Success),
			1 => Some(Self::Failure),
			2 => Some(Self::Canceled),
			3 => Some(Self::Timeout),
			4 => Some(Self::Network),
			5 => Some(Self::Ssl),
			_ => None,
		}
	}

	/// Returns true for every status other than [`Success`](Self::Success).
	pub fn is_failure(self) -> bool {
		self != Self::Success
	}
}

/// What triggered a same-view navigation.
///
/// Codes mirror the engine's navigation action classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(i32)]
pub enum NavigationType {
	/// A link was activated. Also reported for new-window requests.
	#[default]
	LinkClicked = 0,
	/// A form was submitted.
	FormSubmitted = 1,
	/// History traversal.
	BackForward = 2,
	/// The page was reloaded.
	Reload = 3,
	/// A form was resubmitted.
	FormResubmitted = 4,
	/// Script-initiated or otherwise unclassified navigation.
	Other = 5,
}

impl NavigationType {
	/// Returns the integer code used on the C ABI.
	pub fn code(self) -> i32 {
		self as i32
	}

	/// Decodes an integer code; unknown values map to [`Other`](Self::Other).
	pub fn from_code(code: i32) -> Self {
		match code {
			0 => Self::LinkClicked,
			1 => Self::FormSubmitted,
			2 => Self::BackForward,
			3 => Self::Reload,
			4 => Self::FormResubmitted,
			_ => Self::Other,
		}
	}
}

/// Category of a permission request raised by page content.
///
/// Codes 4 and 5 are reserved and decode to [`Unknown`](Self::Unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(i32)]
pub enum PermissionKind {
	/// Anything the engine binding could not classify.
	#[default]
	Unknown = 0,
	/// Camera capture.
	Camera = 1,
	/// Microphone capture.
	Microphone = 2,
	/// Location access.
	Geolocation = 3,
	/// Desktop notifications.
	Notifications = 6,
}

impl PermissionKind {
	/// Returns the integer code used on the C ABI.
	pub fn code(self) -> i32 {
		self as i32
	}

	/// Decodes an integer code; unknown and reserved values map to `Unknown`.
	pub fn from_code(code: i32) -> Self {
		match code {
			1 => Self::Camera,
			2 => Self::Microphone,
			3 => Self::Geolocation,
			6 => Self::Notifications,
			_ => Self::Unknown,
		}
	}
}

/// Host answer to a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(i32)]
pub enum PermissionVerdict {
	/// Defer to the engine's built-in behavior.
	#[default]
	Default = 0,
	/// Grant the permission.
	Allow = 1,
	/// Refuse the permission.
	Deny = 2,
}

impl PermissionVerdict {
	/// Returns the integer code used on the C ABI.
	pub fn code(self) -> i32 {
		self as i32
	}

	/// Decodes an integer code; unknown values map to `Default`.
	pub fn from_code(code: i32) -> Self {
		match code {
			1 => Self::Allow,
			2 => Self::Deny,
			_ => Self::Default,
		}
	}
}

/// Identifier of the host-owned native surface a view is embedded into.
///
/// Zero is never a valid surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
	/// Returns true unless the id is zero.
	pub fn is_valid(self) -> bool {
		self.0 != 0
	}
}

impl From<u64> for SurfaceId {
	fn from(value: u64) -> Self {
		Self(value)
	}
}

/// Search options for find-in-page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOptions {
	/// Match case exactly.
	pub case_sensitive: bool,
	/// Search towards the end of the document.
	pub forward: bool,
	/// Continue from the start after reaching the end. Always on for bridge searches.
	pub wrap_around: bool,
}

impl FindOptions {
	/// Creates options for a bridge search. Wrap-around is always enabled.
	pub fn new(case_sensitive: bool, forward: bool) -> Self {
		Self {
			case_sensitive,
			forward,
			wrap_around: true,
		}
	}
}

impl Default for FindOptions {
	fn default() -> Self {
		Self::new(false, true)
	}
}

/// Result of a find-in-page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindResult {
	/// Index of the active match, or -1 when nothing matched.
	pub active_index: i32,
	/// Number of matches in the document.
	pub total_matches: i32,
}

impl FindResult {
	/// Reported when the text was not found, the search failed, or no view exists.
	pub const NOT_FOUND: Self = Self {
		active_index: -1,
		total_matches: 0,
	};

	/// Builds the result for a counted-matches signal.
	pub fn from_count(total: u32) -> Self {
		if total == 0 {
			return Self::NOT_FOUND;
		}
		Self {
			active_index: 0,
			total_matches: i32::try_from(total).unwrap_or(i32::MAX),
		}
	}
}

/// A fetch for a registered custom scheme, handed to the host resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeRequest {
	/// Full request address, e.g. `app://host/path`.
	pub uri: String,
	/// HTTP method, `GET` unless the engine reports otherwise.
	pub method: String,
}

/// Host answer to a [`SchemeRequest`].
///
/// A resolver returns `None` for "not handled". A response without `data` is
/// treated the same way.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeResponse {
	/// Response body.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<Vec<u8>>,
	/// MIME type; `application/octet-stream` when absent.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mime_type: Option<String>,
	/// HTTP status; values `<= 0` mean 200.
	pub status: i32,
}

impl SchemeResponse {
	/// MIME type used when the resolver does not supply one.
	pub const DEFAULT_MIME_TYPE: &'static str = "application/octet-stream";

	/// Creates a 200 response with the given body.
	pub fn ok(data: impl Into<Vec<u8>>) -> Self {
		Self {
			data: Some(data.into()),
			mime_type: None,
			status: 200,
		}
	}

	/// Sets the MIME type.
	pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
		self.mime_type = Some(mime_type.into());
		self
	}

	/// Sets the HTTP status.
	pub fn status(mut self, status: i32) -> Self {
		self.status = status;
		self
	}
}
