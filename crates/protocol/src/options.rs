//! Session configuration options.
//!
//! Options are collected before attach. Developer tools and the user agent can
//! also change on a live view; ephemeral storage and custom schemes only take
//! effect at attach time.

use serde::{Deserialize, Serialize};

/// Configuration applied when a session attaches its view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
	/// Enable the engine's developer extras (inspector).
	#[serde(default)]
	pub enable_dev_tools: bool,

	/// Use non-persistent website data storage.
	#[serde(default)]
	pub ephemeral: bool,

	/// User-agent override. `None` keeps the engine default.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_agent: Option<String>,

	/// Custom URL schemes routed to the host scheme resolver.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub custom_schemes: Vec<String>,
}

impl SessionOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Enables or disables developer tools.
	pub fn enable_dev_tools(mut self, enable: bool) -> Self {
		self.enable_dev_tools = enable;
		self
	}

	/// Selects ephemeral (non-persistent) storage.
	pub fn ephemeral(mut self, ephemeral: bool) -> Self {
		self.ephemeral = ephemeral;
		self
	}

	/// Sets the user-agent override.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());
		self
	}

	/// Adds a custom scheme.
	pub fn custom_scheme(mut self, scheme: impl Into<String>) -> Self {
		self.custom_schemes.push(scheme.into());
		self
	}
}

/// Returns true if `scheme` is a syntactically valid URL scheme name.
///
/// A scheme starts with an ASCII letter followed by letters, digits, `+`, `-`
/// or `.`.
pub fn is_valid_scheme(scheme: &str) -> bool {
	let mut chars = scheme.chars();
	match chars.next() {
		Some(first) if first.is_ascii_alphabetic() => {}
		_ => return false,
	}
	chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_options_builder() {
		let options = SessionOptions::new()
			.enable_dev_tools(true)
			.ephemeral(true)
			.user_agent("wv-test/1.0")
			.custom_scheme("app");

		assert!(options.enable_dev_tools);
		assert!(options.ephemeral);
		assert_eq!(options.user_agent.as_deref(), Some("wv-test/1.0"));
		assert_eq!(options.custom_schemes, vec!["app".to_string()]);
	}

	#[test]
	fn test_options_from_json() {
		let options: SessionOptions =
			serde_json::from_str(r#"{"ephemeral": true, "customSchemes": ["app", "res"]}"#).unwrap();
		assert!(options.ephemeral);
		assert!(!options.enable_dev_tools);
		assert_eq!(options.custom_schemes.len(), 2);
	}

	#[test]
	fn test_scheme_validation() {
		assert!(is_valid_scheme("app"));
		assert!(is_valid_scheme("x-res+v1.2"));
		assert!(!is_valid_scheme(""));
		assert!(!is_valid_scheme("1app"));
		assert!(!is_valid_scheme("app://"));
	}
}
