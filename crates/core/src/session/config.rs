//! Session configuration.
//!
//! Developer tools and the user agent apply to a live view as well as to the
//! next attach. Ephemeral storage and custom schemes are attach-time only.

use indexmap::IndexSet;
use wv_protocol::{SessionOptions, is_valid_scheme};

use super::{Session, SessionState};

/// Live configuration of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
	pub enable_dev_tools: bool,
	pub ephemeral: bool,
	pub user_agent: Option<String>,
	/// Custom schemes in registration order, without duplicates.
	pub custom_schemes: IndexSet<String>,
}

impl SessionConfig {
	pub(crate) fn from_options(options: &SessionOptions) -> Self {
		let mut config = Self {
			enable_dev_tools: options.enable_dev_tools,
			ephemeral: options.ephemeral,
			user_agent: options.user_agent.clone(),
			custom_schemes: IndexSet::new(),
		};
		for scheme in &options.custom_schemes {
			if is_valid_scheme(scheme) {
				config.custom_schemes.insert(scheme.to_ascii_lowercase());
			} else {
				tracing::warn!(%scheme, "skipping invalid custom scheme");
			}
		}
		config
	}

	pub(crate) fn clear(&mut self) {
		*self = Self::default();
	}
}

impl Session {
	/// Snapshot of the current configuration.
	pub fn config(&self) -> SessionConfig {
		self.inner.config.lock().clone()
	}

	/// Enables or disables the engine's developer extras.
	pub fn set_developer_tools_enabled(&self, enable: bool) {
		self.inner.config.lock().enable_dev_tools = enable;
		if self.state() == SessionState::Attached {
			self.post_to_view(move |_, view| view.set_developer_extras(enable));
		}
	}

	/// Selects ephemeral storage for the next attach.
	///
	/// Returns false once the session has attached or detached.
	pub fn set_ephemeral(&self, ephemeral: bool) -> bool {
		if self.state() != SessionState::Created {
			tracing::warn!("ephemeral storage can only change before attach");
			return false;
		}
		self.inner.config.lock().ephemeral = ephemeral;
		true
	}

	/// Overrides the user agent. `None` restores the engine default.
	pub fn set_user_agent(&self, user_agent: Option<&str>) {
		let user_agent = user_agent.map(str::to_string);
		self.inner.config.lock().user_agent = user_agent.clone();
		if self.state() == SessionState::Attached {
			self.post_to_view(move |_, view| view.set_user_agent(user_agent.as_deref()));
		}
	}

	/// Registers a custom URL scheme routed to the scheme callback.
	///
	/// Only valid before attach. Returns false for invalid names or once the
	/// session has attached or detached. Registering a scheme twice is
	/// accepted once.
	pub fn register_custom_scheme(&self, scheme: &str) -> bool {
		if !is_valid_scheme(scheme) {
			tracing::warn!(%scheme, "invalid custom scheme name");
			return false;
		}
		if self.state() != SessionState::Created {
			tracing::warn!(%scheme, "custom schemes can only be registered before attach");
			return false;
		}
		self.inner
			.config
			.lock()
			.custom_schemes
			.insert(scheme.to_ascii_lowercase());
		true
	}
}
