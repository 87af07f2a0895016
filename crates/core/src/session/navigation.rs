//! Navigation commands and queries.
//!
//! Commands on a session without a live view are ignored: fallible ones
//! report [`Error::Detached`](wv_runtime::Error::Detached) or
//! [`Error::NotAttached`](wv_runtime::Error::NotAttached), boolean ones
//! return false.

use wv_runtime::{Error, Result};

use super::Session;

impl Session {
	/// Starts loading `uri`.
	pub fn navigate(&self, uri: &str) -> Result<()> {
		if uri.is_empty() {
			return Err(Error::InvalidArgument("empty uri".to_string()));
		}
		let uri = uri.to_string();
		tracing::debug!(%uri, "navigate");
		self.with_view(move |_, view| view.load_uri(&uri))
	}

	/// Loads inline markup, resolving relative references against `base_uri`.
	pub fn load_html(&self, html: &str, base_uri: Option<&str>) -> Result<()> {
		let html = html.to_string();
		let base_uri = base_uri.map(str::to_string);
		self.with_view(move |_, view| view.load_html(&html, base_uri.as_deref()))
	}

	/// Goes back in history. Returns false if there is nowhere to go.
	pub fn go_back(&self) -> bool {
		self.with_view(|_, view| {
			if !view.can_go_back() {
				return false;
			}
			view.go_back();
			true
		})
		.unwrap_or(false)
	}

	/// Goes forward in history. Returns false if there is nowhere to go.
	pub fn go_forward(&self) -> bool {
		self.with_view(|_, view| {
			if !view.can_go_forward() {
				return false;
			}
			view.go_forward();
			true
		})
		.unwrap_or(false)
	}

	/// Reloads the current page. Returns false without a live view.
	pub fn reload(&self) -> bool {
		self.with_view(|_, view| view.reload()).is_ok()
	}

	/// Stops the current load.
	pub fn stop(&self) -> Result<()> {
		self.with_view(|_, view| view.stop_loading())
	}

	pub fn can_go_back(&self) -> bool {
		self.with_view(|_, view| view.can_go_back()).unwrap_or(false)
	}

	pub fn can_go_forward(&self) -> bool {
		self.with_view(|_, view| view.can_go_forward()).unwrap_or(false)
	}

	/// Current top-level address of the view.
	pub fn current_uri(&self) -> Option<String> {
		self.with_view(|_, view| view.uri()).ok().flatten()
	}

	/// The engine-native view handle, or `None` without a live view.
	pub fn native_handle(&self) -> Option<usize> {
		self.with_view(|_, view| view.native_handle())
			.ok()
			.filter(|handle| *handle != 0)
	}
}
