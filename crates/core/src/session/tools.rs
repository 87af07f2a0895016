//! Developer tools and zoom.

use std::sync::atomic::Ordering;

use wv_runtime::{Error, Result};

use super::Session;

impl Session {
	/// Shows the inspector.
	///
	/// Returns false without a live view or when developer tools are
	/// disabled.
	pub fn open_dev_tools(&self) -> bool {
		if !self.inner.config.lock().enable_dev_tools {
			tracing::warn!("developer tools are disabled");
			return false;
		}
		self.with_view(|inner, view| {
			view.show_inspector();
			inner.dev_tools_open.store(true, Ordering::Release);
		})
		.is_ok()
	}

	/// Hides the inspector.
	pub fn close_dev_tools(&self) {
		let closed = self.with_view(|inner, view| {
			view.close_inspector();
			inner.dev_tools_open.store(false, Ordering::Release);
		});
		if let Err(err) = closed {
			tracing::debug!(error = %err, "close dev tools ignored");
		}
	}

	pub fn is_dev_tools_open(&self) -> bool {
		!self.inner.is_detached() && self.inner.dev_tools_open.load(Ordering::Acquire)
	}

	/// Current zoom factor; 1.0 without a live view.
	pub fn zoom(&self) -> f64 {
		self.with_view(|_, view| view.zoom_level()).unwrap_or(1.0)
	}

	/// Sets the zoom factor. Must be finite and positive.
	pub fn set_zoom(&self, level: f64) -> Result<()> {
		if !level.is_finite() || level <= 0.0 {
			return Err(Error::InvalidArgument(format!("zoom level {level}")));
		}
		self.with_view(move |_, view| view.set_zoom_level(level))
	}
}
