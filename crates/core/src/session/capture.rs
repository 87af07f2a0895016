//! Screenshot and print adapters.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use super::Session;

impl Session {
	/// Captures the visible region as PNG bytes.
	///
	/// `callback` receives `None` if the session has no live view, the
	/// snapshot fails, or encoding fails. It is called exactly once.
	pub fn capture_screenshot<F>(&self, callback: F)
	where
		F: FnOnce(Option<Vec<u8>>) + Send + 'static,
	{
		let operation = self.inner.operations.begin(None, callback);

		self.post_to_view(move |_, view| {
			view.snapshot(Box::new(move |result| {
				let png = match result {
					Ok(image) => encode_png(&image),
					Err(err) => {
						tracing::debug!(error = %err, "snapshot failed");
						None
					}
				};
				operation.complete(png);
			}));
		});
	}

	/// Exports the document to a file.
	///
	/// The engine offers no document export in this embedding mode, so
	/// `callback` always receives `None`, immediately.
	pub fn print_to_file<F>(&self, callback: F)
	where
		F: FnOnce(Option<Vec<u8>>) + Send + 'static,
	{
		tracing::debug!("print to file is not supported");
		callback(None);
	}
}

/// Encodes a snapshot as PNG. Empty images count as failures.
pub(crate) fn encode_png(image: &RgbaImage) -> Option<Vec<u8>> {
	if image.width() == 0 || image.height() == 0 {
		tracing::debug!("snapshot is empty");
		return None;
	}
	let mut bytes = Vec::new();
	match image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png) {
		Ok(()) => Some(bytes),
		Err(err) => {
			tracing::warn!(error = %err, "png encoding failed");
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use image::Rgba;

	use super::*;

	#[test]
	fn test_encode_png_signature() {
		let image = RgbaImage::from_pixel(3, 2, Rgba([255, 0, 0, 255]));
		let bytes = encode_png(&image).unwrap();
		assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

		let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
		assert_eq!(decoded.width(), 3);
		assert_eq!(decoded.height(), 2);
	}

	#[test]
	fn test_encode_empty_image_fails() {
		assert!(encode_png(&RgbaImage::new(0, 0)).is_none());
	}
}
