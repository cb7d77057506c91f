//! Still-image preparation for single-shot decoding.
//!
//! An upload is decoded into memory and rasterized at its native dimensions
//! into an RGBA buffer, the equivalent of drawing it onto an off-screen
//! canvas. Every intermediate buffer is owned by the call and dropped when it
//! returns.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use barscan_protocol::{ImageSource, RawImage, SourceKind, encode_data_url};
use image::ImageFormat;
use tracing::debug;

use crate::error::{Result, ScanError};

/// A file selected for single-shot decoding.
#[derive(Clone)]
pub enum ImageUpload {
	/// File on disk, read when the decode starts.
	Path(PathBuf),
	/// Already-loaded file contents.
	Bytes { name: String, bytes: Vec<u8> },
}

impl ImageUpload {
	pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
		ImageUpload::Bytes { name: name.into(), bytes }
	}

	/// Display name used in error messages.
	pub fn name(&self) -> String {
		match self {
			ImageUpload::Path(path) => path.display().to_string(),
			ImageUpload::Bytes { name, .. } => name.clone(),
		}
	}

	async fn read(self) -> Result<(String, Vec<u8>)> {
		match self {
			ImageUpload::Path(path) => {
				let name = path.display().to_string();
				let bytes = tokio::fs::read(&path)
					.await
					.map_err(|e| ScanError::ImageUnreadable(format!("{name}: {e}")))?;
				Ok((name, bytes))
			}
			ImageUpload::Bytes { name, bytes } => Ok((name, bytes)),
		}
	}
}

impl std::fmt::Debug for ImageUpload {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ImageUpload::Path(path) => f.debug_tuple("Path").field(path).finish(),
			ImageUpload::Bytes { name, bytes } => f.debug_struct("Bytes").field("name", name).field("len", &bytes.len()).finish(),
		}
	}
}

impl From<PathBuf> for ImageUpload {
	fn from(path: PathBuf) -> Self {
		ImageUpload::Path(path)
	}
}

impl From<&Path> for ImageUpload {
	fn from(path: &Path) -> Self {
		ImageUpload::Path(path.to_path_buf())
	}
}

/// Loads `upload` and rasterizes it off the async executor.
pub async fn prepare(upload: ImageUpload, kind: SourceKind) -> Result<ImageSource> {
	let (name, bytes) = upload.read().await?;
	tokio::task::spawn_blocking(move || rasterize(&name, &bytes, kind))
		.await
		.map_err(|e| ScanError::ImageUnreadable(format!("image worker failed: {e}")))?
}

/// Decodes `bytes` and renders them as the requested [`ImageSource`].
pub fn rasterize(name: &str, bytes: &[u8], kind: SourceKind) -> Result<ImageSource> {
	let format = image::guess_format(bytes).map_err(|_| ScanError::NotAnImage(name.to_string()))?;
	let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| ScanError::ImageUnreadable(format!("{name}: {e}")))?;

	let canvas = decoded.to_rgba8();
	let (width, height) = canvas.dimensions();
	if width == 0 || height == 0 {
		return Err(ScanError::ImageUnreadable(format!("{name}: image has no pixels")));
	}
	debug!(target: "barscan.image", %name, ?format, width, height, "rasterized upload");

	match kind {
		SourceKind::Raw => Ok(ImageSource::Raw(RawImage {
			width,
			height,
			rgba: canvas.into_raw(),
		})),
		SourceKind::DataUrl => {
			let mut png = Cursor::new(Vec::new());
			canvas
				.write_to(&mut png, ImageFormat::Png)
				.map_err(|e| ScanError::ImageUnreadable(format!("{name}: {e}")))?;
			Ok(ImageSource::DataUrl(encode_data_url("image/png", png.get_ref())))
		}
	}
}

#[cfg(test)]
mod tests {
	use barscan_protocol::decode_data_url;
	use image::{Rgba, RgbaImage};

	use super::*;

	fn png_bytes(width: u32, height: u32) -> Vec<u8> {
		let img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
		let mut out = Cursor::new(Vec::new());
		img.write_to(&mut out, ImageFormat::Png).unwrap();
		out.into_inner()
	}

	#[test]
	fn raw_source_keeps_native_dimensions() {
		let source = rasterize("label.png", &png_bytes(37, 11), SourceKind::Raw).unwrap();
		let ImageSource::Raw(raw) = source else {
			panic!("expected raw source");
		};
		assert_eq!((raw.width, raw.height), (37, 11));
		assert_eq!(raw.rgba.len(), 37 * 11 * 4);
	}

	#[test]
	fn data_url_source_is_png() {
		let source = rasterize("label.png", &png_bytes(4, 4), SourceKind::DataUrl).unwrap();
		let ImageSource::DataUrl(url) = source else {
			panic!("expected data url");
		};
		let (mime, bytes) = decode_data_url(&url).unwrap();
		assert_eq!(mime, "image/png");
		assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
	}

	#[test]
	fn text_file_is_not_an_image() {
		let err = rasterize("notes.txt", b"machine CAT001", SourceKind::Raw).unwrap_err();
		assert_eq!(err, ScanError::NotAnImage("notes.txt".into()));
	}

	#[test]
	fn truncated_png_is_unreadable() {
		let bytes = png_bytes(8, 8);
		let err = rasterize("cut.png", &bytes[..bytes.len() / 2], SourceKind::Raw).unwrap_err();
		assert!(matches!(err, ScanError::ImageUnreadable(_)));
	}

	#[tokio::test]
	async fn missing_path_is_unreadable() {
		let err = prepare(ImageUpload::Path(PathBuf::from("/nonexistent/label.png")), SourceKind::Raw)
			.await
			.unwrap_err();
		assert!(matches!(err, ScanError::ImageUnreadable(_)));
	}
}
