//! Decode requests and results.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::symbology::Symbology;

/// Options for a single-shot decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeOptions {
	/// Worker threads the engine may use; `0` decodes on the calling task.
	pub num_of_workers: u8,
	/// Whether the engine should search the whole image for a barcode.
	pub locate: bool,
	pub symbologies: Vec<Symbology>,
}

impl DecodeOptions {
	/// Synchronous, locating decode for the given symbology set.
	pub fn single_shot(symbologies: &[Symbology]) -> Self {
		Self {
			num_of_workers: 0,
			locate: true,
			symbologies: symbologies.to_vec(),
		}
	}
}

/// A successfully read barcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
	pub code: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub symbology: Option<Symbology>,
}

impl Detection {
	pub fn new(code: impl Into<String>) -> Self {
		Self {
			code: code.into(),
			symbology: None,
		}
	}

	pub fn with_symbology(mut self, symbology: Symbology) -> Self {
		self.symbology = Some(symbology);
		self
	}
}

/// RGBA8 pixel buffer at the image's native dimensions.
#[derive(Clone, PartialEq, Eq)]
pub struct RawImage {
	pub width: u32,
	pub height: u32,
	pub rgba: Vec<u8>,
}

impl std::fmt::Debug for RawImage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RawImage")
			.field("width", &self.width)
			.field("height", &self.height)
			.field("bytes", &self.rgba.len())
			.finish()
	}
}

/// How an image is handed to a single-shot decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
	#[default]
	Raw,
	DataUrl,
}

/// Image handed to a single-shot decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
	/// `data:<mime>;base64,<payload>` URL.
	DataUrl(String),
	Raw(RawImage),
}

impl ImageSource {
	pub fn kind(&self) -> SourceKind {
		match self {
			ImageSource::DataUrl(_) => SourceKind::DataUrl,
			ImageSource::Raw(_) => SourceKind::Raw,
		}
	}
}

/// Builds a base64 data URL for `bytes` of the given MIME type.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
	format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Splits a base64 data URL into its MIME type and decoded payload.
///
/// Returns `None` for URLs that are not base64 data URLs.
pub fn decode_data_url(url: &str) -> Option<(String, Vec<u8>)> {
	let rest = url.strip_prefix("data:")?;
	let (header, payload) = rest.split_once(',')?;
	let mime = header.strip_suffix(";base64")?;
	let bytes = STANDARD.decode(payload.trim()).ok()?;
	Some((mime.to_string(), bytes))
}
