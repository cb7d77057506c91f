use barscan::{Detection, StopReason, Symbology};
use serde::{Deserialize, Serialize};

/// Where a code was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanSource {
	Image,
	Camera,
}

/// Result data for `image` and `live`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanData {
	pub code: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub symbology: Option<Symbology>,
	pub source: ScanSource,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stop_reason: Option<StopReason>,
}

impl ScanData {
	pub fn new(detection: Detection, source: ScanSource) -> Self {
		Self {
			code: detection.code,
			symbology: detection.symbology,
			source,
			stop_reason: None,
		}
	}

	pub fn with_stop_reason(mut self, reason: Option<StopReason>) -> Self {
		self.stop_reason = reason;
		self
	}
}

/// One entry of the `symbologies` listing.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbologyEntry {
	pub name: Symbology,
	/// Symbol type name the zbar tools use for it.
	pub zbar: String,
}

/// Result data for `symbologies`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbologiesData {
	pub enabled: Vec<SymbologyEntry>,
}
