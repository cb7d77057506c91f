//! Barcode symbologies a decoder can be configured to recognize.

use serde::{Deserialize, Serialize};

/// A barcode encoding standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
	#[serde(rename = "code_128")]
	Code128,
	#[serde(rename = "ean_13")]
	Ean13,
	#[serde(rename = "ean_8")]
	Ean8,
	#[serde(rename = "code_39")]
	Code39,
	/// Code 39 restricted to vehicle identification numbers.
	#[serde(rename = "code_39_vin")]
	Code39Vin,
	Codabar,
	UpcA,
	UpcE,
	/// Interleaved 2 of 5.
	#[serde(rename = "i2of5")]
	Interleaved2of5,
}

impl Symbology {
	/// Symbologies enabled for both the live and the still-image path unless configured otherwise.
	pub const DEFAULT_SET: [Symbology; 9] = [
		Symbology::Code128,
		Symbology::Ean13,
		Symbology::Ean8,
		Symbology::Code39,
		Symbology::Code39Vin,
		Symbology::Codabar,
		Symbology::UpcA,
		Symbology::UpcE,
		Symbology::Interleaved2of5,
	];

	/// Stable identifier, identical to the serde representation.
	pub fn as_str(self) -> &'static str {
		match self {
			Symbology::Code128 => "code_128",
			Symbology::Ean13 => "ean_13",
			Symbology::Ean8 => "ean_8",
			Symbology::Code39 => "code_39",
			Symbology::Code39Vin => "code_39_vin",
			Symbology::Codabar => "codabar",
			Symbology::UpcA => "upc_a",
			Symbology::UpcE => "upc_e",
			Symbology::Interleaved2of5 => "i2of5",
		}
	}
}

impl std::fmt::Display for Symbology {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for Symbology {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s.trim().to_lowercase().replace('-', "_");
		match normalized.as_str() {
			"code_128" | "code128" => Ok(Symbology::Code128),
			"ean_13" | "ean13" | "ean" => Ok(Symbology::Ean13),
			"ean_8" | "ean8" => Ok(Symbology::Ean8),
			"code_39" | "code39" => Ok(Symbology::Code39),
			"code_39_vin" | "code39_vin" | "code39vin" => Ok(Symbology::Code39Vin),
			"codabar" => Ok(Symbology::Codabar),
			"upc_a" | "upca" | "upc" => Ok(Symbology::UpcA),
			"upc_e" | "upce" => Ok(Symbology::UpcE),
			"i2of5" | "i25" | "interleaved_2_of_5" => Ok(Symbology::Interleaved2of5),
			_ => Err(format!("unknown symbology: {s}")),
		}
	}
}
