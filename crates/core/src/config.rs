//! Acquisition configuration.

use std::path::Path;
use std::time::Duration;

use barscan_protocol::{MediaConstraints, SourceKind, Symbology};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound on waiting for the surface to report playback before the
/// live decoder is started anyway.
pub const DEFAULT_READINESS_TIMEOUT_MS: u64 = 1000;

/// Settings shared by the live and the still-image path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
	pub constraints: MediaConstraints,
	pub symbologies: Vec<Symbology>,
	pub readiness_timeout_ms: u64,
	/// Forces the still-image representation; `None` uses the engine's preference.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image_transfer: Option<SourceKind>,
}

impl Default for ScanConfig {
	fn default() -> Self {
		Self {
			constraints: MediaConstraints::default(),
			symbologies: Symbology::DEFAULT_SET.to_vec(),
			readiness_timeout_ms: DEFAULT_READINESS_TIMEOUT_MS,
			image_transfer: None,
		}
	}
}

impl ScanConfig {
	/// Parses a JSON config without validating it.
	pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}

	/// Loads a JSON config file.
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let config = Self::from_json_str(&raw).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})?;
		config.validate()?;
		Ok(config)
	}

	/// Rejects settings the controller cannot run with.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.symbologies.is_empty() {
			return Err(ConfigError::Invalid("at least one symbology must be enabled".into()));
		}
		if self.constraints.width == 0 || self.constraints.height == 0 {
			return Err(ConfigError::Invalid("camera resolution hint must be non-zero".into()));
		}
		Ok(())
	}

	pub fn readiness_timeout(&self) -> Duration {
		Duration::from_millis(self.readiness_timeout_ms)
	}

	pub fn with_symbologies(mut self, symbologies: Vec<Symbology>) -> Self {
		let mut unique = Vec::with_capacity(symbologies.len());
		for symbology in symbologies {
			if !unique.contains(&symbology) {
				unique.push(symbology);
			}
		}
		self.symbologies = unique;
		self
	}

	pub fn with_constraints(mut self, constraints: MediaConstraints) -> Self {
		self.constraints = constraints;
		self
	}

	pub fn with_readiness_timeout(mut self, timeout: Duration) -> Self {
		self.readiness_timeout_ms = timeout.as_millis() as u64;
		self
	}

	pub fn with_image_transfer(mut self, kind: Option<SourceKind>) -> Self {
		self.image_transfer = kind;
		self
	}
}
