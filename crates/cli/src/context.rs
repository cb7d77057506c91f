use std::path::Path;
use std::sync::Arc;

use barscan::{BarcodeAcquisitionController, CameraPlatform, HeadlessSurface, ScanConfig, ScanEvents, Symbology};
use tracing::debug;

use crate::engine::ZbarEngine;
use crate::error::Result;
use crate::output::OutputFormat;

/// Settings resolved from flags and the config file, shared by all commands.
#[derive(Debug, Clone)]
pub struct CommandContext {
	pub config: ScanConfig,
	pub format: OutputFormat,
}

impl CommandContext {
	/// Loads `config_path` if given, then applies `--symbology` overrides.
	pub fn new(format: OutputFormat, config_path: Option<&Path>, symbologies: Vec<Symbology>) -> Result<Self> {
		let mut config = match config_path {
			Some(path) => {
				debug!(target: "barscan.cli", path = %path.display(), "loading config");
				ScanConfig::from_file(path)?
			}
			None => ScanConfig::default(),
		};
		if !symbologies.is_empty() {
			config = config.with_symbologies(symbologies);
			config.validate()?;
		}
		Ok(Self { config, format })
	}

	/// Controller over `camera`, the zbar engine and a headless surface.
	pub fn controller(&self, camera: Arc<dyn CameraPlatform>) -> (BarcodeAcquisitionController, ScanEvents) {
		BarcodeAcquisitionController::builder(camera, Arc::new(ZbarEngine::new()))
			.surface(Arc::new(HeadlessSurface::new()))
			.config(self.config.clone())
			.build()
	}
}
