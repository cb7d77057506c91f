use barscan::{ScanConfig, Symbology};

use crate::context::CommandContext;
use crate::engine::zbar::zbar_type_name;
use crate::error::Result;
use crate::output::{SymbologiesData, SymbologyEntry};

pub fn execute(ctx: &CommandContext) -> Result<SymbologiesData> {
	let enabled = ctx
		.config
		.symbologies
		.iter()
		.map(|symbology| SymbologyEntry {
			name: *symbology,
			zbar: zbar_type_name(*symbology).to_string(),
		})
		.collect();
	Ok(SymbologiesData { enabled })
}

/// Caveats of the current selection under zbar.
pub fn notes(config: &ScanConfig) -> Vec<String> {
	let mut notes = Vec::new();
	if config.symbologies.contains(&Symbology::Code39Vin) {
		notes.push("code_39_vin is decoded as code_39; VIN check digits are not validated".to_string());
	}
	notes
}
