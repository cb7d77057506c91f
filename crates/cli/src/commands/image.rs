use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::cli::DEFAULT_DEVICE;
use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{ScanData, ScanSource};
use crate::platform::V4l2Camera;

pub async fn execute(file: &Path, ctx: &CommandContext) -> Result<ScanData> {
	info!(target: "barscan.cli", image = %file.display(), "decode image");

	// the image path never opens the camera
	let (controller, _events) = ctx.controller(Arc::new(V4l2Camera::new(DEFAULT_DEVICE)));
	let detection = controller.upload_image(file).await?;

	info!(target: "barscan.cli", code = %detection.code, "image decoded");
	Ok(ScanData::new(detection, ScanSource::Image).with_stop_reason(controller.last_stop()))
}
