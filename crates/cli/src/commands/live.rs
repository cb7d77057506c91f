use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use barscan::ScanEvent;
use tracing::{info, warn};

use crate::context::CommandContext;
use crate::error::{CliError, Result};
use crate::output::{ScanData, ScanSource};
use crate::platform::V4l2Camera;

/// Scans from `device` until a code is read, `timeout_secs` elapse, or Ctrl-C.
pub async fn execute(device: &Path, timeout_secs: u64, ctx: &CommandContext) -> Result<ScanData> {
	info!(target: "barscan.cli", device = %device.display(), timeout_secs, "live scan");

	let (controller, mut events) = ctx.controller(Arc::new(V4l2Camera::new(device)));
	controller.start_live_scan().await?;
	info!(target: "barscan.cli", "camera running; hold the label in view");

	let deadline = async {
		if timeout_secs == 0 {
			std::future::pending::<()>().await;
		} else {
			tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
		}
	};

	let outcome = tokio::select! {
		event = events.recv() => match event {
			Some(ScanEvent::CodeAcquired(detection)) => {
				info!(target: "barscan.cli", code = %detection.code, "barcode read");
				Ok(ScanData::new(detection, ScanSource::Camera))
			}
			Some(ScanEvent::Error(err)) => Err(err.into()),
			None => Err(anyhow::anyhow!("scanner closed its event channel").into()),
		},
		_ = deadline => {
			warn!(target: "barscan.cli", timeout_secs, "no barcode read; stopping");
			controller.stop_scan();
			Err(CliError::Timeout(Duration::from_secs(timeout_secs)))
		}
		_ = tokio::signal::ctrl_c() => {
			controller.stop_scan();
			Err(CliError::Interrupted)
		}
	};

	controller.wait_idle().await;
	outcome.map(|data| data.with_stop_reason(controller.last_stop()))
}
