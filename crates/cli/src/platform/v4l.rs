//! Video4Linux capture devices.
//!
//! Holding the device node open stands in for holding the camera: the stream
//! is live until its tracks are stopped, which closes the handle. Frames are
//! read by the decoder engine from the same device.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use barscan::{CameraError, CameraPlatform, MediaConstraints, MediaStream};
use tracing::debug;

/// Camera platform for one device node such as `/dev/video0`.
#[derive(Debug, Clone)]
pub struct V4l2Camera {
	device: PathBuf,
}

impl V4l2Camera {
	pub fn new(device: impl Into<PathBuf>) -> Self {
		Self { device: device.into() }
	}

	pub fn device(&self) -> &Path {
		&self.device
	}
}

#[async_trait]
impl CameraPlatform for V4l2Camera {
	async fn request_stream(&self, constraints: &MediaConstraints) -> Result<Box<dyn MediaStream>, CameraError> {
		debug!(
			target: "barscan.v4l",
			device = %self.device.display(),
			facing = ?constraints.facing_mode,
			width = constraints.width,
			height = constraints.height,
			"opening capture device"
		);

		let file = tokio::fs::OpenOptions::new()
			.read(true)
			.write(true)
			.open(&self.device)
			.await
			.map_err(|err| open_error(&self.device, err))?;
		let file = file.into_std().await;

		#[cfg(unix)]
		{
			use std::os::unix::fs::FileTypeExt;

			let metadata = file.metadata().map_err(|err| open_error(&self.device, err))?;
			if !metadata.file_type().is_char_device() {
				return Err(CameraError::Unavailable(format!("{} is not a capture device", self.device.display())));
			}
		}

		Ok(Box::new(V4l2Stream {
			label: self.device.display().to_string(),
			handle: Some(file),
		}))
	}
}

fn open_error(device: &Path, err: io::Error) -> CameraError {
	match err.kind() {
		io::ErrorKind::PermissionDenied => CameraError::PermissionDenied(format!("{}: {err}", device.display())),
		io::ErrorKind::NotFound => CameraError::Unavailable(format!("no camera at {}", device.display())),
		io::ErrorKind::ResourceBusy => CameraError::Unavailable(format!("{} is in use by another program", device.display())),
		_ => CameraError::Unavailable(format!("{}: {err}", device.display())),
	}
}

struct V4l2Stream {
	label: String,
	handle: Option<File>,
}

impl MediaStream for V4l2Stream {
	fn label(&self) -> &str {
		&self.label
	}

	fn stop_tracks(&mut self) {
		if self.handle.take().is_some() {
			debug!(target: "barscan.v4l", device = %self.label, "capture device closed");
		}
	}

	fn is_live(&self) -> bool {
		self.handle.is_some()
	}
}
