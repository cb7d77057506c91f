//! Camera platform capability.

use async_trait::async_trait;
use barscan_protocol::MediaConstraints;

use crate::error::CameraError;

/// Grants camera streams.
#[async_trait]
pub trait CameraPlatform: Send + Sync {
	/// Requests a stream matching `constraints` as closely as the platform can.
	///
	/// Permission prompts happen here; a refusal is [`CameraError::PermissionDenied`],
	/// a missing or busy device [`CameraError::Unavailable`].
	async fn request_stream(&self, constraints: &MediaConstraints) -> Result<Box<dyn MediaStream>, CameraError>;
}

/// An acquired camera stream, exclusively owned by one acquisition session.
pub trait MediaStream: Send + Sync {
	/// Human-readable label of the underlying device.
	fn label(&self) -> &str;

	/// Stops every track and releases the device.
	///
	/// Must be safe to call more than once.
	fn stop_tracks(&mut self);

	/// Whether any track is still producing frames.
	fn is_live(&self) -> bool;
}
