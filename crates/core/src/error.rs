//! Error taxonomy for acquisition sessions and their capabilities.

use std::path::PathBuf;

use thiserror::Error;

use crate::controller::ScanMode;

/// Result alias for controller operations.
pub type Result<T, E = ScanError> = std::result::Result<T, E>;

/// Failure that ends an acquisition session.
///
/// Every variant except [`ScanError::Busy`] and [`ScanError::Cancelled`] is
/// also emitted to the host as a [`ScanEvent::Error`](crate::ScanEvent::Error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
	#[error("camera permission denied: {0}")]
	PermissionDenied(String),

	#[error("camera unavailable: {0}")]
	StreamUnavailable(String),

	#[error("barcode scanner failed to start: {0}")]
	DecoderInitFailed(String),

	#[error("no barcode found in image; try another photo")]
	NoCodeFound,

	#[error("not an image file: {0}")]
	NotAnImage(String),

	#[error("could not read image: {0}")]
	ImageUnreadable(String),

	#[error("barcode decode failed: {0}")]
	DecodeFailed(String),

	#[error("scanner is busy ({0})")]
	Busy(ScanMode),

	#[error("scan cancelled")]
	Cancelled,
}

impl ScanError {
	/// Whether the error is reported to the host through the event channel.
	pub fn is_user_facing(&self) -> bool {
		!matches!(self, ScanError::Busy(_) | ScanError::Cancelled)
	}

	/// Whether the user can simply retry with another image.
	pub fn is_recoverable(&self) -> bool {
		matches!(self, ScanError::NoCodeFound | ScanError::NotAnImage(_) | ScanError::ImageUnreadable(_))
	}
}

/// Failure reported by a [`CameraPlatform`](crate::CameraPlatform).
#[derive(Debug, Error)]
pub enum CameraError {
	#[error("{0}")]
	PermissionDenied(String),

	#[error("{0}")]
	Unavailable(String),
}

impl From<CameraError> for ScanError {
	fn from(err: CameraError) -> Self {
		match err {
			CameraError::PermissionDenied(msg) => ScanError::PermissionDenied(msg),
			CameraError::Unavailable(msg) => ScanError::StreamUnavailable(msg),
		}
	}
}

/// Failure reported by a [`DecoderEngine`](crate::DecoderEngine).
#[derive(Debug, Error)]
pub enum DecoderError {
	#[error("{0}")]
	Init(String),

	#[error("{0}")]
	Engine(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Failure attaching a stream to a [`DisplaySurface`](crate::DisplaySurface).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SurfaceError(pub String);

/// Failure loading a [`ScanConfig`](crate::ScanConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config {path}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid config: {0}")]
	Invalid(String),
}
