//! Acquisition session state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::camera::MediaStream;
use crate::decoder::LiveDecoder;

/// What the controller is doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
	#[default]
	Idle,
	/// Waiting for the camera platform to grant a stream.
	RequestingPermission,
	/// Stream attached; the live decoder is starting or running.
	LiveScanning,
	/// A still image is being decoded.
	ImageDecoding,
}

impl std::fmt::Display for ScanMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ScanMode::Idle => write!(f, "idle"),
			ScanMode::RequestingPermission => write!(f, "requesting permission"),
			ScanMode::LiveScanning => write!(f, "live scanning"),
			ScanMode::ImageDecoding => write!(f, "decoding image"),
		}
	}
}

/// Identity of one acquisition session. Continuations carrying a stale id are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl std::fmt::Display for SessionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "scan-{}", self.0)
	}
}

/// Why the last session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
	/// A code was delivered to the host.
	Acquired,
	/// The host called `stop_scan`.
	Stopped,
	/// A capability failed, or the image held no barcode.
	Failed,
	/// The controller was torn down.
	TornDown,
	/// The pending start or upload future was dropped.
	Abandoned,
}

/// Handles and bookkeeping of the current session.
///
/// `media` is `Some` exactly while `mode` is [`ScanMode::LiveScanning`].
#[derive(Default)]
pub(crate) struct AcquisitionSession {
	pub(crate) id: Option<SessionId>,
	pub(crate) mode: ScanMode,
	pub(crate) media: Option<Box<dyn MediaStream>>,
	pub(crate) decoder: Option<Box<dyn LiveDecoder>>,
	pub(crate) cancel: Option<Arc<Notify>>,
	pub(crate) result_code: Option<String>,
	pub(crate) last_ended: Option<(SessionId, StopReason)>,
}

impl AcquisitionSession {
	pub(crate) fn is_current(&self, id: SessionId) -> bool {
		self.id == Some(id)
	}
}
