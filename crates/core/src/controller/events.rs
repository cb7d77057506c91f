//! Events delivered to the host.

use barscan_protocol::Detection;
use tokio::sync::mpsc;

use crate::error::ScanError;

/// Outbound notification for the host form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
	/// A barcode was read. Fires at most once per session.
	CodeAcquired(Detection),
	/// The session ended with a user-facing failure.
	Error(ScanError),
}

impl ScanEvent {
	/// The acquired payload, if this is a success event.
	pub fn code(&self) -> Option<&str> {
		match self {
			ScanEvent::CodeAcquired(detection) => Some(&detection.code),
			ScanEvent::Error(_) => None,
		}
	}

	/// Message suitable for showing to the user.
	pub fn message(&self) -> String {
		match self {
			ScanEvent::CodeAcquired(detection) => format!("scanned {}", detection.code),
			ScanEvent::Error(err) => err.to_string(),
		}
	}
}

/// Receiving end of the controller's event channel.
pub type ScanEvents = mpsc::UnboundedReceiver<ScanEvent>;
