use std::time::Duration;

use barscan::{ConfigError, ScanError};
use serde_json::json;
use thiserror::Error;

use crate::output::ErrorCode;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Scan(#[from] ScanError),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error("no barcode read within {}s", .0.as_secs())]
	Timeout(Duration),

	#[error("interrupted before a barcode was read")]
	Interrupted,

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
	/// Stable code reported in the output envelope.
	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::Scan(err) => match err {
				ScanError::PermissionDenied(_) => ErrorCode::PermissionDenied,
				ScanError::StreamUnavailable(_) => ErrorCode::StreamUnavailable,
				ScanError::DecoderInitFailed(_) => ErrorCode::DecoderInitFailed,
				ScanError::NoCodeFound => ErrorCode::NoCodeFound,
				ScanError::NotAnImage(_) => ErrorCode::NotAnImage,
				ScanError::ImageUnreadable(_) => ErrorCode::ImageUnreadable,
				ScanError::DecodeFailed(_) => ErrorCode::DecodeFailed,
				ScanError::Busy(_) => ErrorCode::Busy,
				ScanError::Cancelled => ErrorCode::Cancelled,
			},
			CliError::Config(_) => ErrorCode::ConfigError,
			CliError::Timeout(_) => ErrorCode::Timeout,
			CliError::Interrupted => ErrorCode::Cancelled,
			CliError::Anyhow(_) => ErrorCode::InternalError,
		}
	}

	/// Machine-readable context for the error envelope, where there is any.
	pub fn details(&self) -> Option<serde_json::Value> {
		match self {
			CliError::Timeout(limit) => Some(json!({ "timeoutSecs": limit.as_secs() })),
			CliError::Scan(ScanError::Busy(mode)) => Some(json!({ "mode": mode.to_string() })),
			_ => None,
		}
	}
}
