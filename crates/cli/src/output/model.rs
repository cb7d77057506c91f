use std::path::PathBuf;

use barscan::Symbology;
use serde::{Deserialize, Serialize};

/// Current schema version for command output.
pub const SCHEMA_VERSION: u32 = 1;

/// The result envelope returned by all commands.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub schema_version: u32,
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub inputs: Option<CommandInputs>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub duration_ms: Option<u64>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub diagnostics: Vec<Diagnostic>,
}

/// Inputs used for a command execution.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommandInputs {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image: Option<PathBuf>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub device: Option<PathBuf>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timeout_secs: Option<u64>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub symbologies: Vec<Symbology>,
}

/// Error information for failed commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Standardized error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	PermissionDenied,
	StreamUnavailable,
	DecoderInitFailed,
	NoCodeFound,
	NotAnImage,
	ImageUnreadable,
	DecodeFailed,
	Busy,
	Cancelled,
	Timeout,
	ConfigError,
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ErrorCode::PermissionDenied => write!(f, "PERMISSION_DENIED"),
			ErrorCode::StreamUnavailable => write!(f, "STREAM_UNAVAILABLE"),
			ErrorCode::DecoderInitFailed => write!(f, "DECODER_INIT_FAILED"),
			ErrorCode::NoCodeFound => write!(f, "NO_CODE_FOUND"),
			ErrorCode::NotAnImage => write!(f, "NOT_AN_IMAGE"),
			ErrorCode::ImageUnreadable => write!(f, "IMAGE_UNREADABLE"),
			ErrorCode::DecodeFailed => write!(f, "DECODE_FAILED"),
			ErrorCode::Busy => write!(f, "BUSY"),
			ErrorCode::Cancelled => write!(f, "CANCELLED"),
			ErrorCode::Timeout => write!(f, "TIMEOUT"),
			ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
			ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
		}
	}
}

/// Diagnostic message attached to a command result.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
	pub level: DiagnosticLevel,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
	Info,
	Warning,
	Error,
}
