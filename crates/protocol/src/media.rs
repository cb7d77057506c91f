//! Camera stream constraints.

use serde::{Deserialize, Serialize};

/// Which camera a platform should pick when several are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
	/// Front camera.
	User,
	/// Rear camera.
	#[default]
	Environment,
}

/// Stream request sent to a camera platform.
///
/// Width and height are hints: platforms may substitute the nearest mode they support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaConstraints {
	pub facing_mode: FacingMode,
	pub width: u32,
	pub height: u32,
}

impl MediaConstraints {
	pub const DEFAULT_WIDTH: u32 = 640;
	pub const DEFAULT_HEIGHT: u32 = 480;
}

impl Default for MediaConstraints {
	fn default() -> Self {
		Self {
			facing_mode: FacingMode::Environment,
			width: Self::DEFAULT_WIDTH,
			height: Self::DEFAULT_HEIGHT,
		}
	}
}
