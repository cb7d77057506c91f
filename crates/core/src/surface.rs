//! Display surfaces that render the live feed.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::camera::MediaStream;
use crate::error::SurfaceError;

/// Where a live stream is rendered and where the live decoder reads frames from.
#[async_trait]
pub trait DisplaySurface: Send + Sync {
	/// Binds `stream` to the surface and starts playback.
	fn attach(&self, stream: &dyn MediaStream) -> Result<(), SurfaceError>;

	/// Unbinds the current stream. A no-op when nothing is attached.
	fn detach(&self);

	/// Label of the attached stream, if any.
	fn source(&self) -> Option<String>;

	/// Resolves once the first frame has been rendered.
	///
	/// Surfaces without a playback signal keep the default, which never
	/// resolves; the controller then falls back to its bounded readiness wait.
	async fn playing(&self) {
		std::future::pending::<()>().await
	}
}

/// Surface for hosts that do not render the feed, such as a terminal.
///
/// Nothing has to be drawn, so playback is reported as soon as a stream is attached.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
	attached: Mutex<Option<String>>,
}

impl HeadlessSurface {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl DisplaySurface for HeadlessSurface {
	fn attach(&self, stream: &dyn MediaStream) -> Result<(), SurfaceError> {
		let mut attached = self.attached.lock();
		if let Some(current) = attached.as_deref() {
			return Err(SurfaceError(format!("surface already shows {current}")));
		}
		*attached = Some(stream.label().to_string());
		Ok(())
	}

	fn detach(&self) {
		self.attached.lock().take();
	}

	fn source(&self) -> Option<String> {
		self.attached.lock().clone()
	}

	async fn playing(&self) {}
}
