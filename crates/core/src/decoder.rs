//! Decoder engine capability.
//!
//! The engine's decoding algorithm is external. The controller only needs two
//! entry points: a live mode bound to a display surface, and a single-shot
//! decode of a still image.

use std::sync::Arc;

use async_trait::async_trait;
use barscan_protocol::{DecodeOptions, Detection, ImageSource, MediaConstraints, SourceKind, Symbology};

use crate::error::DecoderError;
use crate::surface::DisplaySurface;

/// Parameters for a live decode session.
#[derive(Clone)]
pub struct LiveRequest {
	/// Surface the camera stream is attached to.
	pub surface: Arc<dyn DisplaySurface>,
	pub constraints: MediaConstraints,
	pub symbologies: Vec<Symbology>,
}

impl std::fmt::Debug for LiveRequest {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LiveRequest")
			.field("source", &self.surface.source())
			.field("constraints", &self.constraints)
			.field("symbologies", &self.symbologies)
			.finish()
	}
}

/// Callback a live engine invokes for every successful read.
///
/// Engines may call it from any task and any number of times; the controller
/// accepts the first detection of a session and ignores the rest.
#[derive(Clone)]
pub struct DetectionSink {
	deliver: Arc<dyn Fn(Detection) + Send + Sync>,
}

impl DetectionSink {
	pub fn new(deliver: impl Fn(Detection) + Send + Sync + 'static) -> Self {
		Self { deliver: Arc::new(deliver) }
	}

	pub fn deliver(&self, detection: Detection) {
		(self.deliver)(detection)
	}
}

impl std::fmt::Debug for DetectionSink {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DetectionSink").finish_non_exhaustive()
	}
}

/// A running live decode instance.
pub trait LiveDecoder: Send {
	/// Stops recognition. Must be safe to call more than once and must not
	/// invoke the [`DetectionSink`] synchronously.
	fn stop(&mut self);
}

/// External barcode decoder.
#[async_trait]
pub trait DecoderEngine: Send + Sync {
	/// Starts continuous recognition against the stream attached to `request.surface`.
	///
	/// Resolves once the engine is initialized; failures here are reported as
	/// decoder initialization failures.
	async fn start_live(&self, request: LiveRequest, sink: DetectionSink) -> Result<Box<dyn LiveDecoder>, DecoderError>;

	/// Decodes one still image. `Ok(None)` means no barcode was recognized.
	async fn decode_single(&self, source: ImageSource, options: &DecodeOptions) -> Result<Option<Detection>, DecoderError>;

	/// Image representation this engine handles best.
	fn preferred_source(&self) -> SourceKind {
		SourceKind::Raw
	}
}
