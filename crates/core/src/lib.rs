//! Barcode acquisition over injected capabilities.
//!
//! [`BarcodeAcquisitionController`] reads a barcode either from a live camera
//! feed or from a single uploaded image and reports the payload as one
//! [`ScanEvent::CodeAcquired`]. The camera platform, the display surface and
//! the decoder engine are traits supplied by the host, so the controller runs
//! the same against real hardware and against the in-memory fakes of the
//! `fake` feature.
//!
//! Camera and decoder handles are owned by the current session and released
//! through a single routine on every exit path, including `Drop`.

pub mod camera;
pub mod config;
pub mod controller;
pub mod decoder;
pub mod error;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
pub mod still_image;
pub mod surface;

pub use barscan_protocol as protocol;
pub use barscan_protocol::{Detection, FacingMode, MediaConstraints, Symbology};
pub use camera::{CameraPlatform, MediaStream};
pub use config::ScanConfig;
pub use controller::{BarcodeAcquisitionController, ControllerBuilder, ScanEvent, ScanEvents, ScanMode, SessionId, StopReason};
pub use decoder::{DecoderEngine, DetectionSink, LiveDecoder, LiveRequest};
pub use error::{CameraError, ConfigError, DecoderError, Result, ScanError, SurfaceError};
pub use still_image::ImageUpload;
pub use surface::{DisplaySurface, HeadlessSurface};
