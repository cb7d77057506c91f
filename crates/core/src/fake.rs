//! In-memory capabilities for exercising the controller without hardware.
//!
//! Each fake records what the controller did to it (requests, attachments,
//! track stops, decoder stops) through shared probes, and can be told to
//! fail or to hold a call open until the test releases it.
//!
//! # Example
//!
//! ```ignore
//! let camera = Arc::new(FakeCamera::granting());
//! let decoder = Arc::new(FakeDecoder::new());
//! let (controller, mut events) = BarcodeAcquisitionController::builder(camera.clone(), decoder.clone())
//!     .surface(Arc::new(FakeSurface::signalling()))
//!     .build();
//!
//! controller.start_live_scan().await?;
//! decoder.emit("CAT001");
//! assert_eq!(events.recv().await.unwrap().code(), Some("CAT001"));
//! assert_eq!(camera.streams()[0].stop_calls(), 1);
//! ```
//!
//! Still images use a strip code instead of a real symbology: the payload is
//! written into the first pixel row by [`paint_strip_code`] and read back by
//! [`FakeDecoder::decode_single`](crate::DecoderEngine::decode_single).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use barscan_protocol::{DecodeOptions, Detection, ImageSource, MediaConstraints, SourceKind, Symbology, decode_data_url};
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::camera::{CameraPlatform, MediaStream};
use crate::decoder::{DecoderEngine, DetectionSink, LiveDecoder, LiveRequest};
use crate::error::{CameraError, DecoderError, SurfaceError};
use crate::surface::DisplaySurface;

const STRIP_GREEN: u8 = 0x5A;
const STRIP_BLUE: u8 = 0xA5;

/// Observes one stream handed out by [`FakeCamera`].
#[derive(Debug)]
pub struct StreamProbe {
	label: String,
	stop_calls: AtomicUsize,
	live: AtomicBool,
}

impl StreamProbe {
	pub fn label(&self) -> &str {
		&self.label
	}

	/// Number of `stop_tracks` calls the stream received.
	pub fn stop_calls(&self) -> usize {
		self.stop_calls.load(Ordering::SeqCst)
	}

	pub fn is_live(&self) -> bool {
		self.live.load(Ordering::SeqCst)
	}
}

struct FakeStream {
	probe: Arc<StreamProbe>,
}

impl MediaStream for FakeStream {
	fn label(&self) -> &str {
		&self.probe.label
	}

	fn stop_tracks(&mut self) {
		self.probe.stop_calls.fetch_add(1, Ordering::SeqCst);
		self.probe.live.store(false, Ordering::SeqCst);
	}

	fn is_live(&self) -> bool {
		self.probe.is_live()
	}
}

#[derive(Debug, Clone)]
enum CameraBehavior {
	Grant,
	Deny(String),
	Unavailable(String),
}

/// Camera platform that grants, denies or fails stream requests on demand.
pub struct FakeCamera {
	behavior: CameraBehavior,
	gate: Option<Arc<Notify>>,
	requests: AtomicUsize,
	streams: Mutex<Vec<Arc<StreamProbe>>>,
	last_constraints: Mutex<Option<MediaConstraints>>,
}

impl FakeCamera {
	fn with_behavior(behavior: CameraBehavior) -> Self {
		Self {
			behavior,
			gate: None,
			requests: AtomicUsize::new(0),
			streams: Mutex::new(Vec::new()),
			last_constraints: Mutex::new(None),
		}
	}

	pub fn granting() -> Self {
		Self::with_behavior(CameraBehavior::Grant)
	}

	pub fn denying(message: impl Into<String>) -> Self {
		Self::with_behavior(CameraBehavior::Deny(message.into()))
	}

	pub fn unavailable(message: impl Into<String>) -> Self {
		Self::with_behavior(CameraBehavior::Unavailable(message.into()))
	}

	/// Holds every request open until [`FakeCamera::answer`] is called.
	pub fn gated(mut self) -> Self {
		self.gate = Some(Arc::new(Notify::new()));
		self
	}

	/// Lets one gated request complete.
	pub fn answer(&self) {
		if let Some(gate) = &self.gate {
			gate.notify_one();
		}
	}

	pub fn requests(&self) -> usize {
		self.requests.load(Ordering::SeqCst)
	}

	pub fn streams(&self) -> Vec<Arc<StreamProbe>> {
		self.streams.lock().clone()
	}

	pub fn last_constraints(&self) -> Option<MediaConstraints> {
		self.last_constraints.lock().clone()
	}
}

#[async_trait]
impl CameraPlatform for FakeCamera {
	async fn request_stream(&self, constraints: &MediaConstraints) -> Result<Box<dyn MediaStream>, CameraError> {
		let n = self.requests.fetch_add(1, Ordering::SeqCst);
		*self.last_constraints.lock() = Some(constraints.clone());

		if let Some(gate) = &self.gate {
			gate.notified().await;
		}

		match &self.behavior {
			CameraBehavior::Grant => {
				let probe = Arc::new(StreamProbe {
					label: format!("fake-camera-{n}"),
					stop_calls: AtomicUsize::new(0),
					live: AtomicBool::new(true),
				});
				self.streams.lock().push(Arc::clone(&probe));
				Ok(Box::new(FakeStream { probe }))
			}
			CameraBehavior::Deny(message) => Err(CameraError::PermissionDenied(message.clone())),
			CameraBehavior::Unavailable(message) => Err(CameraError::Unavailable(message.clone())),
		}
	}
}

/// Display surface that records attachments.
#[derive(Debug, Default)]
pub struct FakeSurface {
	signals_playback: bool,
	playback_gate: Option<Arc<Notify>>,
	fail_attach: bool,
	attached: Mutex<Option<String>>,
	attach_calls: AtomicUsize,
	detach_calls: AtomicUsize,
}

impl FakeSurface {
	/// Reports playback as soon as a stream is attached.
	pub fn signalling() -> Self {
		Self {
			signals_playback: true,
			..Self::default()
		}
	}

	/// Never reports playback, forcing the bounded readiness wait.
	pub fn silent() -> Self {
		Self::default()
	}

	/// Reports playback only once [`FakeSurface::play`] is called.
	pub fn gated() -> Self {
		Self {
			playback_gate: Some(Arc::new(Notify::new())),
			..Self::default()
		}
	}

	/// Releases a gated playback wait.
	pub fn play(&self) {
		if let Some(gate) = &self.playback_gate {
			gate.notify_one();
		}
	}

	/// Refuses every attachment.
	pub fn failing() -> Self {
		Self {
			fail_attach: true,
			..Self::default()
		}
	}

	pub fn attached(&self) -> Option<String> {
		self.attached.lock().clone()
	}

	pub fn attach_calls(&self) -> usize {
		self.attach_calls.load(Ordering::SeqCst)
	}

	pub fn detach_calls(&self) -> usize {
		self.detach_calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl DisplaySurface for FakeSurface {
	fn attach(&self, stream: &dyn MediaStream) -> Result<(), SurfaceError> {
		self.attach_calls.fetch_add(1, Ordering::SeqCst);
		if self.fail_attach {
			return Err(SurfaceError("video element rejected stream".into()));
		}
		*self.attached.lock() = Some(stream.label().to_string());
		Ok(())
	}

	fn detach(&self) {
		self.detach_calls.fetch_add(1, Ordering::SeqCst);
		self.attached.lock().take();
	}

	fn source(&self) -> Option<String> {
		self.attached()
	}

	async fn playing(&self) {
		if let Some(gate) = &self.playback_gate {
			gate.notified().await;
		} else if !self.signals_playback {
			std::future::pending::<()>().await;
		}
	}
}

/// Observes one live instance started by [`FakeDecoder`].
#[derive(Debug)]
pub struct LiveProbe {
	source: Option<String>,
	symbologies: Vec<Symbology>,
	stop_calls: AtomicUsize,
	running: AtomicBool,
}

impl LiveProbe {
	/// Surface source the instance was bound to.
	pub fn source(&self) -> Option<&str> {
		self.source.as_deref()
	}

	pub fn symbologies(&self) -> &[Symbology] {
		&self.symbologies
	}

	pub fn stop_calls(&self) -> usize {
		self.stop_calls.load(Ordering::SeqCst)
	}

	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::SeqCst)
	}
}

struct FakeLiveDecoder {
	probe: Arc<LiveProbe>,
	active: Arc<AtomicUsize>,
}

impl LiveDecoder for FakeLiveDecoder {
	fn stop(&mut self) {
		self.probe.stop_calls.fetch_add(1, Ordering::SeqCst);
		if self.probe.running.swap(false, Ordering::SeqCst) {
			self.active.fetch_sub(1, Ordering::SeqCst);
		}
	}
}

/// Decoder engine driven by the test.
///
/// Live detections are injected with [`FakeDecoder::emit`]; still images are
/// decoded from strip codes.
pub struct FakeDecoder {
	init_failure: Option<String>,
	init_gate: Option<Arc<Notify>>,
	detect_on_start: Option<String>,
	preferred: SourceKind,
	sinks: Mutex<Vec<DetectionSink>>,
	live: Mutex<Vec<Arc<LiveProbe>>>,
	active: Arc<AtomicUsize>,
	max_active: AtomicUsize,
	single_shot_calls: AtomicUsize,
	last_options: Mutex<Option<DecodeOptions>>,
	last_source_kind: Mutex<Option<SourceKind>>,
}

impl Default for FakeDecoder {
	fn default() -> Self {
		Self::new()
	}
}

impl FakeDecoder {
	pub fn new() -> Self {
		Self {
			init_failure: None,
			init_gate: None,
			detect_on_start: None,
			preferred: SourceKind::Raw,
			sinks: Mutex::new(Vec::new()),
			live: Mutex::new(Vec::new()),
			active: Arc::new(AtomicUsize::new(0)),
			max_active: AtomicUsize::new(0),
			single_shot_calls: AtomicUsize::new(0),
			last_options: Mutex::new(None),
			last_source_kind: Mutex::new(None),
		}
	}

	/// Fails live initialization with `message`.
	pub fn failing_init(mut self, message: impl Into<String>) -> Self {
		self.init_failure = Some(message.into());
		self
	}

	/// Holds live initialization open until [`FakeDecoder::finish_init`] is called.
	pub fn gated_init(mut self) -> Self {
		self.init_gate = Some(Arc::new(Notify::new()));
		self
	}

	/// Delivers `code` from inside live initialization, before the instance is returned.
	pub fn detecting_on_start(mut self, code: impl Into<String>) -> Self {
		self.detect_on_start = Some(code.into());
		self
	}

	pub fn preferring(mut self, kind: SourceKind) -> Self {
		self.preferred = kind;
		self
	}

	pub fn finish_init(&self) {
		if let Some(gate) = &self.init_gate {
			gate.notify_one();
		}
	}

	/// Delivers a detection through the most recent live session's callback,
	/// whether or not that session is still running.
	pub fn emit(&self, code: &str) {
		let sink = self.sinks.lock().last().cloned();
		if let Some(sink) = sink {
			sink.deliver(Detection::new(code).with_symbology(Symbology::Code128));
		}
	}

	/// Delivers a detection through the callback handed to the `index`-th live session.
	pub fn emit_to(&self, index: usize, code: &str) {
		let sink = self.sinks.lock().get(index).cloned();
		if let Some(sink) = sink {
			sink.deliver(Detection::new(code).with_symbology(Symbology::Code128));
		}
	}

	pub fn live_instances(&self) -> Vec<Arc<LiveProbe>> {
		self.live.lock().clone()
	}

	/// Live instances currently running.
	pub fn active_live(&self) -> usize {
		self.active.load(Ordering::SeqCst)
	}

	/// Highest number of live instances that ran at the same time.
	pub fn max_concurrent_live(&self) -> usize {
		self.max_active.load(Ordering::SeqCst)
	}

	pub fn single_shot_calls(&self) -> usize {
		self.single_shot_calls.load(Ordering::SeqCst)
	}

	pub fn last_options(&self) -> Option<DecodeOptions> {
		self.last_options.lock().clone()
	}

	pub fn last_source_kind(&self) -> Option<SourceKind> {
		*self.last_source_kind.lock()
	}
}

#[async_trait]
impl DecoderEngine for FakeDecoder {
	async fn start_live(&self, request: LiveRequest, sink: DetectionSink) -> Result<Box<dyn LiveDecoder>, DecoderError> {
		if let Some(gate) = &self.init_gate {
			gate.notified().await;
		}
		if let Some(message) = &self.init_failure {
			return Err(DecoderError::Init(message.clone()));
		}

		let probe = Arc::new(LiveProbe {
			source: request.surface.source(),
			symbologies: request.symbologies,
			stop_calls: AtomicUsize::new(0),
			running: AtomicBool::new(true),
		});
		self.live.lock().push(Arc::clone(&probe));
		self.sinks.lock().push(sink.clone());
		let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
		self.max_active.fetch_max(active, Ordering::SeqCst);

		if let Some(code) = &self.detect_on_start {
			sink.deliver(Detection::new(code.clone()).with_symbology(Symbology::Code128));
		}

		Ok(Box::new(FakeLiveDecoder {
			probe,
			active: Arc::clone(&self.active),
		}))
	}

	async fn decode_single(&self, source: ImageSource, options: &DecodeOptions) -> Result<Option<Detection>, DecoderError> {
		self.single_shot_calls.fetch_add(1, Ordering::SeqCst);
		*self.last_options.lock() = Some(options.clone());
		*self.last_source_kind.lock() = Some(source.kind());

		let canvas = match source {
			ImageSource::Raw(raw) => RgbaImage::from_raw(raw.width, raw.height, raw.rgba)
				.ok_or_else(|| DecoderError::Engine("raw buffer does not match dimensions".into()))?,
			ImageSource::DataUrl(url) => {
				let (_, bytes) = decode_data_url(&url).ok_or_else(|| DecoderError::Engine("malformed data url".into()))?;
				image::load_from_memory(&bytes)
					.map_err(|e| DecoderError::Engine(e.to_string()))?
					.to_rgba8()
			}
		};

		if !options.symbologies.contains(&Symbology::Code128) {
			return Ok(None);
		}
		Ok(read_strip_code(&canvas).map(|code| Detection::new(code).with_symbology(Symbology::Code128)))
	}

	fn preferred_source(&self) -> SourceKind {
		self.preferred
	}
}

/// Renders `code` as a strip code on a white canvas of the given size.
///
/// `width` is widened to fit the payload.
pub fn paint_strip_code(code: &str, width: u32, height: u32) -> RgbaImage {
	let width = width.max(code.len() as u32 + 1);
	let mut canvas = RgbaImage::from_pixel(width, height.max(1), Rgba([255, 255, 255, 255]));
	for (x, byte) in code.bytes().enumerate() {
		canvas.put_pixel(x as u32, 0, Rgba([byte, STRIP_GREEN, STRIP_BLUE, 255]));
	}
	canvas
}

fn read_strip_code(canvas: &RgbaImage) -> Option<String> {
	let mut payload = Vec::new();
	for x in 0..canvas.width() {
		let Rgba([r, g, b, a]) = *canvas.get_pixel(x, 0);
		if g != STRIP_GREEN || b != STRIP_BLUE || a != 255 {
			break;
		}
		payload.push(r);
	}
	if payload.is_empty() {
		return None;
	}
	String::from_utf8(payload).ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strip_code_reads_back() {
		let canvas = paint_strip_code("CAT001", 4, 4);
		assert!(canvas.width() >= 7);
		assert_eq!(read_strip_code(&canvas).as_deref(), Some("CAT001"));
	}

	#[test]
	fn blank_canvas_has_no_strip_code() {
		let canvas = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255]));
		assert!(read_strip_code(&canvas).is_none());
	}

	#[tokio::test]
	async fn gated_camera_waits_for_answer() {
		let camera = Arc::new(FakeCamera::granting().gated());
		let pending = tokio::spawn({
			let camera = Arc::clone(&camera);
			async move { camera.request_stream(&MediaConstraints::default()).await.map(|s| s.label().to_string()) }
		});

		tokio::task::yield_now().await;
		camera.answer();
		let label = pending.await.unwrap().unwrap();
		assert_eq!(label, "fake-camera-0");
		assert_eq!(camera.requests(), 1);
	}
}
