//! Barcode acquisition controller.
//!
//! # Session flow
//!
//! ```text
//! Idle ──start_live_scan──▶ RequestingPermission ──granted──▶ LiveScanning
//!  ▲                              │ denied/unavailable           │ detection, stop,
//!  │                              ▼                              │ init failure, drop
//!  └──────────────────────── release ◀───────────────────────────┘
//!  │
//!  └──upload_image──▶ ImageDecoding ──decoded / not found / stop──▶ release
//! ```
//!
//! Every exit runs [`Shared::release`]: stop the live decoder, stop the
//! stream's tracks, detach the surface, then publish `Idle`. Asynchronous
//! continuations carry the [`SessionId`] they were started for and do
//! nothing once that session has ended.

mod events;
mod session;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use barscan_protocol::{DecodeOptions, Detection};
use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc, watch};
use tracing::{debug, info, warn};

pub use self::events::{ScanEvent, ScanEvents};
use self::session::AcquisitionSession;
pub use self::session::{ScanMode, SessionId, StopReason};
use crate::camera::CameraPlatform;
use crate::config::ScanConfig;
use crate::decoder::{DecoderEngine, DetectionSink, LiveRequest};
use crate::error::{Result, ScanError};
use crate::still_image::{self, ImageUpload};
use crate::surface::{DisplaySurface, HeadlessSurface};

/// Builder for [`BarcodeAcquisitionController`].
pub struct ControllerBuilder {
	camera: Arc<dyn CameraPlatform>,
	decoder: Arc<dyn DecoderEngine>,
	surface: Option<Arc<dyn DisplaySurface>>,
	config: ScanConfig,
}

impl ControllerBuilder {
	pub fn new(camera: Arc<dyn CameraPlatform>, decoder: Arc<dyn DecoderEngine>) -> Self {
		Self {
			camera,
			decoder,
			surface: None,
			config: ScanConfig::default(),
		}
	}

	/// Surface the live feed is rendered on. Defaults to [`HeadlessSurface`].
	pub fn surface(mut self, surface: Arc<dyn DisplaySurface>) -> Self {
		self.surface = Some(surface);
		self
	}

	pub fn config(mut self, config: ScanConfig) -> Self {
		self.config = config;
		self
	}

	/// Builds the controller and the receiver for its events.
	pub fn build(self) -> (BarcodeAcquisitionController, ScanEvents) {
		let (events_tx, events_rx) = mpsc::unbounded_channel();
		let (mode_tx, _) = watch::channel(ScanMode::Idle);
		let shared = Arc::new(Shared {
			state: Mutex::new(AcquisitionSession::default()),
			mode_tx,
			events: events_tx,
			surface: self.surface.unwrap_or_else(|| Arc::new(HeadlessSurface::new())),
			next_id: AtomicU64::new(1),
		});

		let controller = BarcodeAcquisitionController {
			shared,
			camera: self.camera,
			decoder: self.decoder,
			config: self.config,
		};
		(controller, events_rx)
	}
}

/// Acquires one barcode at a time from a live camera feed or a still image.
///
/// Dropping the controller releases any active session.
pub struct BarcodeAcquisitionController {
	shared: Arc<Shared>,
	camera: Arc<dyn CameraPlatform>,
	decoder: Arc<dyn DecoderEngine>,
	config: ScanConfig,
}

impl BarcodeAcquisitionController {
	pub fn builder(camera: Arc<dyn CameraPlatform>, decoder: Arc<dyn DecoderEngine>) -> ControllerBuilder {
		ControllerBuilder::new(camera, decoder)
	}

	pub fn config(&self) -> &ScanConfig {
		&self.config
	}

	pub fn mode(&self) -> ScanMode {
		self.shared.state.lock().mode
	}

	/// Watches mode changes. `Idle` is published only after all handles were released.
	pub fn subscribe_mode(&self) -> watch::Receiver<ScanMode> {
		self.shared.mode_tx.subscribe()
	}

	/// Last successfully decoded payload.
	pub fn last_code(&self) -> Option<String> {
		self.shared.state.lock().result_code.clone()
	}

	/// Why the most recent session ended.
	pub fn last_stop(&self) -> Option<StopReason> {
		self.shared.state.lock().last_ended.map(|(_, reason)| reason)
	}

	/// Whether a camera stream is currently held.
	pub fn holds_camera(&self) -> bool {
		self.shared.state.lock().media.is_some()
	}

	/// Starts a live scan.
	///
	/// Resolves once the live decoder is running, or with the error that ended
	/// the session. Rejected with [`ScanError::Busy`] unless the controller is
	/// idle. A session stopped before the decoder came up resolves with
	/// [`ScanError::Cancelled`], or `Ok` if it ended because a code was read.
	pub async fn start_live_scan(&self) -> Result<()> {
		let (id, cancel) = self.shared.begin(ScanMode::RequestingPermission)?;
		let guard = SessionGuard::new(&self.shared, id);
		info!(target: "barscan.controller", session = %id, "requesting camera stream");

		let granted = tokio::select! {
			biased;
			_ = cancel.notified() => return self.shared.interrupted(id),
			granted = self.camera.request_stream(&self.config.constraints) => granted,
		};
		let mut stream = match granted {
			Ok(stream) => stream,
			Err(err) => return self.shared.fail(id, err.into()),
		};

		{
			let mut session = self.shared.state.lock();
			if !session.is_current(id) {
				drop(session);
				stream.stop_tracks();
				debug!(target: "barscan.controller", session = %id, "camera granted after session ended; stream released");
				return self.shared.interrupted(id);
			}
			if let Err(err) = self.shared.surface.attach(&*stream) {
				drop(session);
				stream.stop_tracks();
				return self.shared.fail(id, ScanError::StreamUnavailable(err.to_string()));
			}
			debug!(target: "barscan.controller", session = %id, device = stream.label(), "stream attached");
			session.media = Some(stream);
			self.shared.set_mode(&mut session, ScanMode::LiveScanning);
		}

		let surface = Arc::clone(&self.shared.surface);
		let ready = tokio::select! {
			biased;
			_ = cancel.notified() => return self.shared.interrupted(id),
			ready = tokio::time::timeout(self.config.readiness_timeout(), surface.playing()) => ready.is_ok(),
		};
		if !ready {
			debug!(
				target: "barscan.controller",
				session = %id,
				timeout_ms = self.config.readiness_timeout_ms,
				"surface did not report playback; starting decoder after bounded wait"
			);
		}

		let request = LiveRequest {
			surface,
			constraints: self.config.constraints.clone(),
			symbologies: self.config.symbologies.clone(),
		};
		let started = tokio::select! {
			biased;
			_ = cancel.notified() => return self.shared.interrupted(id),
			started = self.decoder.start_live(request, self.detection_sink(id)) => started,
		};
		let mut live = match started {
			Ok(live) => live,
			Err(err) => return self.shared.fail(id, ScanError::DecoderInitFailed(err.to_string())),
		};

		{
			let mut session = self.shared.state.lock();
			if !(session.is_current(id) && session.mode == ScanMode::LiveScanning) {
				drop(session);
				live.stop();
				debug!(target: "barscan.controller", session = %id, "decoder came up after session ended; stopped");
				return self.shared.interrupted(id);
			}
			session.decoder = Some(live);
		}

		guard.disarm();
		info!(target: "barscan.controller", session = %id, "live scanning");
		Ok(())
	}

	/// Stops the current session, live or still-image. Returns `false` when already idle.
	///
	/// Pending permission requests, readiness waits and decoder initialization
	/// are abandoned; their late results are discarded.
	pub fn stop_scan(&self) -> bool {
		let mut session = self.shared.state.lock();
		if session.mode == ScanMode::Idle {
			return false;
		}
		info!(target: "barscan.controller", session = ?session.id, mode = %session.mode, "stopping scan");
		self.shared.release(&mut session, StopReason::Stopped);
		true
	}

	/// Decodes a single uploaded image.
	///
	/// The camera is never touched. A missing barcode is reported as
	/// [`ScanError::NoCodeFound`] and the controller is ready for another upload.
	pub async fn upload_image(&self, upload: impl Into<ImageUpload>) -> Result<Detection> {
		let upload = upload.into();
		let (id, cancel) = self.shared.begin(ScanMode::ImageDecoding)?;
		let _guard = SessionGuard::new(&self.shared, id);
		info!(target: "barscan.controller", session = %id, image = %upload.name(), "decoding uploaded image");

		let kind = self.config.image_transfer.unwrap_or_else(|| self.decoder.preferred_source());
		let prepared = tokio::select! {
			biased;
			_ = cancel.notified() => return Err(ScanError::Cancelled),
			prepared = still_image::prepare(upload, kind) => prepared,
		};
		let source = match prepared {
			Ok(source) => source,
			Err(err) => return self.shared.fail(id, err),
		};

		let options = DecodeOptions::single_shot(&self.config.symbologies);
		let decoded = tokio::select! {
			biased;
			_ = cancel.notified() => return Err(ScanError::Cancelled),
			decoded = self.decoder.decode_single(source, &options) => decoded,
		};

		match decoded.map(|found| found.and_then(normalize)) {
			Ok(Some(detection)) => {
				if self.shared.acquire(id, ScanMode::ImageDecoding, detection.clone()) {
					Ok(detection)
				} else {
					Err(ScanError::Cancelled)
				}
			}
			Ok(None) => self.shared.fail(id, ScanError::NoCodeFound),
			Err(err) => self.shared.fail(id, ScanError::DecodeFailed(err.to_string())),
		}
	}

	/// Waits until the controller is idle.
	pub async fn wait_idle(&self) {
		let mut modes = self.shared.mode_tx.subscribe();
		let _ = modes.wait_for(|mode| *mode == ScanMode::Idle).await;
	}

	/// Releases any active session. Also runs on drop.
	pub fn teardown(&self) {
		let mut session = self.shared.state.lock();
		if session.mode != ScanMode::Idle {
			info!(target: "barscan.controller", session = ?session.id, mode = %session.mode, "tearing down active session");
			self.shared.release(&mut session, StopReason::TornDown);
		}
	}

	fn detection_sink(&self, id: SessionId) -> DetectionSink {
		let shared = Arc::downgrade(&self.shared);
		DetectionSink::new(move |detection| {
			if let Some(shared) = shared.upgrade() {
				shared.on_detection(id, detection);
			}
		})
	}
}

impl Drop for BarcodeAcquisitionController {
	fn drop(&mut self) {
		self.teardown();
	}
}

impl std::fmt::Debug for BarcodeAcquisitionController {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BarcodeAcquisitionController")
			.field("mode", &self.mode())
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

struct Shared {
	state: Mutex<AcquisitionSession>,
	mode_tx: watch::Sender<ScanMode>,
	events: mpsc::UnboundedSender<ScanEvent>,
	surface: Arc<dyn DisplaySurface>,
	next_id: AtomicU64,
}

impl Shared {
	fn begin(&self, mode: ScanMode) -> Result<(SessionId, Arc<Notify>)> {
		let mut session = self.state.lock();
		if session.mode != ScanMode::Idle {
			debug!(target: "barscan.controller", current = %session.mode, requested = %mode, "rejecting start while busy");
			return Err(ScanError::Busy(session.mode));
		}

		let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
		let cancel = Arc::new(Notify::new());
		session.id = Some(id);
		session.cancel = Some(Arc::clone(&cancel));
		self.set_mode(&mut session, mode);
		Ok((id, cancel))
	}

	fn set_mode(&self, session: &mut AcquisitionSession, mode: ScanMode) {
		session.mode = mode;
		self.mode_tx.send_replace(mode);
	}

	/// Releases every handle of the current session and returns to `Idle`.
	///
	/// Idempotent: handles are taken out of the session before being stopped.
	fn release(&self, session: &mut AcquisitionSession, reason: StopReason) {
		if let Some(mut decoder) = session.decoder.take() {
			decoder.stop();
			debug!(target: "barscan.controller", session = ?session.id, "live decoder stopped");
		}
		if let Some(mut stream) = session.media.take() {
			stream.stop_tracks();
			self.surface.detach();
			debug!(target: "barscan.controller", session = ?session.id, device = stream.label(), "camera released");
		}
		if let Some(cancel) = session.cancel.take() {
			cancel.notify_one();
		}
		if let Some(id) = session.id.take() {
			debug!(target: "barscan.controller", session = %id, ?reason, "session ended");
			session.last_ended = Some((id, reason));
		}
		self.set_mode(session, ScanMode::Idle);
	}

	/// Ends session `id` with a decoded payload. Returns `false` if the session already ended.
	fn acquire(&self, id: SessionId, expected: ScanMode, detection: Detection) -> bool {
		{
			let mut session = self.state.lock();
			if !session.is_current(id) || session.mode != expected {
				debug!(target: "barscan.controller", session = %id, "dropping detection for finished session");
				return false;
			}
			session.result_code = Some(detection.code.clone());
			self.release(&mut session, StopReason::Acquired);
		}

		info!(target: "barscan.controller", session = %id, code = %detection.code, "barcode acquired");
		self.emit(ScanEvent::CodeAcquired(detection));
		true
	}

	/// Ends session `id` with `err` and reports it. Stale sessions resolve as cancelled.
	fn fail<T>(&self, id: SessionId, err: ScanError) -> Result<T> {
		{
			let mut session = self.state.lock();
			if !session.is_current(id) {
				return Err(ScanError::Cancelled);
			}
			self.release(&mut session, StopReason::Failed);
		}

		warn!(target: "barscan.controller", session = %id, error = %err, "scan failed");
		self.emit(ScanEvent::Error(err.clone()));
		Err(err)
	}

	/// Outcome of a start whose session ended while it was suspended.
	fn interrupted(&self, id: SessionId) -> Result<()> {
		match self.state.lock().last_ended {
			Some((ended, StopReason::Acquired)) if ended == id => Ok(()),
			_ => Err(ScanError::Cancelled),
		}
	}

	fn on_detection(&self, id: SessionId, detection: Detection) {
		match normalize(detection) {
			Some(detection) => {
				self.acquire(id, ScanMode::LiveScanning, detection);
			}
			None => debug!(target: "barscan.controller", session = %id, "ignoring empty detection"),
		}
	}

	fn emit(&self, event: ScanEvent) {
		if self.events.send(event).is_err() {
			debug!(target: "barscan.controller", "event receiver dropped");
		}
	}
}

/// Releases the session if the owning future is dropped before it finished.
struct SessionGuard<'a> {
	shared: &'a Shared,
	id: SessionId,
	armed: bool,
}

impl<'a> SessionGuard<'a> {
	fn new(shared: &'a Shared, id: SessionId) -> Self {
		Self { shared, id, armed: true }
	}

	fn disarm(mut self) {
		self.armed = false;
	}
}

impl Drop for SessionGuard<'_> {
	fn drop(&mut self) {
		if !self.armed {
			return;
		}
		let mut session = self.shared.state.lock();
		if session.is_current(self.id) {
			debug!(target: "barscan.controller", session = %self.id, "pending scan dropped; releasing");
			self.shared.release(&mut session, StopReason::Abandoned);
		}
	}
}

fn normalize(detection: Detection) -> Option<Detection> {
	let code = detection.code.trim();
	if code.is_empty() {
		return None;
	}
	Some(Detection {
		code: code.to_string(),
		symbology: detection.symbology,
	})
}
