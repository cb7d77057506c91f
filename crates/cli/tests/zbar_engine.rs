//! ZbarEngine against stand-in tool scripts.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use barscan::fake::{FakeCamera, FakeSurface, paint_strip_code};
use barscan::protocol::{DecodeOptions, Detection, ImageSource, RawImage};
use barscan::{BarcodeAcquisitionController, DecoderEngine, DetectionSink, HeadlessSurface, LiveRequest, MediaConstraints, MediaStream, ScanConfig, ScanError, Symbology};
use barscan_cli::engine::ZbarEngine;
use tokio::sync::mpsc;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
	let path = dir.join(name);
	std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
	std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
	path
}

fn tiny_raw() -> ImageSource {
	ImageSource::Raw(RawImage {
		width: 2,
		height: 2,
		rgba: vec![255; 16],
	})
}

struct DeviceStub;

impl MediaStream for DeviceStub {
	fn label(&self) -> &str {
		"/dev/video7"
	}

	fn stop_tracks(&mut self) {}

	fn is_live(&self) -> bool {
		true
	}
}

fn live_request() -> LiveRequest {
	let surface = Arc::new(HeadlessSurface::new());
	barscan::DisplaySurface::attach(surface.as_ref(), &DeviceStub).unwrap();
	LiveRequest {
		surface,
		constraints: MediaConstraints::default(),
		symbologies: vec![Symbology::Ean13],
	}
}

#[tokio::test]
async fn zbarimg_output_becomes_detection() {
	let dir = tempfile::tempdir().unwrap();
	let args_log = dir.path().join("args");
	let tool = script(
		dir.path(),
		"zbarimg",
		&format!("echo \"$@\" > {}\necho 'CODE-128:CAT001'", args_log.display()),
	);
	let engine = ZbarEngine::new().with_zbarimg(&tool);

	let options = DecodeOptions::single_shot(&[Symbology::Code128, Symbology::Ean8]);
	let found = engine.decode_single(tiny_raw(), &options).await.unwrap();
	assert_eq!(found, Some(Detection::new("CAT001").with_symbology(Symbology::Code128)));

	let args = std::fs::read_to_string(&args_log).unwrap();
	assert!(args.starts_with("--quiet -Sdisable -Scode128.enable -Sean8.enable "), "args: {args}");
	assert!(args.trim_end().ends_with(".png"));
}

#[tokio::test]
async fn zbarimg_exit_four_is_not_found() {
	let dir = tempfile::tempdir().unwrap();
	let tool = script(dir.path(), "zbarimg", "exit 4");
	let engine = ZbarEngine::new().with_zbarimg(&tool);

	let found = engine.decode_single(tiny_raw(), &DecodeOptions::single_shot(&Symbology::DEFAULT_SET)).await.unwrap();
	assert!(found.is_none());
}

#[tokio::test]
async fn zbarimg_failure_is_engine_error() {
	let dir = tempfile::tempdir().unwrap();
	let tool = script(dir.path(), "zbarimg", "echo 'unable to load image' >&2\nexit 2");
	let engine = ZbarEngine::new().with_zbarimg(&tool);

	let err = engine.decode_single(tiny_raw(), &DecodeOptions::single_shot(&Symbology::DEFAULT_SET)).await.unwrap_err();
	assert!(err.to_string().contains("unable to load image"));
}

#[tokio::test]
async fn controller_reads_photo_through_zbarimg() {
	let dir = tempfile::tempdir().unwrap();
	let tool = script(dir.path(), "zbarimg", "echo 'EAN-13:4006381333931'");
	let photo = dir.path().join("plate.png");
	paint_strip_code("ignored", 32, 8).save(&photo).unwrap();

	let (controller, mut events) =
		BarcodeAcquisitionController::builder(Arc::new(FakeCamera::granting()), Arc::new(ZbarEngine::new().with_zbarimg(&tool)))
			.surface(Arc::new(FakeSurface::signalling()))
			.config(ScanConfig::default())
			.build();

	let detection = controller.upload_image(photo.as_path()).await.unwrap();
	assert_eq!(detection.code, "4006381333931");
	assert_eq!(detection.symbology, Some(Symbology::Ean13));
	assert_eq!(events.recv().await.unwrap().code(), Some("4006381333931"));
}

#[tokio::test]
async fn controller_reports_missing_code() {
	let dir = tempfile::tempdir().unwrap();
	let tool = script(dir.path(), "zbarimg", "exit 4");
	let photo = dir.path().join("blank.png");
	paint_strip_code("", 16, 16).save(&photo).unwrap();

	let (controller, _events) =
		BarcodeAcquisitionController::builder(Arc::new(FakeCamera::granting()), Arc::new(ZbarEngine::new().with_zbarimg(&tool))).build();

	assert_eq!(controller.upload_image(photo.as_path()).await.unwrap_err(), ScanError::NoCodeFound);
}

#[tokio::test]
async fn zbarcam_lines_reach_the_sink() {
	let dir = tempfile::tempdir().unwrap();
	let args_log = dir.path().join("args");
	let tool = script(
		dir.path(),
		"zbarcam",
		&format!("echo \"$@\" > {}\necho 'EAN-13:4006381333931'\nexec sleep 30", args_log.display()),
	);
	let engine = ZbarEngine::new().with_zbarcam(&tool);

	let (tx, mut rx) = mpsc::unbounded_channel();
	let sink = DetectionSink::new(move |detection| {
		let _ = tx.send(detection);
	});
	let mut live = engine.start_live(live_request(), sink).await.unwrap();

	let detection = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
	assert_eq!(detection.code, "4006381333931");
	assert_eq!(detection.symbology, Some(Symbology::Ean13));

	let args = std::fs::read_to_string(&args_log).unwrap();
	assert_eq!(args.trim_end(), "--nodisplay --prescale=640x480 -Sdisable -Sean13.enable /dev/video7");

	live.stop();
	live.stop();
}

#[tokio::test]
async fn zbarcam_early_exit_is_init_failure() {
	let dir = tempfile::tempdir().unwrap();
	let tool = script(dir.path(), "zbarcam", "echo 'ERROR: opening video device' >&2\nexit 1");
	let engine = ZbarEngine::new().with_zbarcam(&tool);

	let err = engine.start_live(live_request(), DetectionSink::new(|_| {})).await.err().unwrap();
	assert!(matches!(&err, barscan::DecoderError::Init(msg) if msg.contains("opening video device")), "{err}");
}

#[tokio::test]
async fn chatty_zbarcam_keeps_reporting() {
	let dir = tempfile::tempdir().unwrap();
	let tool = script(
		dir.path(),
		"zbarcam",
		"head -c 200000 /dev/zero >&2\necho 'EAN-13:4006381333931'\nexec sleep 30",
	);
	let engine = ZbarEngine::new().with_zbarcam(&tool);

	let (tx, mut rx) = mpsc::unbounded_channel();
	let sink = DetectionSink::new(move |detection| {
		let _ = tx.send(detection);
	});
	let mut live = engine.start_live(live_request(), sink).await.unwrap();

	let detection = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
	assert_eq!(detection.code, "4006381333931");
	live.stop();
}
