//! Decoder engine backed by the zbar command-line tools.
//!
//! Still images go through `zbarimg` on a temporary PNG. Live scanning runs
//! `zbarcam` against the device the surface shows and turns each output line
//! into a detection. Both tools print one `TYPE:payload` line per symbol.

use std::io::Cursor;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use barscan::protocol::{DecodeOptions, Detection, ImageSource, RawImage, SourceKind, Symbology, decode_data_url};
use barscan::{DecoderEngine, DecoderError, DetectionSink, LiveDecoder, LiveRequest};
use image::{ImageFormat, RgbaImage};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long `zbarcam` must stay up before its start counts as successful.
const INIT_GRACE: Duration = Duration::from_millis(300);

/// `zbarimg` exit status when the image held no symbol.
const EXIT_NO_SYMBOL: i32 = 4;

/// Configuration name of `symbology` for `-S<name>.enable`.
pub fn zbar_config_name(symbology: Symbology) -> &'static str {
	match symbology {
		Symbology::Code128 => "code128",
		Symbology::Ean13 => "ean13",
		Symbology::Ean8 => "ean8",
		Symbology::Code39 | Symbology::Code39Vin => "code39",
		Symbology::Codabar => "codabar",
		Symbology::UpcA => "upca",
		Symbology::UpcE => "upce",
		Symbology::Interleaved2of5 => "i25",
	}
}

/// Symbol type name zbar prints in front of a payload.
pub fn zbar_type_name(symbology: Symbology) -> &'static str {
	match symbology {
		Symbology::Code128 => "CODE-128",
		Symbology::Ean13 => "EAN-13",
		Symbology::Ean8 => "EAN-8",
		Symbology::Code39 | Symbology::Code39Vin => "CODE-39",
		Symbology::Codabar => "CODABAR",
		Symbology::UpcA => "UPC-A",
		Symbology::UpcE => "UPC-E",
		Symbology::Interleaved2of5 => "I2/5",
	}
}

/// `-S` arguments enabling exactly `symbologies`.
pub fn symbology_args(symbologies: &[Symbology]) -> Vec<String> {
	let mut args = vec!["-Sdisable".to_string()];
	for symbology in symbologies {
		let arg = format!("-S{}.enable", zbar_config_name(*symbology));
		if !args.contains(&arg) {
			args.push(arg);
		}
	}
	args
}

/// Parses one `TYPE:payload` output line.
pub fn parse_symbol_line(line: &str) -> Option<Detection> {
	let (kind, payload) = line.trim_end_matches(['\r', '\n']).split_once(':')?;
	let detection = Detection::new(payload);
	match Symbology::DEFAULT_SET.into_iter().find(|s| zbar_type_name(*s) == kind) {
		Some(symbology) => Some(detection.with_symbology(symbology)),
		None => Some(detection),
	}
}

/// Process-backed [`DecoderEngine`].
#[derive(Debug, Clone, Default)]
pub struct ZbarEngine {
	zbarimg: Option<PathBuf>,
	zbarcam: Option<PathBuf>,
}

impl ZbarEngine {
	/// Engine that locates the tools on `PATH` when first used.
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_zbarimg(mut self, path: impl Into<PathBuf>) -> Self {
		self.zbarimg = Some(path.into());
		self
	}

	pub fn with_zbarcam(mut self, path: impl Into<PathBuf>) -> Self {
		self.zbarcam = Some(path.into());
		self
	}

	fn tool(configured: &Option<PathBuf>, name: &str) -> Result<PathBuf, String> {
		match configured {
			Some(path) => Ok(path.clone()),
			None => which::which(name).map_err(|e| format!("{name} not found on PATH: {e}")),
		}
	}
}

#[async_trait]
impl DecoderEngine for ZbarEngine {
	async fn start_live(&self, request: LiveRequest, sink: DetectionSink) -> Result<Box<dyn LiveDecoder>, DecoderError> {
		let zbarcam = Self::tool(&self.zbarcam, "zbarcam").map_err(DecoderError::Init)?;
		let device = request
			.surface
			.source()
			.ok_or_else(|| DecoderError::Init("no stream attached to the surface".into()))?;

		info!(target: "barscan.zbar", %device, tool = %zbarcam.display(), "starting zbarcam");
		let mut child = Command::new(&zbarcam)
			.arg("--nodisplay")
			.arg(format!("--prescale={}x{}", request.constraints.width, request.constraints.height))
			.args(symbology_args(&request.symbologies))
			.arg(&device)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| DecoderError::Init(format!("failed to spawn {}: {e}", zbarcam.display())))?;

		let stdout = child
			.stdout
			.take()
			.ok_or_else(|| DecoderError::Init("zbarcam stdout unavailable".into()))?;

		// zbarcam exits right away when it cannot open or stream the device
		if let Ok(waited) = tokio::time::timeout(INIT_GRACE, child.wait()).await {
			let status = waited.map_err(|e| DecoderError::Init(e.to_string()))?;
			let mut stderr = String::new();
			if let Some(mut pipe) = child.stderr.take() {
				let _ = pipe.read_to_string(&mut stderr).await;
			}
			return Err(DecoderError::Init(format!("zbarcam exited with {status}: {}", stderr.trim())));
		}

		// zbarcam blocks once its stderr pipe is full
		let diagnostics = child.stderr.take().map(|stderr| {
			tokio::spawn(async move {
				let mut lines = BufReader::new(stderr).lines();
				while let Ok(Some(line)) = lines.next_line().await {
					debug!(target: "barscan.zbar", %line, "zbarcam stderr");
				}
			})
		});

		let reader = tokio::spawn(async move {
			let mut lines = BufReader::new(stdout).lines();
			loop {
				match lines.next_line().await {
					Ok(Some(line)) => match parse_symbol_line(&line) {
						Some(detection) => sink.deliver(detection),
						None => debug!(target: "barscan.zbar", %line, "ignoring zbarcam output"),
					},
					Ok(None) => {
						warn!(target: "barscan.zbar", %device, "zbarcam exited; no further detections from this session");
						break;
					}
					Err(err) => {
						warn!(target: "barscan.zbar", error = %err, "reading zbarcam output failed");
						break;
					}
				}
			}
		});

		Ok(Box::new(ZbarLive {
			child,
			reader,
			diagnostics,
		}))
	}

	async fn decode_single(&self, source: ImageSource, options: &DecodeOptions) -> Result<Option<Detection>, DecoderError> {
		let zbarimg = Self::tool(&self.zbarimg, "zbarimg").map_err(DecoderError::Engine)?;
		let png = match source {
			ImageSource::Raw(raw) => encode_png(raw)?,
			ImageSource::DataUrl(url) => decode_data_url(&url)
				.map(|(_, bytes)| bytes)
				.ok_or_else(|| DecoderError::Engine("malformed image data url".into()))?,
		};

		let file = tempfile::Builder::new().prefix("barscan-").suffix(".png").tempfile()?;
		tokio::fs::write(file.path(), &png).await?;

		debug!(target: "barscan.zbar", tool = %zbarimg.display(), symbologies = ?options.symbologies, "running zbarimg");
		let output = Command::new(&zbarimg)
			.arg("--quiet")
			.args(symbology_args(&options.symbologies))
			.arg(file.path())
			.stdin(Stdio::null())
			.kill_on_drop(true)
			.output()
			.await?;

		match output.status.code() {
			Some(0) => {
				let stdout = String::from_utf8_lossy(&output.stdout);
				Ok(stdout.lines().find_map(parse_symbol_line))
			}
			Some(EXIT_NO_SYMBOL) => Ok(None),
			_ => {
				let stderr = String::from_utf8_lossy(&output.stderr);
				Err(DecoderError::Engine(format!("zbarimg failed ({}): {}", output.status, stderr.trim())))
			}
		}
	}

	fn preferred_source(&self) -> SourceKind {
		SourceKind::DataUrl
	}
}

fn encode_png(raw: RawImage) -> Result<Vec<u8>, DecoderError> {
	let canvas = RgbaImage::from_raw(raw.width, raw.height, raw.rgba)
		.ok_or_else(|| DecoderError::Engine("raw buffer does not match its dimensions".into()))?;
	let mut png = Cursor::new(Vec::new());
	canvas
		.write_to(&mut png, ImageFormat::Png)
		.map_err(|e| DecoderError::Engine(e.to_string()))?;
	Ok(png.into_inner())
}

/// A running `zbarcam` process and the task reading its output.
struct ZbarLive {
	child: Child,
	reader: JoinHandle<()>,
	diagnostics: Option<JoinHandle<()>>,
}

impl LiveDecoder for ZbarLive {
	fn stop(&mut self) {
		self.reader.abort();
		if let Some(diagnostics) = &self.diagnostics {
			diagnostics.abort();
		}
		if let Err(err) = self.child.start_kill() {
			debug!(target: "barscan.zbar", error = %err, "zbarcam already exited");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn args_disable_everything_then_enable_selection() {
		let args = symbology_args(&[Symbology::Code128, Symbology::Code39, Symbology::Code39Vin, Symbology::Interleaved2of5]);
		assert_eq!(args, vec!["-Sdisable", "-Scode128.enable", "-Scode39.enable", "-Si25.enable"]);
	}

	#[test]
	fn default_set_maps_to_eight_zbar_options() {
		let args = symbology_args(&Symbology::DEFAULT_SET);
		assert_eq!(args.len(), 1 + 8);
	}

	#[test]
	fn parses_typed_lines() {
		let detection = parse_symbol_line("CODE-128:CAT001\n").unwrap();
		assert_eq!(detection.code, "CAT001");
		assert_eq!(detection.symbology, Some(Symbology::Code128));

		let detection = parse_symbol_line("I2/5:0123456789").unwrap();
		assert_eq!(detection.symbology, Some(Symbology::Interleaved2of5));

		let detection = parse_symbol_line("CODE-39:1M8GDM9AXKP042788").unwrap();
		assert_eq!(detection.symbology, Some(Symbology::Code39));
	}

	#[test]
	fn payload_may_contain_colons() {
		let detection = parse_symbol_line("CODE-128:SN:42:A").unwrap();
		assert_eq!(detection.code, "SN:42:A");
	}

	#[test]
	fn unknown_type_keeps_payload() {
		let detection = parse_symbol_line("QR-Code:https://example.com").unwrap();
		assert_eq!(detection.code, "https://example.com");
		assert!(detection.symbology.is_none());
		assert!(parse_symbol_line("scanned 1 barcode symbols").is_none());
	}

	#[test]
	fn raw_source_is_encoded_as_png() {
		let png = encode_png(RawImage {
			width: 2,
			height: 2,
			rgba: vec![255; 16],
		})
		.unwrap();
		assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
		assert!(
			encode_png(RawImage {
				width: 4,
				height: 4,
				rgba: vec![0; 3],
			})
			.is_err()
		);
	}
}
