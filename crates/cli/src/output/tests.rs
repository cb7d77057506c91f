use barscan::{Detection, Symbology};
use serde_json::json;

use super::*;

#[test]
fn success_envelope_serializes_camel_case() {
	let result = ResultBuilder::new("image")
		.inputs(CommandInputs {
			image: Some("plate.png".into()),
			..Default::default()
		})
		.data(ScanData::new(Detection::new("CAT001").with_symbology(Symbology::Code128), ScanSource::Image))
		.build();

	let value = serde_json::to_value(&result).unwrap();
	assert_eq!(value["schemaVersion"], SCHEMA_VERSION);
	assert_eq!(value["ok"], true);
	assert_eq!(value["command"], "image");
	assert_eq!(value["inputs"], json!({ "image": "plate.png" }));
	assert_eq!(value["data"], json!({ "code": "CAT001", "symbology": "code_128", "source": "image" }));
	assert!(value["durationMs"].is_u64());
	assert!(value.get("error").is_none());
	assert!(value.get("diagnostics").is_none());
}

#[test]
fn error_envelope_is_not_ok() {
	let result: CommandResult<ScanData> = ResultBuilder::new("image").error(ErrorCode::NoCodeFound, "no barcode found in image").build();

	assert!(!result.ok);
	let value = serde_json::to_value(&result).unwrap();
	assert_eq!(value["error"]["code"], "NO_CODE_FOUND");
	assert!(value.get("data").is_none());
}

#[test]
fn builder_without_data_is_not_ok() {
	let result: CommandResult<ScanData> = ResultBuilder::new("live").build();
	assert!(!result.ok);
	assert!(result.duration_ms.is_some());
}

#[test]
fn error_code_display_matches_serde() {
	for code in [ErrorCode::PermissionDenied, ErrorCode::DecoderInitFailed, ErrorCode::NotAnImage, ErrorCode::Timeout] {
		let serialized = serde_json::to_value(code).unwrap();
		assert_eq!(serialized, code.to_string());
	}
}

#[test]
fn text_rendering_lists_fields_and_diagnostics() {
	let result = ResultBuilder::new("live")
		.data(ScanData::new(Detection::new("CAT001"), ScanSource::Camera))
		.diagnostic_with_source(DiagnosticLevel::Info, "stopped after first read", "controller")
		.build();

	let text = render_text(&result);
	assert!(text.contains("code: CAT001"));
	assert!(text.contains("source: camera"));
	assert!(text.contains("[info:controller] stopped after first read"));
	assert!(text.lines().last().unwrap().starts_with("Completed in "));
}

#[test]
fn text_rendering_shows_error_code() {
	let result: CommandResult<ScanData> = ResultBuilder::new("image")
		.error_with_details(ErrorCode::NotAnImage, "not an image file: notes.txt", json!({ "file": "notes.txt" }))
		.build();

	let text = render_text(&result);
	assert!(text.starts_with("Error [NOT_AN_IMAGE]: not an image file: notes.txt"));
	assert!(text.contains("\"file\": \"notes.txt\""));
}

#[test]
fn format_parses_case_insensitively() {
	assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
	assert_eq!("ndjson".parse::<OutputFormat>().unwrap(), OutputFormat::Ndjson);
	assert!("toml".parse::<OutputFormat>().is_err());
	assert_eq!(OutputFormat::Text.to_string(), "text");
}
