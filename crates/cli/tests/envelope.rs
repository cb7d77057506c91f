use std::path::Path;
use std::process::Command;

fn barscan(args: &[&str]) -> Command {
	let mut command = Command::new(env!("CARGO_BIN_EXE_barscan"));
	command.args(args).env_remove("RUST_LOG");
	command
}

fn run_barscan(args: &[&str]) -> (bool, serde_json::Value, String) {
	envelope(&mut barscan(args))
}

fn envelope(command: &mut Command) -> (bool, serde_json::Value, String) {
	let output = command.output().expect("failed to run barscan");
	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	let value = serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {stdout}\nstderr: {stderr}"));
	(output.status.success(), value, stderr)
}

fn path_arg(path: &Path) -> &str {
	path.to_str().expect("temp path is valid UTF-8")
}

#[test]
fn symbologies_lists_default_set() {
	let (success, value, stderr) = run_barscan(&["symbologies"]);

	assert!(success, "symbologies failed: {stderr}");
	assert_eq!(value["ok"], true);
	assert_eq!(value["command"], "symbologies");
	let enabled = value["data"]["enabled"].as_array().unwrap();
	assert_eq!(enabled.len(), 9);
	assert_eq!(enabled[0]["name"], "code_128");
	assert_eq!(enabled[0]["zbar"], "CODE-128");
	assert_eq!(value["diagnostics"][0]["level"], "warning");
}

#[test]
fn symbology_flag_narrows_listing() {
	let (success, value, _) = run_barscan(&["--format", "ndjson", "symbologies", "-s", "ean13", "-s", "upc-a"]);

	assert!(success);
	let names: Vec<_> = value["data"]["enabled"].as_array().unwrap().iter().map(|e| e["name"].clone()).collect();
	assert_eq!(names, vec!["ean_13", "upc_a"]);
	assert!(value.get("diagnostics").is_none());
}

#[test]
fn text_file_is_rejected_as_not_an_image() {
	let dir = tempfile::tempdir().unwrap();
	let notes = dir.path().join("notes.txt");
	std::fs::write(&notes, "Serial: CAT001").unwrap();

	let (success, value, _) = run_barscan(&["image", path_arg(&notes)]);

	assert!(!success);
	assert_eq!(value["ok"], false);
	assert_eq!(value["command"], "image");
	assert_eq!(value["error"]["code"], "NOT_AN_IMAGE");
	assert_eq!(value["inputs"]["image"], path_arg(&notes));
}

#[test]
fn missing_image_is_unreadable() {
	let dir = tempfile::tempdir().unwrap();
	let missing = dir.path().join("gone.png");

	let (success, value, _) = run_barscan(&["image", path_arg(&missing)]);

	assert!(!success);
	assert_eq!(value["error"]["code"], "IMAGE_UNREADABLE");
}

#[test]
fn invalid_config_fails_before_running_command() {
	let dir = tempfile::tempdir().unwrap();
	let config = dir.path().join("barscan.json");
	std::fs::write(&config, r#"{"symbologies": []}"#).unwrap();

	let (success, value, _) = run_barscan(&["--config", path_arg(&config), "symbologies"]);

	assert!(!success);
	assert_eq!(value["command"], "symbologies");
	assert_eq!(value["error"]["code"], "CONFIG_ERROR");
	assert!(value["error"]["message"].as_str().unwrap().contains("symbology"));
}

#[test]
fn text_format_reports_errors_on_stderr() {
	let dir = tempfile::tempdir().unwrap();
	let notes = dir.path().join("notes.txt");
	std::fs::write(&notes, "not a photo").unwrap();

	let output = Command::new(env!("CARGO_BIN_EXE_barscan"))
		.args(["-f", "text", "image", path_arg(&notes)])
		.output()
		.expect("failed to run barscan");

	assert!(!output.status.success());
	assert!(output.stdout.is_empty());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("Error [NOT_AN_IMAGE]"), "stderr: {stderr}");
}

#[test]
fn log_events_carry_their_own_targets() {
	let dir = tempfile::tempdir().unwrap();
	let notes = dir.path().join("notes.txt");
	std::fs::write(&notes, "not a photo").unwrap();

	let (success, _, stderr) = envelope(barscan(&["image", path_arg(&notes)]).env("RUST_LOG", "barscan.cli=info"));

	assert!(!success);
	assert!(stderr.contains("decode image"), "stderr: {stderr}");
}

#[cfg(unix)]
mod live {
	use std::os::unix::fs::PermissionsExt;
	use std::path::{Path, PathBuf};

	use super::{barscan, envelope};

	/// Directory holding a `zbarcam` stand-in, to be put in front of `PATH`.
	fn zbarcam_dir(body: &str) -> tempfile::TempDir {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("zbarcam");
		std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
		std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
		dir
	}

	fn search_path(first: &Path) -> String {
		let rest = std::env::var_os("PATH").unwrap_or_default();
		let mut dirs = vec![PathBuf::from(first)];
		dirs.extend(std::env::split_paths(&rest));
		std::env::join_paths(dirs).unwrap().into_string().unwrap()
	}

	#[test]
	fn live_reports_first_code_from_device() {
		let tools = zbarcam_dir("echo 'CODE-128:CAT001'\nexec sleep 30");

		let (success, value, stderr) = envelope(
			barscan(&["live", "--device", "/dev/null", "--timeout", "20"]).env("PATH", search_path(tools.path())),
		);

		assert!(success, "live failed: {stderr}");
		assert_eq!(value["ok"], true);
		assert_eq!(value["command"], "live");
		assert_eq!(value["inputs"]["device"], "/dev/null");
		assert_eq!(value["data"]["code"], "CAT001");
		assert_eq!(value["data"]["symbology"], "code_128");
		assert_eq!(value["data"]["source"], "camera");
		assert_eq!(value["data"]["stopReason"], "acquired");
	}

	#[test]
	fn live_times_out_without_a_code() {
		let tools = zbarcam_dir("exec sleep 30");

		let (success, value, _) =
			envelope(barscan(&["live", "--device", "/dev/null", "--timeout", "1"]).env("PATH", search_path(tools.path())));

		assert!(!success);
		assert_eq!(value["ok"], false);
		assert_eq!(value["error"]["code"], "TIMEOUT");
		assert_eq!(value["error"]["details"]["timeoutSecs"], 1);
		assert_eq!(value["inputs"]["timeoutSecs"], 1);
	}

	#[test]
	fn live_reports_decoder_that_cannot_start() {
		let tools = zbarcam_dir("echo 'ERROR: no video' >&2\nexit 1");

		let (success, value, _) =
			envelope(barscan(&["live", "--device", "/dev/null", "--timeout", "5"]).env("PATH", search_path(tools.path())));

		assert!(!success);
		assert_eq!(value["error"]["code"], "DECODER_INIT_FAILED");
	}

	#[test]
	fn live_reports_missing_device() {
		let dir = tempfile::tempdir().unwrap();
		let device = dir.path().join("video9");

		let (success, value, _) = envelope(&mut barscan(&["live", "--device", device.to_str().unwrap(), "--timeout", "1"]));

		assert!(!success);
		assert_eq!(value["error"]["code"], "STREAM_UNAVAILABLE");
	}
}
