use std::path::PathBuf;

use barscan::Symbology;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Default V4L2 capture device for `live`.
pub const DEFAULT_DEVICE: &str = "/dev/video0";

#[derive(Parser, Debug)]
#[command(name = "barscan")]
#[command(about = "Read a barcode from a camera feed or an image file")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
	pub format: OutputFormat,

	/// Load scan settings from a JSON file
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Restrict recognition to these symbologies (repeatable)
	#[arg(short = 's', long = "symbology", global = true, value_name = "NAME")]
	pub symbologies: Vec<Symbology>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Decode a single image file
	#[command(alias = "img")]
	Image {
		/// Photo of the label
		file: PathBuf,
	},

	/// Scan from a camera until a code is read
	Live {
		/// Capture device
		#[arg(short, long, default_value = DEFAULT_DEVICE)]
		device: PathBuf,

		/// Give up after this many seconds (0 waits until interrupted)
		#[arg(short, long, default_value = "60")]
		timeout: u64,
	},

	/// List the enabled symbologies
	#[command(alias = "sym")]
	Symbologies,
}
