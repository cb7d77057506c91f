use barscan_cli::{cli::Cli, commands, logging};
use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli).await {
		debug!(target: "barscan.cli", error = %err, code = %err.code(), "command failed");
		std::process::exit(1);
	}
}
