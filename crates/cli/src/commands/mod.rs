mod image;
mod live;
mod symbologies;

use serde::Serialize;

use crate::cli::{Cli, Commands};
use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{CommandInputs, DiagnosticLevel, OutputFormat, ResultBuilder, print_error_stderr, print_result};

impl Commands {
	/// Name reported in the result envelope.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Image { .. } => "image",
			Commands::Live { .. } => "live",
			Commands::Symbologies => "symbologies",
		}
	}

	fn inputs(&self) -> CommandInputs {
		match self {
			Commands::Image { file } => CommandInputs {
				image: Some(file.clone()),
				..Default::default()
			},
			Commands::Live { device, timeout } => CommandInputs {
				device: Some(device.clone()),
				timeout_secs: Some(*timeout),
				..Default::default()
			},
			Commands::Symbologies => CommandInputs::default(),
		}
	}
}

/// Runs `cli.command` and prints its result envelope.
///
/// Failures are printed too and then returned so the caller can set the exit status.
pub async fn dispatch(cli: Cli) -> Result<()> {
	let format = cli.format;
	let mut inputs = cli.command.inputs();
	inputs.symbologies = cli.symbologies.clone();

	let ctx = match CommandContext::new(format, cli.config.as_deref(), cli.symbologies) {
		Ok(ctx) => ctx,
		Err(err) => {
			let builder = ResultBuilder::<()>::new(cli.command.name()).inputs(inputs);
			return finish(builder, Err(err), format);
		}
	};

	match cli.command {
		Commands::Image { file } => {
			let builder = ResultBuilder::new("image").inputs(inputs);
			finish(builder, image::execute(&file, &ctx).await, format)
		}
		Commands::Live { device, timeout } => {
			let builder = ResultBuilder::new("live").inputs(inputs);
			finish(builder, live::execute(&device, timeout, &ctx).await, format)
		}
		Commands::Symbologies => {
			let mut builder = ResultBuilder::new("symbologies");
			for note in symbologies::notes(&ctx.config) {
				builder = builder.diagnostic_with_source(DiagnosticLevel::Warning, note, "zbar");
			}
			finish(builder, symbologies::execute(&ctx), format)
		}
	}
}

fn finish<T: Serialize>(builder: ResultBuilder<T>, outcome: Result<T>, format: OutputFormat) -> Result<()> {
	match outcome {
		Ok(data) => {
			print_result(&builder.data(data).build(), format);
			Ok(())
		}
		Err(err) => {
			let builder = match err.details() {
				Some(details) => builder.error_with_details(err.code(), err.to_string(), details),
				None => builder.error(err.code(), err.to_string()),
			};
			let result = builder.build();
			match (format, &result.error) {
				(OutputFormat::Text, Some(error)) => print_error_stderr(error),
				_ => print_result(&result, format),
			}
			Err(err)
		}
	}
}
