mod cli;
mod config;
mod error;

use crate::{
    cli::Args,
    error::{AppError, Result, single_line},
};
use clap::Parser;
use finisher_engine::{
    CancellationToken, FfmpegTool, FinishingPipeline, PipelineOutcome, PipelineRequest,
};
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => {
            // --help / --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            let rendered = e.to_string();
            let summary = rendered
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ")
                .to_string();
            return report(Err(AppError::Arguments(summary)));
        }
    };

    // Load environment variables
    dotenvy::dotenv().ok();
    init_logging(args.verbose, args.quiet);

    report(run(args).await)
}

async fn run(args: Args) -> Result<PipelineOutcome> {
    let config = config::load_config(args.config.as_deref())?;
    let config = config::apply_args(config, &args)?;

    let request = PipelineRequest::builder(args.input_dir, args.output_path)
        .audio(args.add_audio)
        .effects(args.add_effects)
        .resolution(args.resolution)
        .build()?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            signal_token.cancel();
        }
    });

    let pipeline = FinishingPipeline::new(FfmpegTool::from_config(&config), config);
    let outcome = pipeline.run(&request, &cancel).await?;

    info!(
        video = %outcome.video.display(),
        thumbnail = %outcome.thumbnail.display(),
        metadata = %outcome.metadata.display(),
        chunks = outcome.chunk_count,
        "Done"
    );
    Ok(outcome)
}

/// Print the completion line a supervising process parses and pick the exit code.
fn report(result: Result<PipelineOutcome>) -> ExitCode {
    if let Err(e) = &result {
        error!("Chunk management failed: {}", e);
    }
    let (line, code) = completion(&result);
    println!("{line}");
    ExitCode::from(code)
}

/// The stdout completion line and exit status for a finished run.
fn completion(result: &Result<PipelineOutcome>) -> (String, u8) {
    match result {
        Ok(outcome) => (
            format!(
                "SUCCESS: Video processing completed at {}",
                outcome.video.display()
            ),
            0,
        ),
        Err(e) => (format!("ERROR: {}", single_line(&e.to_string())), 1),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str()))
    };

    // stdout is reserved for the completion line.
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose),
        )
        .init();
}
