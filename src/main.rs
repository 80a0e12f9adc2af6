use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use preview_check::cli::{CliConfig, OutputFormat};
use preview_check::{PreviewHarness, report};

/// Exit status for configuration and I/O errors, distinct from failed checks.
const EXIT_USAGE: u8 = 2;

fn main() -> ExitCode {
    let config = CliConfig::parse();
    init_logging(config.verbose);

    match run(&config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "preview_check=debug" } else { "preview_check=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(config: &CliConfig) -> Result<ExitCode> {
    let mut harness =
        PreviewHarness::new(config.harness_config()).context("invalid harness configuration")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let summary = runtime.block_on(harness.run_all_tests());

    match config.format {
        OutputFormat::Text => report::print_summary(&summary),
        OutputFormat::Json => println!("{}", report::render_json(&summary)?),
    }

    if let Some(path) = &config.report {
        report::write_report(path, &summary)?;
    }

    Ok(ExitCode::from(summary.exit_code() as u8))
}
