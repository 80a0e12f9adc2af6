//! # Command-Line Interface
//!
//! Flags for pointing the harness at an API and choosing how results are
//! reported in CI pipelines.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::harness::{DEFAULT_BASE_URL, DEFAULT_REFERENCE_TITLE, HarnessConfig};

/// Output format for the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "preview-check",
    version,
    about = "Check the premium preview feature of the instrumentals API"
)]
pub struct CliConfig {
    /// Base URL of the API under test
    #[arg(long, env = "PREVIEW_CHECK_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Title of the premium track used for the deep checks
    #[arg(long, value_name = "TITLE", default_value = DEFAULT_REFERENCE_TITLE)]
    pub track_title: String,

    /// Summary format written to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also write the JSON summary to this file
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliConfig {
    pub fn harness_config(&self) -> HarnessConfig {
        HarnessConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout),
            reference_title: self.track_title.clone(),
            echo: self.format == OutputFormat::Text,
        }
    }
}
