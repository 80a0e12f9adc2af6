//! # Summary Output
//!
//! Human-readable banner for terminals plus a JSON rendition for CI
//! artifacts and machine consumers.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::testing::RunReport;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write report file `{path}`: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn render_summary(report: &RunReport) -> String {
    let rule = "=".repeat(60);
    let rate = if report.total == 0 {
        0.0
    } else {
        report.passed as f64 / report.total as f64 * 100.0
    };
    let verdict = if report.passed == report.total {
        "🎉 All tests passed! Premium preview feature backend is working correctly."
    } else {
        "⚠️  Some tests failed. Check the details above."
    };

    [
        rule.clone(),
        "📊 TEST SUMMARY".to_string(),
        rule,
        format!("Total Tests: {}", report.total),
        format!("Passed: {}", report.passed),
        format!("Failed: {}", report.failed),
        format!("Success Rate: {rate:.1}%"),
        String::new(),
        verdict.to_string(),
    ]
    .join("\n")
}

pub fn print_summary(report: &RunReport) {
    println!("{}", render_summary(report));
}

pub fn render_json(report: &RunReport) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Writes the JSON report, creating missing parent directories.
pub fn write_report(path: &Path, report: &RunReport) -> Result<(), ReportError> {
    let raw = render_json(report)?;
    let write_err = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, raw).map_err(write_err)?;

    tracing::info!(path = %path.display(), "wrote JSON report");
    Ok(())
}
