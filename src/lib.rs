//! Black-box checks for the premium preview feature of the instrumentals
//! API: preview window bounds, premium flags and play-count increments.

pub mod catalog;
pub mod cli;
pub mod harness;
pub mod http;
pub mod report;
pub mod testing;

pub use harness::{HarnessConfig, PreviewHarness};
pub use testing::{RunReport, TestResult};
