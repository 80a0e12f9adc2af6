//! # Check Results & Tally
//!
//! Records the outcome of every executed check in execution order and
//! turns the tally into the summary report handed back to callers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Outcome of one executed check. Never mutated after it is logged.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    #[serde(rename = "test_name")]
    pub name: String,
    pub success: bool,
    pub details: String,
    #[serde(rename = "response_data")]
    pub response_snapshot: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

/// Running tally of executed checks.
#[derive(Debug, Clone, Default)]
pub struct TestLog {
    tests_run: usize,
    tests_passed: usize,
    results: Vec<TestResult>,
    echo: bool,
}

impl TestLog {
    pub fn new(echo: bool) -> Self {
        Self {
            echo,
            ..Default::default()
        }
    }

    /// Record one check outcome and, when echoing, print its status line.
    pub fn log_test(
        &mut self,
        name: &str,
        success: bool,
        details: impl Into<String>,
        response_snapshot: Option<Value>,
    ) {
        self.tests_run += 1;
        if success {
            self.tests_passed += 1;
        }

        let result = TestResult {
            name: name.to_string(),
            success,
            details: details.into(),
            response_snapshot,
            timestamp: Utc::now(),
        };

        if self.echo {
            println!("{}", format_result(&result));
        }
        tracing::debug!(check = name, success, "check finished");

        self.results.push(result);
    }

    pub fn tests_run(&self) -> usize {
        self.tests_run
    }

    pub fn tests_passed(&self) -> usize {
        self.tests_passed
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            total: self.tests_run,
            passed: self.tests_passed,
            failed: self.tests_run - self.tests_passed,
            success_rate: success_rate(self.tests_passed, self.tests_run),
            results: self.results.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Status block printed for each check: the verdict line, then the detail
/// and, for failures, the captured response.
pub fn format_result(result: &TestResult) -> String {
    let status = if result.success { "✅ PASS" } else { "❌ FAIL" };
    let mut lines = vec![format!("{status} - {}", result.name)];

    if !result.details.is_empty() {
        lines.push(format!("    Details: {}", result.details));
    }
    if !result.success {
        if let Some(snapshot) = result.response_snapshot.as_ref().filter(|s| !is_blank(s)) {
            lines.push(format!("    Response: {}", render_snapshot(snapshot)));
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn render_snapshot(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Percentage of passed checks rounded to two decimals; zero when nothing ran.
pub fn success_rate(passed: usize, run: usize) -> f64 {
    if run == 0 {
        return 0.0;
    }
    let rate = passed as f64 / run as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

/// Aggregate report for one harness run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(rename = "total_tests")]
    pub total: usize,
    #[serde(rename = "passed_tests")]
    pub passed: usize,
    #[serde(rename = "failed_tests")]
    pub failed: usize,
    pub success_rate: f64,
    #[serde(rename = "test_results")]
    pub results: Vec<TestResult>,
    pub timestamp: DateTime<Utc>,
}

impl RunReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Process exit status for the run: zero only when nothing failed.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }
}
