//! # Premium Preview Harness
//!
//! Drives the fixed sequence of checks against the instrumentals API:
//! connectivity, premium listing, reference track, featured listing,
//! catalog-wide preview sweep and play-count increment. Checks run one
//! after another; a failing check is recorded and the run moves on, except
//! for the connectivity check which ends the run early.

use std::time::Duration;

use serde_json::{Value, json};
use tracing::{info, warn};

use crate::catalog::{self, PreviewTally};
use crate::http::{ApiClient, DEFAULT_TIMEOUT, HttpError, HttpResponse};
use crate::testing::{RunReport, TestLog};

pub const DEFAULT_BASE_URL: &str = "https://simple-tone-db.preview.emergentagent.com";
pub const DEFAULT_REFERENCE_TITLE: &str = "Nasheed of Dawn";

const CHECK_CONNECTION: &str = "API Connection";
const CHECK_PREMIUM_LIST: &str = "GET Premium Tracks - Preview Times";
const CHECK_REFERENCE: &str = "Nasheed of Dawn - Preview Settings";
const CHECK_FEATURED: &str = "GET Featured - Premium with Preview";
const CHECK_SWEEP: &str = "Preview Time Validation";
const CHECK_PLAY_COUNT: &str = "Play Count Increment";

const HEALTH_PATH: &str = "/api/";
const TRACKS_PATH: &str = "/api/instrumentals";
const FEATURED_PATH: &str = "/api/instrumentals/featured";

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Title of the track remembered from the premium listing.
    pub reference_title: String,
    /// Print a status block per check as it completes.
    pub echo: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            reference_title: DEFAULT_REFERENCE_TITLE.to_string(),
            echo: true,
        }
    }
}

/// Harness state for a single run. Build a fresh one per run.
#[derive(Debug)]
pub struct PreviewHarness {
    client: ApiClient,
    reference_title: String,
    echo: bool,
    log: TestLog,
    reference_track: Option<Value>,
}

impl PreviewHarness {
    pub fn new(config: HarnessConfig) -> Result<Self, HttpError> {
        let client = ApiClient::new(&config.base_url, config.timeout)?;
        Ok(Self {
            client,
            reference_title: config.reference_title,
            echo: config.echo,
            log: TestLog::new(config.echo),
            reference_track: None,
        })
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn log(&self) -> &TestLog {
        &self.log
    }

    /// Record remembered from the premium listing, if one matched.
    pub fn reference_track(&self) -> Option<&Value> {
        self.reference_track.as_ref()
    }

    /// Run every check in order and return the summary. A failed
    /// connectivity check stops the run with only that result recorded.
    pub async fn run_all_tests(&mut self) -> RunReport {
        info!(base_url = self.base_url(), "starting premium preview checks");
        if self.echo {
            println!("🎵 Starting Premium Preview Feature Backend API Tests");
            println!("{}", "=".repeat(60));
            println!();
        }

        if !self.check_connection().await {
            warn!(base_url = self.base_url(), "API unreachable, skipping remaining checks");
            if self.echo {
                println!("❌ API connection failed. Stopping tests.");
            }
            return self.log.report();
        }

        self.check_premium_listing().await;
        self.check_reference_track();
        self.check_featured_listing().await;
        self.check_preview_windows().await;
        self.check_play_count().await;

        let report = self.log.report();
        info!(
            total = report.total,
            passed = report.passed,
            failed = report.failed,
            "premium preview checks finished"
        );
        report
    }

    pub async fn check_connection(&mut self) -> bool {
        let response = match self.client.get(HEALTH_PATH, &[]).await {
            Ok(response) => response,
            Err(err) => {
                self.fail(CHECK_CONNECTION, format!("Connection error: {err}"), None);
                return false;
            }
        };

        if !response.is_ok() {
            self.fail_status(CHECK_CONNECTION, &response);
            return false;
        }

        match response.json() {
            Ok(data) => {
                let message = data.get("message").and_then(Value::as_str).unwrap_or("Unknown");
                self.pass(CHECK_CONNECTION, format!("API is accessible - {message}"), None);
                true
            }
            Err(err) => {
                self.fail(CHECK_CONNECTION, format!("Connection error: {err}"), None);
                false
            }
        }
    }

    /// Premium listing: counts premium tracks exposing a preview window and
    /// remembers the first one carrying the reference title.
    pub async fn check_premium_listing(&mut self) -> bool {
        let tracks = match self
            .fetch_list(
                CHECK_PREMIUM_LIST,
                TRACKS_PATH,
                &[("is_premium", "true")],
                "No premium tracks found",
            )
            .await
        {
            Some(tracks) => tracks,
            None => return false,
        };

        let mut with_preview = 0;
        for track in &tracks {
            if !catalog::is_premium(track) || !catalog::has_preview_window(track) {
                continue;
            }
            with_preview += 1;
            if self.reference_track.is_none() && catalog::title(track) == self.reference_title {
                self.reference_track = Some(track.clone());
            }
        }

        let total = tracks.len();
        self.pass(
            CHECK_PREMIUM_LIST,
            format!("Found {total} premium tracks, {with_preview} have preview times"),
            Some(json!({
                "total_premium_tracks": total,
                "tracks_with_preview": with_preview,
                "nasheed_found": self.reference_track.is_some(),
            })),
        );
        true
    }

    /// Deep validation of the remembered track. Makes no request.
    pub fn check_reference_track(&mut self) -> bool {
        let Some(track) = self.reference_track.clone() else {
            self.fail(
                CHECK_REFERENCE,
                format!("{} track not found", self.reference_title),
                None,
            );
            return false;
        };

        match catalog::inspect_reference_track(&track) {
            Ok(window) => {
                self.pass(
                    CHECK_REFERENCE,
                    format!(
                        "Valid preview settings: {}s to {}s ({}s duration)",
                        window.start,
                        window.end,
                        window.duration()
                    ),
                    Some(json!({
                        "track_id": track.get("id"),
                        "title": track.get("title"),
                        "preview_start": window.start,
                        "preview_end": window.end,
                        "preview_duration": window.duration(),
                        "is_premium": true,
                    })),
                );
                true
            }
            Err(problems) => {
                self.fail(CHECK_REFERENCE, problems.join("; "), Some(track));
                false
            }
        }
    }

    pub async fn check_featured_listing(&mut self) -> bool {
        let tracks = match self
            .fetch_list(CHECK_FEATURED, FEATURED_PATH, &[], "No featured tracks found")
            .await
        {
            Some(tracks) => tracks,
            None => return false,
        };

        let PreviewTally {
            total,
            premium,
            with_preview,
        } = catalog::tally(&tracks);
        self.pass(
            CHECK_FEATURED,
            format!(
                "Found {total} featured tracks, {premium} premium, {with_preview} with preview settings"
            ),
            Some(json!({
                "total_featured": total,
                "featured_premium": premium,
                "featured_with_preview": with_preview,
            })),
        );
        true
    }

    /// Sweeps the whole catalog and validates every premium preview window.
    pub async fn check_preview_windows(&mut self) -> bool {
        let response = match self.client.get(TRACKS_PATH, &[]).await {
            Ok(response) => response,
            Err(err) => {
                self.fail(CHECK_SWEEP, format!("Request error: {err}"), None);
                return false;
            }
        };

        if !response.is_ok() {
            self.fail_status(CHECK_SWEEP, &response);
            return false;
        }

        let tracks = match response.json() {
            Ok(Value::Array(tracks)) => tracks,
            Ok(other) => {
                self.fail(CHECK_SWEEP, "Invalid response format", Some(other));
                return false;
            }
            Err(err) => {
                self.fail(CHECK_SWEEP, format!("Request error: {err}"), None);
                return false;
            }
        };

        let mut valid = 0;
        let mut invalid = Vec::new();
        for track in tracks
            .iter()
            .filter(|track| catalog::is_premium(track) && catalog::has_preview_window(track))
        {
            match catalog::validate_preview_window(track) {
                Ok(()) => valid += 1,
                Err(violation) => invalid.push(format!("{}: {violation}", catalog::title(track))),
            }
        }

        if invalid.is_empty() {
            self.pass(
                CHECK_SWEEP,
                format!("All {valid} premium tracks have valid preview times"),
                Some(json!({ "valid_previews": valid })),
            );
            true
        } else {
            self.fail(
                CHECK_SWEEP,
                format!("Found {} invalid preview settings", invalid.len()),
                Some(json!({ "invalid_previews": invalid })),
            );
            false
        }
    }

    /// Reads the remembered track's play count, plays it once and expects
    /// the count to have grown by exactly one.
    pub async fn check_play_count(&mut self) -> bool {
        let Some(track) = self.reference_track.clone() else {
            self.fail(CHECK_PLAY_COUNT, "No premium track available for testing", None);
            return false;
        };
        let Some(track_id) = track_id(&track) else {
            self.fail(CHECK_PLAY_COUNT, "Reference track has no id", Some(track));
            return false;
        };

        match self.play_and_compare(&track_id).await {
            Ok(passed) => passed,
            Err(err) => {
                self.fail(CHECK_PLAY_COUNT, format!("Request error: {err}"), None);
                false
            }
        }
    }

    async fn play_and_compare(&mut self, track_id: &str) -> Result<bool, HttpError> {
        let response = self.client.get_resource(TRACKS_PATH, &[track_id]).await?;
        if !response.is_ok() {
            self.fail(CHECK_PLAY_COUNT, "Failed to get initial play count", None);
            return Ok(false);
        }
        let initial = play_count(&response.json()?);

        let response = self.client.post(TRACKS_PATH, &[track_id, "play"]).await?;
        if !response.is_ok() {
            self.fail_status(CHECK_PLAY_COUNT, &response);
            return Ok(false);
        }

        let response = self.client.get_resource(TRACKS_PATH, &[track_id]).await?;
        if !response.is_ok() {
            self.fail(CHECK_PLAY_COUNT, "Failed to verify updated play count", None);
            return Ok(false);
        }
        let updated_data = response.json()?;
        let updated = play_count(&updated_data);

        // A server reporting i64::MAX cannot be incremented; that is a failed
        // check, not a harness fault.
        let expected = initial.checked_add(1);
        if expected == Some(updated) {
            self.pass(
                CHECK_PLAY_COUNT,
                format!("Play count incremented from {initial} to {updated}"),
                Some(json!({
                    "track_id": track_id,
                    "initial_count": initial,
                    "updated_count": updated,
                })),
            );
            Ok(true)
        } else {
            self.fail(
                CHECK_PLAY_COUNT,
                match expected {
                    Some(expected) => format!(
                        "Play count not incremented correctly. Expected: {expected}, Got: {updated}"
                    ),
                    None => format!(
                        "Play count cannot be incremented past {initial}, Got: {updated}"
                    ),
                },
                Some(updated_data),
            );
            Ok(false)
        }
    }

    /// Fetches a list endpoint, logging a failure unless it returns a
    /// non-empty JSON array. Empty and malformed lists fail the same way.
    async fn fetch_list(
        &mut self,
        name: &str,
        path: &str,
        query: &[(&str, &str)],
        empty: &str,
    ) -> Option<Vec<Value>> {
        let response = match self.client.get(path, query).await {
            Ok(response) => response,
            Err(err) => {
                self.fail(name, format!("Request error: {err}"), None);
                return None;
            }
        };

        if !response.is_ok() {
            self.fail_status(name, &response);
            return None;
        }

        match response.json() {
            Ok(Value::Array(tracks)) if !tracks.is_empty() => Some(tracks),
            Ok(other) => {
                self.fail(name, format!("{empty} or invalid response format"), Some(other));
                None
            }
            Err(err) => {
                self.fail(name, format!("Request error: {err}"), None);
                None
            }
        }
    }

    fn pass(&mut self, name: &str, details: impl Into<String>, snapshot: Option<Value>) {
        self.log.log_test(name, true, details, snapshot);
    }

    fn fail(&mut self, name: &str, details: impl Into<String>, snapshot: Option<Value>) {
        self.log.log_test(name, false, details, snapshot);
    }

    fn fail_status(&mut self, name: &str, response: &HttpResponse) {
        self.fail(
            name,
            format!("API returned status {}", response.status),
            Some(Value::String(response.body.clone())),
        );
    }
}

/// Track ids may come back as strings or numbers; both address the record.
fn track_id(track: &Value) -> Option<String> {
    match track.get("id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn play_count(track: &Value) -> i64 {
    track.get("play_count").and_then(Value::as_i64).unwrap_or(0)
}
