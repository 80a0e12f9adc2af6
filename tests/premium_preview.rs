//! End-to-end runs of the harness against an in-process mock API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use preview_check::{HarnessConfig, PreviewHarness};
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Clone)]
struct MockApi {
    health_status: StatusCode,
    tracks: Vec<Value>,
    play_status: StatusCode,
    play_count: Arc<AtomicI64>,
    hits: Arc<Mutex<Vec<String>>>,
    plays: Arc<AtomicUsize>,
    increment_on_play: bool,
    /// Zero-based index of the single-track read that answers 500.
    failing_item_read: Option<usize>,
    item_reads: Arc<AtomicUsize>,
    list_delay: Option<Duration>,
}

impl MockApi {
    fn new(tracks: Vec<Value>) -> Self {
        Self {
            health_status: StatusCode::OK,
            tracks,
            play_status: StatusCode::OK,
            play_count: Arc::new(AtomicI64::new(3)),
            hits: Arc::new(Mutex::new(Vec::new())),
            plays: Arc::new(AtomicUsize::new(0)),
            increment_on_play: true,
            failing_item_read: None,
            item_reads: Arc::new(AtomicUsize::new(0)),
            list_delay: None,
        }
    }

    fn record(&self, uri: &Uri) {
        self.hits.lock().unwrap().push(uri.to_string());
    }

    fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    fn current_track(&self, id: &str) -> Option<Value> {
        let mut track = self.tracks.iter().find(|t| t["id"] == id)?.clone();
        track["play_count"] = json!(self.play_count.load(Ordering::SeqCst));
        Some(track)
    }
}

fn nasheed_of_dawn() -> Value {
    json!({
        "id": "t1",
        "title": "Nasheed of Dawn",
        "is_premium": true,
        "preview_start": 5,
        "preview_end": 25,
        "duration": 120,
        "play_count": 3,
    })
}

async fn health(State(api): State<MockApi>, uri: Uri) -> Response {
    api.record(&uri);
    if api.health_status == StatusCode::OK {
        Json(json!({"message": "Sadaa Instrumentals API"})).into_response()
    } else {
        (api.health_status, "service unavailable").into_response()
    }
}

async fn list_tracks(State(api): State<MockApi>, uri: Uri) -> Json<Value> {
    api.record(&uri);
    if let Some(delay) = api.list_delay {
        tokio::time::sleep(delay).await;
    }
    Json(Value::Array(api.tracks.clone()))
}

async fn featured(State(api): State<MockApi>, uri: Uri) -> Json<Value> {
    api.record(&uri);
    Json(Value::Array(api.tracks.clone()))
}

async fn track_by_id(State(api): State<MockApi>, Path(id): Path<String>, uri: Uri) -> Response {
    api.record(&uri);
    let read = api.item_reads.fetch_add(1, Ordering::SeqCst);
    if api.failing_item_read == Some(read) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "track store offline").into_response();
    }
    match api.current_track(&id) {
        Some(track) => Json(track).into_response(),
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

async fn play(State(api): State<MockApi>, Path(_id): Path<String>, uri: Uri) -> Response {
    api.record(&uri);
    api.plays.fetch_add(1, Ordering::SeqCst);
    if api.play_status != StatusCode::OK {
        return (api.play_status, "play counter offline").into_response();
    }
    if api.increment_on_play {
        api.play_count.fetch_add(1, Ordering::SeqCst);
    }
    Json(json!({"message": "Play count updated"})).into_response()
}

async fn spawn_mock(api: MockApi) -> String {
    let app = Router::new()
        .route("/api/", get(health))
        .route("/api/instrumentals", get(list_tracks))
        .route("/api/instrumentals/featured", get(featured))
        .route("/api/instrumentals/{id}", get(track_by_id))
        .route("/api/instrumentals/{id}/play", post(play))
        .with_state(api);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn harness_for(base_url: String) -> PreviewHarness {
    harness_with_timeout(base_url, Duration::from_secs(5))
}

fn harness_with_timeout(base_url: String, timeout: Duration) -> PreviewHarness {
    PreviewHarness::new(HarnessConfig {
        base_url,
        timeout,
        echo: false,
        ..Default::default()
    })
    .unwrap()
}

fn details_by_name(results: &[preview_check::TestResult]) -> HashMap<&str, (bool, &str)> {
    results
        .iter()
        .map(|r| (r.name.as_str(), (r.success, r.details.as_str())))
        .collect()
}

#[tokio::test]
async fn all_checks_pass_against_healthy_api() {
    let api = MockApi::new(vec![nasheed_of_dawn()]);
    let base_url = spawn_mock(api.clone()).await;

    let mut harness = harness_for(base_url);
    let report = harness.run_all_tests().await;

    assert_eq!(report.total, 6);
    assert_eq!(report.passed, 6);
    assert_eq!(report.failed, 0);
    assert_eq!(report.success_rate, 100.0);
    assert_eq!(report.exit_code(), 0);

    let names: Vec<_> = report.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "API Connection",
            "GET Premium Tracks - Preview Times",
            "Nasheed of Dawn - Preview Settings",
            "GET Featured - Premium with Preview",
            "Preview Time Validation",
            "Play Count Increment",
        ]
    );

    let details = details_by_name(&report.results);
    assert_eq!(details["API Connection"].1, "API is accessible - Sadaa Instrumentals API");
    assert_eq!(
        details["Nasheed of Dawn - Preview Settings"].1,
        "Valid preview settings: 5s to 25s (20s duration)"
    );
    assert_eq!(details["Play Count Increment"].1, "Play count incremented from 3 to 4");

    assert!(api.hits().contains(&"/api/instrumentals?is_premium=true".to_string()));
    assert_eq!(api.play_count.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn failed_play_only_fails_play_check() {
    let mut api = MockApi::new(vec![nasheed_of_dawn()]);
    api.play_status = StatusCode::INTERNAL_SERVER_ERROR;
    let base_url = spawn_mock(api.clone()).await;

    let mut harness = harness_for(base_url);
    let report = harness.run_all_tests().await;

    assert_eq!(report.total, 6);
    assert_eq!(report.passed, 5);
    assert_eq!(report.failed, 1);
    assert_ne!(report.exit_code(), 0);

    let play = report.results.last().unwrap();
    assert_eq!(play.name, "Play Count Increment");
    assert!(!play.success);
    assert_eq!(play.details, "API returned status 500");
    assert_eq!(play.response_snapshot, Some(json!("play counter offline")));

    // The re-read after a failed play is skipped.
    let reads = api
        .hits()
        .iter()
        .filter(|uri| uri.as_str() == "/api/instrumentals/t1")
        .count();
    assert_eq!(reads, 1);
}

#[tokio::test]
async fn unhealthy_api_stops_after_connection_check() {
    let mut api = MockApi::new(vec![nasheed_of_dawn()]);
    api.health_status = StatusCode::SERVICE_UNAVAILABLE;
    let base_url = spawn_mock(api.clone()).await;

    let mut harness = harness_for(base_url);
    let report = harness.run_all_tests().await;

    assert_eq!(report.total, 1);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].details, "API returned status 503");
    assert_eq!(api.hits(), vec!["/api/".to_string()]);
}

#[tokio::test]
async fn missing_reference_track_skips_dependent_requests() {
    let mut other = nasheed_of_dawn();
    other["id"] = json!("t2");
    other["title"] = json!("Evening Dhikr");
    let api = MockApi::new(vec![other]);
    let base_url = spawn_mock(api.clone()).await;

    let mut harness = harness_for(base_url);
    let report = harness.run_all_tests().await;

    assert!(harness.reference_track().is_none());
    assert_eq!(report.total, 6);
    assert_eq!(report.passed, 4);

    let details = details_by_name(&report.results);
    assert_eq!(
        details["Nasheed of Dawn - Preview Settings"],
        (false, "Nasheed of Dawn track not found")
    );
    assert_eq!(
        details["Play Count Increment"],
        (false, "No premium track available for testing")
    );

    assert!(api.hits().iter().all(|uri| !uri.starts_with("/api/instrumentals/t")));
    assert_eq!(api.plays.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sweep_reports_each_invalid_window() {
    let tracks = vec![
        nasheed_of_dawn(),
        json!({"id": "a", "title": "Negative", "is_premium": true, "preview_start": -1, "preview_end": 10, "duration": 30}),
        json!({"id": "b", "title": "Flat", "is_premium": true, "preview_start": 10, "preview_end": 10, "duration": 30}),
        json!({"id": "c", "title": "Overrun", "is_premium": true, "preview_start": 0, "preview_end": 31, "duration": 30}),
        json!({"id": "d", "title": "Fine", "is_premium": true, "preview_start": 10, "preview_end": 20, "duration": 30}),
        json!({"id": "e", "title": "Free", "is_premium": false, "preview_start": -5, "preview_end": 1, "duration": 30}),
    ];
    let api = MockApi::new(tracks);
    let base_url = spawn_mock(api).await;

    let mut harness = harness_for(base_url);
    assert!(harness.check_connection().await);
    assert!(!harness.check_preview_windows().await);

    let sweep = harness.log().results().last().unwrap();
    assert_eq!(sweep.details, "Found 3 invalid preview settings");
    assert_eq!(
        sweep.response_snapshot,
        Some(json!({
            "invalid_previews": [
                "Negative: preview_start < 0",
                "Flat: preview_end <= preview_start",
                "Overrun: preview_end > track duration",
            ]
        }))
    );
}

#[tokio::test]
async fn empty_listing_fails_listing_checks() {
    let api = MockApi::new(Vec::new());
    let base_url = spawn_mock(api).await;

    let mut harness = harness_for(base_url);
    let report = harness.run_all_tests().await;

    let details = details_by_name(&report.results);
    assert_eq!(
        details["GET Premium Tracks - Preview Times"],
        (false, "No premium tracks found or invalid response format")
    );
    assert_eq!(
        details["GET Featured - Premium with Preview"],
        (false, "No featured tracks found or invalid response format")
    );
    assert_eq!(
        details["Preview Time Validation"],
        (true, "All 0 premium tracks have valid preview times")
    );
    assert_eq!(report.passed, 2);
    assert_eq!(
        report.passed,
        report.results.iter().filter(|r| r.success).count()
    );
}

fn play_result(report: &preview_check::RunReport) -> &preview_check::TestResult {
    let play = report.results.last().unwrap();
    assert_eq!(play.name, "Play Count Increment");
    play
}

#[tokio::test]
async fn unchanged_play_count_fails_with_expected_value() {
    let mut api = MockApi::new(vec![nasheed_of_dawn()]);
    api.increment_on_play = false;
    let base_url = spawn_mock(api.clone()).await;

    let report = harness_for(base_url).run_all_tests().await;

    assert_eq!(report.total, report.results.len());
    assert_eq!(report.passed, 5);
    let play = play_result(&report);
    assert!(!play.success);
    assert_eq!(play.details, "Play count not incremented correctly. Expected: 4, Got: 3");
    assert_eq!(play.response_snapshot.as_ref().unwrap()["play_count"], 3);
    assert_eq!(api.plays.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_initial_read_skips_play() {
    let mut api = MockApi::new(vec![nasheed_of_dawn()]);
    api.failing_item_read = Some(0);
    let base_url = spawn_mock(api.clone()).await;

    let report = harness_for(base_url).run_all_tests().await;

    assert_eq!(report.total, report.results.len());
    assert_eq!(play_result(&report).details, "Failed to get initial play count");
    assert_eq!(api.plays.load(Ordering::SeqCst), 0);
    assert_eq!(api.item_reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_reread_is_reported() {
    let mut api = MockApi::new(vec![nasheed_of_dawn()]);
    api.failing_item_read = Some(1);
    let base_url = spawn_mock(api.clone()).await;

    let report = harness_for(base_url).run_all_tests().await;

    assert_eq!(report.total, report.results.len());
    assert_eq!(play_result(&report).details, "Failed to verify updated play count");
    assert_eq!(api.plays.load(Ordering::SeqCst), 1);
    assert_eq!(api.item_reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn saturated_play_count_fails_without_panicking() {
    let mut api = MockApi::new(vec![nasheed_of_dawn()]);
    api.increment_on_play = false;
    api.play_count.store(i64::MAX, Ordering::SeqCst);
    let base_url = spawn_mock(api).await;

    let report = harness_for(base_url).run_all_tests().await;

    assert_eq!(report.total, 6);
    assert_eq!(report.failed, 1);
    assert_eq!(
        play_result(&report).details,
        format!("Play count cannot be incremented past {}, Got: {}", i64::MAX, i64::MAX)
    );
}

#[tokio::test]
async fn slow_listing_times_out_and_run_continues() {
    let mut api = MockApi::new(vec![nasheed_of_dawn()]);
    api.list_delay = Some(Duration::from_secs(2));
    let base_url = spawn_mock(api).await;

    let mut harness = harness_with_timeout(base_url, Duration::from_millis(300));
    let report = harness.run_all_tests().await;

    assert_eq!(report.total, 6);
    assert_eq!(harness.log().tests_run(), report.results.len());
    assert_eq!(
        harness.log().tests_passed(),
        report.results.iter().filter(|r| r.success).count()
    );

    let details = details_by_name(&report.results);
    let (listed, listing_detail) = details["GET Premium Tracks - Preview Times"];
    assert!(!listed);
    assert!(listing_detail.starts_with("Request error:"), "{listing_detail}");
    let (swept, sweep_detail) = details["Preview Time Validation"];
    assert!(!swept);
    assert!(sweep_detail.starts_with("Request error:"), "{sweep_detail}");

    assert!(details["GET Featured - Premium with Preview"].0);
    assert_eq!(
        details["Play Count Increment"],
        (false, "No premium track available for testing")
    );
}
