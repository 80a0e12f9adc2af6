//! # Track Inspection
//!
//! Read-only helpers over the API's track records. Tracks are kept as raw
//! `serde_json::Value`s: the harness asserts on their shape, so a record
//! with missing or mistyped fields must still be inspectable.

use std::fmt::{self, Display};

use serde_json::Value;

/// Title used when a record carries no usable `title` field.
const UNTITLED: &str = "<untitled>";

/// Premium/preview counts over one list response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewTally {
    pub total: usize,
    pub premium: usize,
    pub with_preview: usize,
}

/// A validated `[start, end)` preview range, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewWindow {
    pub start: i64,
    pub end: i64,
}

impl PreviewWindow {
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }
}

/// First rule a premium track's preview window breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewViolation {
    NegativeStart,
    EndNotAfterStart,
    EndExceedsDuration,
    NonNumeric,
}

impl Display for PreviewViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PreviewViolation::NegativeStart => "preview_start < 0",
            PreviewViolation::EndNotAfterStart => "preview_end <= preview_start",
            PreviewViolation::EndExceedsDuration => "preview_end > track duration",
            PreviewViolation::NonNumeric => "preview bounds are not numeric",
        };
        write!(f, "{label}")
    }
}

pub fn is_premium(track: &Value) -> bool {
    track.get("is_premium").and_then(Value::as_bool).unwrap_or(false)
}

fn is_present(track: &Value, field: &str) -> bool {
    track.get(field).is_some_and(|value| !value.is_null())
}

/// Both preview bounds are present and non-null.
pub fn has_preview_window(track: &Value) -> bool {
    is_present(track, "preview_start") && is_present(track, "preview_end")
}

pub fn title(track: &Value) -> &str {
    track.get("title").and_then(Value::as_str).unwrap_or(UNTITLED)
}

pub fn tally(tracks: &[Value]) -> PreviewTally {
    let mut counts = PreviewTally {
        total: tracks.len(),
        ..Default::default()
    };

    for track in tracks.iter().filter(|track| is_premium(track)) {
        counts.premium += 1;
        if has_preview_window(track) {
            counts.with_preview += 1;
        }
    }

    counts
}

/// Checks a track's preview window against its duration. Rules apply in
/// order and the first one broken is reported; a missing `duration` counts
/// as zero.
pub fn validate_preview_window(track: &Value) -> Result<(), PreviewViolation> {
    let start = track.get("preview_start").and_then(Value::as_f64);
    let end = track.get("preview_end").and_then(Value::as_f64);
    let duration = match track.get("duration") {
        None | Some(Value::Null) => Some(0.0),
        Some(value) => value.as_f64(),
    };

    let (Some(start), Some(end), Some(duration)) = (start, end, duration) else {
        return Err(PreviewViolation::NonNumeric);
    };

    if start < 0.0 {
        Err(PreviewViolation::NegativeStart)
    } else if end <= start {
        Err(PreviewViolation::EndNotAfterStart)
    } else if end > duration {
        Err(PreviewViolation::EndExceedsDuration)
    } else {
        Ok(())
    }
}

/// Validates the reference track, collecting every problem instead of
/// stopping at the first.
pub fn inspect_reference_track(track: &Value) -> Result<PreviewWindow, Vec<String>> {
    let mut problems = Vec::new();

    if !is_premium(track) {
        problems.push("Track is not marked as premium".to_string());
    }

    let start = match track.get("preview_start") {
        None | Some(Value::Null) => {
            problems.push("preview_start is missing".to_string());
            None
        }
        Some(value) => match value.as_i64() {
            Some(start) if start >= 0 => Some(start),
            _ => {
                problems.push(format!("preview_start is invalid: {value}"));
                None
            }
        },
    };

    // The end bound is compared against any numeric start, valid or not; a
    // missing or non-numeric start leaves only the integer requirement.
    let numeric_start = track.get("preview_start").and_then(Value::as_f64);
    let end = match track.get("preview_end") {
        None | Some(Value::Null) => {
            problems.push("preview_end is missing".to_string());
            None
        }
        Some(value) => match value.as_i64() {
            Some(end) if numeric_start.is_none_or(|start| end as f64 > start) => Some(end),
            _ => {
                problems.push(format!("preview_end is invalid: {value}"));
                None
            }
        },
    };

    match (start, end) {
        (Some(start), Some(end)) if problems.is_empty() => Ok(PreviewWindow { start, end }),
        _ => Err(problems),
    }
}
