//! Pointer samples and the zoom points derived from them.
//!
//! Samples are recorded in append-only JSONL format. All coordinates are
//! normalized to `[0.0, 1.0]` relative to the captured region.

use serde::{Deserialize, Serialize};

/// Kind of pointer activity captured with a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CursorEventType {
    #[default]
    Move,
    Click,
    Idle,
}

/// A single pointer-position sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorSample {
    /// Seconds since the capture session started.
    pub t: f64,
    /// Normalized X coordinate [0.0, 1.0].
    pub x: f64,
    /// Normalized Y coordinate [0.0, 1.0].
    pub y: f64,
    #[serde(default)]
    pub event_type: CursorEventType,
}

impl CursorSample {
    pub fn new(t: f64, x: f64, y: f64, event_type: CursorEventType) -> Self {
        Self {
            t,
            x,
            y,
            event_type,
        }
    }

    /// Create a move sample.
    pub fn moved(t: f64, x: f64, y: f64) -> Self {
        Self::new(t, x, y, CursorEventType::Move)
    }

    /// Create a click sample.
    pub fn click(t: f64, x: f64, y: f64) -> Self {
        Self::new(t, x, y, CursorEventType::Click)
    }

    pub fn is_click(&self) -> bool {
        self.event_type == CursorEventType::Click
    }

    /// Whether every field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.t.is_finite() && self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another sample in normalized space.
    pub fn distance_to(&self, other: &CursorSample) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A camera push-in keyframe derived from pointer activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomPoint {
    /// Start time in seconds.
    pub time: f64,
    /// Zoom target X [0.0, 1.0].
    pub x: f64,
    /// Zoom target Y [0.0, 1.0].
    pub y: f64,
    /// Magnification, always greater than 1.0.
    pub scale: f64,
    /// Hold length in seconds, always positive.
    pub duration: f64,
}

impl ZoomPoint {
    /// End time in seconds.
    pub fn end(&self) -> f64 {
        self.time + self.duration
    }
}

/// Whether a zoom-point list is time-ordered and non-overlapping.
pub fn zoom_points_are_disjoint(points: &[ZoomPoint]) -> bool {
    points.windows(2).all(|w| w[0].end() <= w[1].time)
}

/// Metadata written as the first (`#`-prefixed) line of a sample stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleStreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Wall-clock time at capture start (ISO 8601).
    pub epoch_wall: String,

    /// Nominal sampling rate for move samples (Hz).
    pub sample_rate_hz: u32,
}

/// Parse samples from JSONL content (one JSON object per line).
/// Blank lines and `#` header lines are skipped.
pub fn parse_samples(jsonl: &str) -> Result<Vec<CursorSample>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize samples to JSONL format.
pub fn serialize_samples(samples: &[CursorSample]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for sample in samples {
        output.push_str(&serde_json::to_string(sample)?);
        output.push('\n');
    }
    Ok(output)
}
