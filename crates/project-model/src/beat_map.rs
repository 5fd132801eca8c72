//! Beat maps: tempo plus beat and drop positions for a music track.
//!
//! A beat map is a pure function of its audio input and is safe to cache
//! by content hash. All positions are frame indices at the output rate.

use serde::{Deserialize, Serialize};

/// Frame index at the output frame rate.
pub type FrameIndex = u64;

/// Tempo and sync points extracted from (or synthesized for) a track.
///
/// `beats` and `drops` are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatMap {
    /// Estimated tempo in beats per minute.
    pub bpm: f64,

    /// Frame indices of detected beats.
    pub beats: Vec<FrameIndex>,

    /// Frame indices of energy surges ("drops").
    pub drops: Vec<FrameIndex>,
}

impl BeatMap {
    /// A beat map with a tempo but no sync points.
    pub fn empty(bpm: f64) -> Self {
        Self {
            bpm,
            beats: Vec::new(),
            drops: Vec::new(),
        }
    }

    /// Frames spanned by one beat at `fps`.
    pub fn frames_per_beat(&self, fps: u32) -> f64 {
        (60.0 / self.bpm) * fps as f64
    }

    pub fn beat_count(&self) -> usize {
        self.beats.len()
    }

    /// Whether some beat lies within `tolerance` frames of `frame`.
    pub fn is_on_beat(&self, frame: FrameIndex, tolerance: u64) -> bool {
        nearest(&self.beats, frame)
            .map(|beat| beat.abs_diff(frame) <= tolerance)
            .unwrap_or(false)
    }

    /// Whether some drop lies within `tolerance` frames of `frame`.
    pub fn is_on_drop(&self, frame: FrameIndex, tolerance: u64) -> bool {
        nearest(&self.drops, frame)
            .map(|drop| drop.abs_diff(frame) <= tolerance)
            .unwrap_or(false)
    }

    /// The beat closest to `frame`. Ties resolve to the earlier beat.
    pub fn nearest_beat(&self, frame: FrameIndex) -> Option<FrameIndex> {
        nearest(&self.beats, frame)
    }

    /// Move `frame` onto the nearest beat if one is within `max_distance`,
    /// otherwise return it unchanged.
    pub fn snap_to_beat(&self, frame: FrameIndex, max_distance: u64) -> FrameIndex {
        match self.nearest_beat(frame) {
            Some(beat) if beat.abs_diff(frame) <= max_distance => beat,
            _ => frame,
        }
    }

    /// Beats in the half-open frame range `[start, end)`.
    pub fn beats_in_range(&self, start: FrameIndex, end: FrameIndex) -> &[FrameIndex] {
        let lo = self.beats.partition_point(|&b| b < start);
        let hi = self.beats.partition_point(|&b| b < end).max(lo);
        &self.beats[lo..hi]
    }
}

/// Nearest element of a sorted slice.
fn nearest(sorted: &[FrameIndex], frame: FrameIndex) -> Option<FrameIndex> {
    let idx = sorted.partition_point(|&v| v < frame);
    let after = sorted.get(idx).copied();
    let before = idx.checked_sub(1).map(|i| sorted[i]);

    match (before, after) {
        (Some(b), Some(a)) => {
            if frame - b <= a - frame {
                Some(b)
            } else {
                Some(a)
            }
        }
        (Some(b), None) => Some(b),
        (None, a) => a,
    }
}
