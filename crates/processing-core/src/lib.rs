//! Beatsync Processing Core
//!
//! Turns raw inputs into schedule decisions for the renderer:
//! - **Beat Detection:** Estimate tempo, beats and drops from an audio signal
//! - **Timeline Compilation:** Snap draft scenes onto the beat grid and
//!   stretch them toward a target length
//! - **Cursor Activity:** Detect dwell clusters in pointer samples and emit
//!   camera zoom points
//!
//! This crate is pure computation with no I/O and no shared state.
//! All inputs are data; all outputs are data.

pub mod beat_detect;
pub mod cursor_activity;
pub mod timeline_compiler;

pub use beat_detect::{beat_map_from_bpm, AudioSignal, BeatDetectionConfig, BeatDetector};
pub use cursor_activity::{CursorActivityAnalyzer, DwellCluster, ZoomConfig};
pub use timeline_compiler::{CompileOptions, TimelineCompiler};
