//! Beatsync Input Tracker
//!
//! Records pointer activity during a capture session as a buffered
//! sample sequence. Moves are sampled at a fixed interval, clicks are
//! always kept. Samples can optionally be streamed to an append-only
//! JSONL file for crash safety.
//!
//! Capture and analysis are sequential: [`CursorRecorder::stop`] finalizes
//! the buffer, after which the samples are handed to the analyzer.

pub mod writer;

use std::path::PathBuf;

use beatsync_common::clock::RateController;
use beatsync_common::config::AnalysisDefaults;
use beatsync_common::error::BeatsyncResult;
use beatsync_project_model::cursor::{CursorEventType, CursorSample, SampleStreamHeader};

pub use writer::SampleWriter;

/// Current sample stream schema version.
pub const SCHEMA_VERSION: &str = "1.0";

/// Fixed-interval cursor sample recorder.
pub struct CursorRecorder {
    rate: RateController,
    header: SampleStreamHeader,
    samples: Vec<CursorSample>,
    writer: Option<SampleWriter>,
    dropped: u64,
    stopped: bool,
}

impl CursorRecorder {
    /// Create an in-memory recorder sampling moves at `sample_rate_hz`.
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            rate: RateController::new(sample_rate_hz),
            header: SampleStreamHeader {
                schema_version: SCHEMA_VERSION.to_string(),
                epoch_wall: chrono::Utc::now().to_rfc3339(),
                sample_rate_hz,
            },
            samples: Vec::new(),
            writer: None,
            dropped: 0,
            stopped: false,
        }
    }

    /// Create a recorder that also streams accepted samples to `output_path`.
    pub fn with_output(sample_rate_hz: u32, output_path: PathBuf) -> BeatsyncResult<Self> {
        let mut recorder = Self::new(sample_rate_hz);
        recorder.writer = Some(SampleWriter::new(output_path, &recorder.header)?);
        Ok(recorder)
    }

    /// Offer a pointer observation at `t` seconds since capture start.
    ///
    /// Returns whether the sample was kept. Non-finite observations and
    /// anything after [`stop`](Self::stop) are ignored; coordinates are
    /// clamped into `[0, 1]`.
    pub fn record(
        &mut self,
        t: f64,
        x: f64,
        y: f64,
        event_type: CursorEventType,
    ) -> BeatsyncResult<bool> {
        if self.stopped {
            return Ok(false);
        }

        let sample = CursorSample::new(t, x, y, event_type);
        if !sample.is_finite() {
            self.dropped += 1;
            tracing::trace!(t, x, y, "ignoring non-finite cursor sample");
            return Ok(false);
        }

        let accepted = match event_type {
            CursorEventType::Click => true,
            CursorEventType::Move | CursorEventType::Idle => self.rate.should_tick(t),
        };
        if !accepted {
            return Ok(false);
        }

        let sample = CursorSample {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
            ..sample
        };
        if let Some(writer) = self.writer.as_mut() {
            writer.write_sample(&sample)?;
        }
        self.samples.push(sample);
        Ok(true)
    }

    /// Stop recording, flush any output file and return the finalized,
    /// time-sorted sample buffer.
    pub fn stop(&mut self) -> BeatsyncResult<Vec<CursorSample>> {
        self.stopped = true;
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }

        let mut samples = std::mem::take(&mut self.samples);
        samples.sort_by(|a, b| a.t.total_cmp(&b.t));

        tracing::info!(
            samples = samples.len(),
            dropped = self.dropped,
            "cursor recorder stopped"
        );
        Ok(samples)
    }

    pub fn header(&self) -> &SampleStreamHeader {
        &self.header
    }

    /// Samples buffered so far.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl From<&AnalysisDefaults> for CursorRecorder {
    fn from(defaults: &AnalysisDefaults) -> Self {
        Self::new(defaults.pointer_sample_rate_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatsync_project_model::cursor::parse_samples;

    #[test]
    fn test_moves_are_rate_limited() {
        let mut recorder = CursorRecorder::new(10);
        for i in 0..100 {
            let t = i as f64 / 100.0;
            recorder.record(t, 0.5, 0.5, CursorEventType::Move).unwrap();
        }
        let samples = recorder.stop().unwrap();
        assert_eq!(samples.len(), 10);
        assert!(samples.windows(2).all(|w| w[1].t - w[0].t >= 0.1 - 1e-9));
    }

    #[test]
    fn test_rate_comes_from_config() {
        let defaults = AnalysisDefaults {
            pointer_sample_rate_hz: 4,
            ..Default::default()
        };
        let mut recorder = CursorRecorder::from(&defaults);
        assert_eq!(recorder.header().sample_rate_hz, 4);

        for i in 0..10 {
            recorder
                .record(i as f64 / 10.0, 0.5, 0.5, CursorEventType::Move)
                .unwrap();
        }
        // 0.0, 0.3, 0.6, 0.9 pass the 0.25 s gate.
        assert_eq!(recorder.len(), 4);
    }

    #[test]
    fn test_clicks_always_recorded() {
        let mut recorder = CursorRecorder::new(1);
        assert!(recorder.record(0.0, 0.1, 0.1, CursorEventType::Move).unwrap());
        assert!(!recorder.record(0.2, 0.2, 0.2, CursorEventType::Move).unwrap());
        assert!(recorder.record(0.3, 0.2, 0.2, CursorEventType::Click).unwrap());
        assert_eq!(recorder.len(), 2);
    }

    #[test]
    fn test_clamps_and_ignores_bad_input() {
        let mut recorder = CursorRecorder::new(0);
        recorder.record(0.0, -0.5, 1.5, CursorEventType::Move).unwrap();
        assert!(!recorder.record(0.1, f64::NAN, 0.5, CursorEventType::Move).unwrap());
        assert!(!recorder.record(f64::INFINITY, 0.5, 0.5, CursorEventType::Click).unwrap());

        let samples = recorder.stop().unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!((samples[0].x, samples[0].y), (0.0, 1.0));
    }

    #[test]
    fn test_stop_sorts_and_finalizes() {
        let mut recorder = CursorRecorder::new(0);
        recorder.record(0.5, 0.5, 0.5, CursorEventType::Move).unwrap();
        recorder.record(0.2, 0.4, 0.4, CursorEventType::Click).unwrap();

        let samples = recorder.stop().unwrap();
        assert_eq!(samples[0].t, 0.2);
        assert!(recorder.is_stopped());
        assert!(!recorder.record(1.0, 0.5, 0.5, CursorEventType::Click).unwrap());
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_streams_to_file() {
        let dir = std::env::temp_dir().join("beatsync_test_recorder");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("cursor.jsonl");

        let mut recorder = CursorRecorder::with_output(30, path.clone()).unwrap();
        recorder.record(0.0, 0.5, 0.5, CursorEventType::Move).unwrap();
        recorder.record(0.01, 0.5, 0.5, CursorEventType::Move).unwrap();
        recorder.record(0.05, 0.5, 0.5, CursorEventType::Click).unwrap();
        let samples = recorder.stop().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# "));
        assert_eq!(parse_samples(&content).unwrap(), samples);

        std::fs::remove_dir_all(&dir).ok();
    }
}
