//! Beat detection: energy-based onset picking on a mono audio signal.
//!
//! Produces a [`BeatMap`] (tempo plus beat/drop frame indices) that the
//! timeline compiler and renderer use as sync points.
//!
//! # Algorithm
//!
//! 1. **Window** the signal into 20 ms frames with 50% overlap and take the
//!    mean squared amplitude of each.
//! 2. **Normalize** energies by the global maximum.
//! 3. **Peak-pick**: a window above the threshold that is strictly louder
//!    than both neighbours is a beat candidate.
//! 4. **Tempo**: average the inter-peak intervals whose implied BPM lies in
//!    `[min_bpm, max_bpm]`, falling back to the default tempo, then clamp.
//! 5. **Drops**: windows louder than twice their trailing 10-window average.
//!
//! Degenerate audio (silence, very short buffers) is not an error: it yields
//! a map with the default tempo and no sync points.

use beatsync_common::config::AnalysisDefaults;
use beatsync_common::error::{BeatsyncError, BeatsyncResult};
use beatsync_project_model::beat_map::{BeatMap, FrameIndex};
use serde::{Deserialize, Serialize};

/// Beats between synthesized drops (four bars of 4/4).
const BEATS_PER_DROP: usize = 16;

/// Mono audio input for beat detection.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioSignal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Build a mono signal from interleaved multi-channel samples, keeping
    /// only the first channel.
    pub fn from_interleaved(samples: &[f32], channels: u16, sample_rate: u32) -> Self {
        let channels = channels.max(1) as usize;
        let mono = samples.iter().step_by(channels).copied().collect();
        Self::new(mono, sample_rate)
    }

    /// Signal length in seconds (0 for a zero sample rate).
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Configuration for the beat detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatDetectionConfig {
    /// Analysis window length in milliseconds. Hop is half of this.
    pub window_ms: f64,

    /// Normalized energy a window must exceed to count as a peak.
    pub threshold: f64,

    /// Lowest accepted tempo.
    pub min_bpm: f64,

    /// Highest accepted tempo.
    pub max_bpm: f64,

    /// Tempo used when no valid inter-peak interval exists.
    pub default_bpm: f64,

    /// Output frame rate for beat and drop indices.
    pub fps: u32,

    /// Trailing windows averaged for drop detection.
    pub drop_history: usize,

    /// Energy ratio over the trailing average that marks a drop.
    pub drop_ratio: f64,
}

impl Default for BeatDetectionConfig {
    fn default() -> Self {
        Self {
            window_ms: 20.0,
            threshold: 0.3,
            min_bpm: 80.0,
            max_bpm: 180.0,
            default_bpm: 120.0,
            fps: 30,
            drop_history: 10,
            drop_ratio: 2.0,
        }
    }
}

impl From<&AnalysisDefaults> for BeatDetectionConfig {
    fn from(defaults: &AnalysisDefaults) -> Self {
        Self {
            threshold: defaults.threshold,
            min_bpm: defaults.min_bpm,
            max_bpm: defaults.max_bpm,
            fps: defaults.fps,
            ..Default::default()
        }
    }
}

/// The beat map extractor.
#[derive(Debug, Clone, Default)]
pub struct BeatDetector {
    config: BeatDetectionConfig,
}

impl BeatDetector {
    /// Create a detector with the given configuration.
    pub fn new(config: BeatDetectionConfig) -> Self {
        Self { config }
    }

    /// Create a detector with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(BeatDetectionConfig::default())
    }

    pub fn config(&self) -> &BeatDetectionConfig {
        &self.config
    }

    /// Extract tempo, beats and drops from `signal`.
    ///
    /// Fails only on invalid parameters (zero sample rate, zero frame rate,
    /// or an empty BPM range); any well-formed signal yields a map.
    pub fn extract(&self, signal: &AudioSignal) -> BeatsyncResult<BeatMap> {
        if signal.sample_rate == 0 {
            return Err(BeatsyncError::invalid_input("sample rate must be positive"));
        }
        if self.config.fps == 0 {
            return Err(BeatsyncError::invalid_input("frame rate must be positive"));
        }
        let (min_bpm, max_bpm) = (self.config.min_bpm, self.config.max_bpm);
        if !(min_bpm > 0.0 && max_bpm >= min_bpm) {
            return Err(BeatsyncError::config(format!(
                "invalid BPM range [{min_bpm}, {max_bpm}]"
            )));
        }

        let sample_rate = signal.sample_rate as f64;
        let window = ((self.config.window_ms / 1000.0) * sample_rate).round().max(2.0) as usize;
        let hop = (window / 2).max(1);

        let energies = window_energies(&signal.samples, window, hop);
        let normalized = normalize(&energies);
        let peaks = pick_peaks(&normalized, self.config.threshold);

        let peak_times: Vec<f64> = peaks
            .iter()
            .map(|&index| (index * hop) as f64 / sample_rate)
            .collect();

        let bpm = self.estimate_bpm(&peak_times);
        let beats = to_frames(&peak_times, self.config.fps);

        let drop_times: Vec<f64> =
            detect_drops(&energies, self.config.drop_history, self.config.drop_ratio)
                .into_iter()
                .map(|index| (index * hop) as f64 / sample_rate)
                .collect();
        let drops = to_frames(&drop_times, self.config.fps);

        tracing::debug!(
            windows = energies.len(),
            peaks = peaks.len(),
            drops = drops.len(),
            bpm,
            "beat detection complete"
        );

        Ok(BeatMap { bpm, beats, drops })
    }

    /// Synthesized beat grid at the configured default tempo.
    pub fn fallback(&self, total_frames: u64) -> BeatsyncResult<BeatMap> {
        let bpm = clamp_bpm(
            self.config.default_bpm,
            self.config.min_bpm,
            self.config.max_bpm,
        );
        beat_map_from_bpm(bpm, total_frames, self.config.fps)
    }

    /// Average in-range inter-peak interval, converted to a clamped BPM.
    fn estimate_bpm(&self, peak_times: &[f64]) -> f64 {
        let (min_bpm, max_bpm) = (self.config.min_bpm, self.config.max_bpm);

        let valid: Vec<f64> = peak_times
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|&interval| {
                interval > 0.0 && {
                    let implied = 60.0 / interval;
                    implied >= min_bpm && implied <= max_bpm
                }
            })
            .collect();

        let bpm = if valid.is_empty() {
            self.config.default_bpm
        } else {
            let average = valid.iter().sum::<f64>() / valid.len() as f64;
            60.0 / average
        };

        clamp_bpm(bpm, min_bpm, max_bpm)
    }
}

/// Deterministic beat grid for a declared tempo: one beat every
/// `round(60 / bpm * fps)` frames and one drop every 16 beats.
///
/// The first drop lands on beat 16, not on frame 0.
pub fn beat_map_from_bpm(bpm: f64, total_frames: u64, fps: u32) -> BeatsyncResult<BeatMap> {
    if !(bpm.is_finite() && bpm > 0.0) {
        return Err(BeatsyncError::invalid_input(format!(
            "bpm must be positive, got {bpm}"
        )));
    }
    if fps == 0 {
        return Err(BeatsyncError::invalid_input("frame rate must be positive"));
    }

    let interval = ((60.0 / bpm) * fps as f64).round().max(1.0) as u64;
    let beats: Vec<FrameIndex> = (0..total_frames).step_by(interval as usize).collect();
    let drops = beats
        .iter()
        .enumerate()
        .filter(|(index, _)| *index > 0 && index % BEATS_PER_DROP == 0)
        .map(|(_, &frame)| frame)
        .collect();

    Ok(BeatMap { bpm, beats, drops })
}

fn clamp_bpm(bpm: f64, min_bpm: f64, max_bpm: f64) -> f64 {
    if bpm.is_finite() {
        bpm.clamp(min_bpm, max_bpm)
    } else {
        min_bpm
    }
}

/// Mean squared amplitude of each full window. Non-finite samples count as
/// silence.
fn window_energies(samples: &[f32], window: usize, hop: usize) -> Vec<f64> {
    if samples.len() < window {
        return Vec::new();
    }

    (0..=samples.len() - window)
        .step_by(hop)
        .map(|start| {
            let sum: f64 = samples[start..start + window]
                .iter()
                .map(|&s| if s.is_finite() { (s as f64) * (s as f64) } else { 0.0 })
                .sum();
            sum / window as f64
        })
        .collect()
}

fn normalize(energies: &[f64]) -> Vec<f64> {
    let max = energies.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return vec![0.0; energies.len()];
    }
    energies.iter().map(|e| e / max).collect()
}

/// Indices of strict local maxima above `threshold`.
fn pick_peaks(normalized: &[f64], threshold: f64) -> Vec<usize> {
    if normalized.len() < 3 {
        return Vec::new();
    }
    (1..normalized.len() - 1)
        .filter(|&i| {
            let e = normalized[i];
            e > threshold && e > normalized[i - 1] && e > normalized[i + 1]
        })
        .collect()
}

/// Indices of windows whose energy exceeds `ratio` times the mean of the
/// preceding `history` windows.
fn detect_drops(energies: &[f64], history: usize, ratio: f64) -> Vec<usize> {
    if history == 0 || energies.len() <= history {
        return Vec::new();
    }

    // Trailing mean is recomputed from the window on every step.
    (history..energies.len())
        .filter(|&i| {
            let average = energies[i - history..i].iter().sum::<f64>() / history as f64;
            energies[i] > ratio * average
        })
        .collect()
}

/// Convert times to strictly increasing frame indices.
fn to_frames(times: &[f64], fps: u32) -> Vec<FrameIndex> {
    let mut frames: Vec<FrameIndex> = times
        .iter()
        .map(|t| (t * fps as f64).round().max(0.0) as FrameIndex)
        .collect();
    frames.dedup();
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Decaying clicks at `beat_secs` spacing, starting one beat in.
    fn click_track(sample_rate: u32, secs: f64, beat_secs: f64) -> AudioSignal {
        let total = (secs * sample_rate as f64) as usize;
        let step = (beat_secs * sample_rate as f64) as usize;
        let mut samples = vec![0.0_f32; total];
        let mut start = step;
        while start < total {
            for n in 0..400 {
                if let Some(s) = samples.get_mut(start + n) {
                    *s = (-(n as f32) / 200.0).exp();
                }
            }
            start += step;
        }
        AudioSignal::new(samples, sample_rate)
    }

    #[test]
    fn test_silence_yields_default_bpm_and_no_sync_points() {
        let signal = AudioSignal::new(vec![0.0; 2 * 44_100], 44_100);
        let map = BeatDetector::with_defaults().extract(&signal).unwrap();
        assert_eq!(map.bpm, 120.0);
        assert!(map.beats.is_empty());
        assert!(map.drops.is_empty());
    }

    #[test]
    fn test_click_track_at_120_bpm() {
        let signal = click_track(8_000, 4.0, 0.5);
        let map = BeatDetector::with_defaults().extract(&signal).unwrap();

        assert!((map.bpm - 120.0).abs() < 1.0, "bpm was {}", map.bpm);
        assert_eq!(map.beats, vec![15, 30, 45, 60, 75, 90, 105]);
        assert_eq!(map.drops.first(), Some(&15));
    }

    #[test]
    fn test_out_of_range_tempo_is_clamped() {
        // Clicks every 0.25s imply 240 BPM, outside the default range.
        let signal = click_track(8_000, 4.0, 0.25);
        let map = BeatDetector::with_defaults().extract(&signal).unwrap();
        assert!(map.bpm >= 80.0 && map.bpm <= 180.0);
    }

    #[test]
    fn test_short_buffer_is_not_an_error() {
        let signal = AudioSignal::new(vec![0.5; 10], 44_100);
        let map = BeatDetector::with_defaults().extract(&signal).unwrap();
        assert_eq!(map.bpm, 120.0);
        assert!(map.beats.is_empty());
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let detector = BeatDetector::with_defaults();
        let err = detector.extract(&AudioSignal::new(vec![0.0; 100], 0)).unwrap_err();
        assert!(err.is_invalid_input());

        let inverted = BeatDetector::new(BeatDetectionConfig {
            min_bpm: 200.0,
            max_bpm: 100.0,
            ..Default::default()
        });
        assert!(inverted.extract(&AudioSignal::new(vec![0.0; 100], 8_000)).is_err());
    }

    #[test]
    fn test_interleaved_keeps_first_channel() {
        let signal = AudioSignal::from_interleaved(&[1.0, -1.0, 0.5, -0.5], 2, 48_000);
        assert_eq!(signal.samples, vec![1.0, 0.5]);
        assert!((signal.duration_secs() - 2.0 / 48_000.0).abs() < 1e-12);
    }

    #[test]
    fn test_fallback_grid_at_120_bpm() {
        let map = beat_map_from_bpm(120.0, 1800, 30).unwrap();
        assert_eq!(&map.beats[..4], &[0, 15, 30, 45]);
        assert_eq!(map.beats.len(), 120);
        assert!(map.beats.windows(2).all(|w| w[1] - w[0] == 15));
        assert_eq!(&map.drops[..3], &[240, 480, 720]);
        assert!(map.drops.windows(2).all(|w| w[1] - w[0] == 240));
    }

    #[test]
    fn test_fallback_rejects_bad_tempo() {
        assert!(beat_map_from_bpm(0.0, 100, 30).is_err());
        assert!(beat_map_from_bpm(-5.0, 100, 30).is_err());
        assert!(beat_map_from_bpm(f64::NAN, 100, 30).is_err());
        assert!(beat_map_from_bpm(120.0, 100, 0).is_err());
    }

    #[test]
    fn test_detector_fallback_uses_default_tempo() {
        let map = BeatDetector::with_defaults().fallback(60).unwrap();
        assert_eq!(map.bpm, 120.0);
        assert_eq!(map.beats, vec![0, 15, 30, 45]);
        assert!(map.drops.is_empty());
    }

    #[test]
    fn test_drop_detection_finds_surge() {
        let mut energies = vec![0.1; 20];
        energies[15] = 0.5;
        assert_eq!(detect_drops(&energies, 10, 2.0), vec![15]);
    }

    /// Deterministic white-ish noise in `[-1, 1)`.
    fn noise(len: usize, seed: u32) -> Vec<f32> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                ((state >> 16) & 0x7fff) as f32 / 16_384.0 - 1.0
            })
            .collect()
    }

    #[test]
    fn test_silence_after_noise_has_no_drops() {
        for seed in 0..50 {
            let mut samples = noise(8_000, seed);
            samples.extend(std::iter::repeat(0.0).take(16_000));

            let map = BeatDetector::with_defaults()
                .extract(&AudioSignal::new(samples, 8_000))
                .unwrap();

            // Noise ends at 1 s (frame 30); nothing after it is a surge.
            assert!(
                map.drops.iter().all(|&d| d <= 30),
                "seed {seed}: drops in silence {:?}",
                map.drops
            );
        }
    }

    #[test]
    fn test_sustained_surge_yields_deduplicated_drops() {
        // 1 s silence, 0.5 s of constant-energy square wave, 1 s silence.
        let mut samples = vec![0.0_f32; 8_000];
        samples.extend((0..4_000).map(|n| if n % 2 == 0 { 0.5 } else { -0.5 }));
        samples.extend(std::iter::repeat(0.0).take(8_000));

        let map = BeatDetector::with_defaults()
            .extract(&AudioSignal::new(samples, 8_000))
            .unwrap();

        // Six surge windows between 0.99 s and 1.04 s collapse onto two frames.
        assert_eq!(map.drops, vec![30, 31]);
    }
}
