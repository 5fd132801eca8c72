//! Frame clock and sampling utilities.
//!
//! Every Beatsync output is addressed in frames at a fixed output rate
//! (canonically 30 fps). This module provides utilities for:
//! - Converting between seconds and frame indices
//! - Deriving the (fractional) number of frames per musical beat
//! - Gating fixed-interval pointer sampling

use crate::error::{BeatsyncError, BeatsyncResult};

/// Canonical output frame rate.
pub const DEFAULT_FPS: u32 = 30;

/// A fixed-rate frame clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    fps: u32,
}

impl FrameClock {
    /// Create a clock running at `fps` frames per second.
    pub fn new(fps: u32) -> BeatsyncResult<Self> {
        if fps == 0 {
            return Err(BeatsyncError::invalid_input("frame rate must be positive"));
        }
        Ok(Self { fps })
    }

    /// Frames per second.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Convert seconds to the nearest frame index. Negative input maps to 0.
    pub fn secs_to_frames(&self, secs: f64) -> u64 {
        if !secs.is_finite() || secs <= 0.0 {
            return 0;
        }
        (secs * self.fps as f64).round() as u64
    }

    /// Convert a frame count to seconds.
    pub fn frames_to_secs(&self, frames: u64) -> f64 {
        frames as f64 / self.fps as f64
    }

    /// Frames spanned by one beat at `bpm`. Not necessarily integral.
    pub fn frames_per_beat(&self, bpm: f64) -> f64 {
        (60.0 / bpm) * self.fps as f64
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self { fps: DEFAULT_FPS }
    }
}

/// Rate controller for fixed-interval pointer sampling.
///
/// Timestamps are in seconds since the start of a capture session.
#[derive(Debug)]
pub struct RateController {
    target_interval_secs: f64,
    last_tick_secs: Option<f64>,
}

impl RateController {
    /// Create a controller targeting the given Hz rate. A zero rate
    /// disables gating entirely.
    pub fn new(target_hz: u32) -> Self {
        let target_interval_secs = if target_hz == 0 {
            0.0
        } else {
            1.0 / target_hz as f64
        };
        Self {
            target_interval_secs,
            last_tick_secs: None,
        }
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, current_secs: f64) -> bool {
        match self.last_tick_secs {
            None => {
                self.last_tick_secs = Some(current_secs);
                true
            }
            // Small slack so 1/hz steps survive float rounding.
            Some(last) if current_secs + 1e-9 >= last + self.target_interval_secs => {
                self.last_tick_secs = Some(current_secs);
                true
            }
            _ => false,
        }
    }

    /// Target interval in seconds.
    pub fn interval_secs(&self) -> f64 {
        self.target_interval_secs
    }

    /// Forget the last tick so the next call fires immediately.
    pub fn reset(&mut self) {
        self.last_tick_secs = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_fps_is_rejected() {
        assert!(FrameClock::new(0).is_err());
        assert_eq!(FrameClock::new(24).unwrap().fps(), 24);
    }

    #[test]
    fn test_secs_frames_conversion() {
        let clock = FrameClock::default();
        assert_eq!(clock.secs_to_frames(2.5), 75);
        assert_eq!(clock.secs_to_frames(-1.0), 0);
        assert_eq!(clock.secs_to_frames(f64::NAN), 0);
        assert!((clock.frames_to_secs(45) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_frames_per_beat() {
        let clock = FrameClock::default();
        assert!((clock.frames_per_beat(120.0) - 15.0).abs() < 1e-9);
        assert!((clock.frames_per_beat(128.0) - 14.0625).abs() < 1e-9);
    }

    #[test]
    fn test_rate_controller() {
        let mut ctrl = RateController::new(30);
        assert!(ctrl.should_tick(0.0)); // first tick always fires
        assert!(!ctrl.should_tick(0.01)); // 10ms later, too soon
        assert!(ctrl.should_tick(0.034)); // past the 33ms interval

        ctrl.reset();
        assert!(ctrl.should_tick(0.035));
    }

    #[test]
    fn test_zero_rate_never_gates() {
        let mut ctrl = RateController::new(0);
        assert!(ctrl.should_tick(1.0));
        assert!(ctrl.should_tick(1.0));
    }
}
