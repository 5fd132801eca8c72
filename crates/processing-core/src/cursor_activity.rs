//! Cursor activity analysis: the "dwell-to-zoom" algorithm.
//!
//! Finds moments where the user focuses on one spot of a recording and
//! turns each into a [`ZoomPoint`] that drives a camera push-in.
//!
//! # Algorithm
//!
//! 1. **Prepare**: drop non-finite samples, clamp coordinates into `[0, 1]`
//!    and sort by time.
//! 2. **Dwell** classification: a sample dwells when the pointer moved
//!    slower than the velocity threshold since the previous sample, or
//!    when it is a click.
//! 3. **Cluster** consecutive dwell samples that stay within the dwell
//!    radius of the running centroid without long time gaps. A cluster
//!    qualifies if it contains a click or lasts long enough.
//! 4. **Score**: the centroid is the target; tighter clusters and more
//!    clicks give a larger scale, bounded by the configured maximum. The
//!    hold lasts for the cluster span, but never less than the minimum.
//! 5. **Merge** zoom points that would overlap or sit closer than the
//!    minimum gap, so the output is ordered and non-overlapping.

use beatsync_common::config::AnalysisDefaults;
use beatsync_project_model::cursor::{CursorSample, ZoomPoint};
use serde::{Deserialize, Serialize};

/// Shortest hold ever emitted, whatever the configuration says.
const MIN_HOLD_SECS: f64 = 0.1;

/// Smallest scale ever emitted; zoom points always magnify.
const MIN_SCALE: f64 = 1.01;

/// Configuration for the cursor activity analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoomConfig {
    /// Fewer prepared samples than this produce no zoom points.
    pub min_samples: usize,

    /// Maximum velocity considered "dwell" (normalized units per second).
    pub dwell_velocity_threshold: f64,

    /// Maximum distance (normalized) from the running centroid for a
    /// sample to join the current cluster.
    pub dwell_radius: f64,

    /// A time gap longer than this between samples ends a cluster.
    pub max_sample_gap_secs: f64,

    /// Click-free clusters must last at least this long.
    pub min_dwell_secs: f64,

    /// Scale for a loose, click-free cluster.
    pub min_scale: f64,

    /// Upper bound on zoom scale.
    pub max_scale: f64,

    /// Clicks needed for the click contribution to saturate.
    pub clicks_for_full_scale: usize,

    /// Shortest zoom hold.
    pub min_duration_secs: f64,

    /// Zoom points closer than this are merged.
    pub min_gap_secs: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_samples: 5,
            dwell_velocity_threshold: 0.18,
            dwell_radius: 0.15,
            max_sample_gap_secs: 0.5,
            min_dwell_secs: 0.5,
            min_scale: 1.5,
            max_scale: 2.5,
            clicks_for_full_scale: 3,
            min_duration_secs: 1.2,
            min_gap_secs: 0.5,
        }
    }
}

impl From<&AnalysisDefaults> for ZoomConfig {
    fn from(defaults: &AnalysisDefaults) -> Self {
        Self {
            max_scale: defaults.zoom_max_scale,
            min_duration_secs: defaults.zoom_min_duration_secs,
            ..Default::default()
        }
    }
}

/// A qualifying group of dwell samples, before merging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DwellCluster {
    /// Time of the first sample (seconds).
    pub start_secs: f64,
    /// Time of the last sample (seconds).
    pub end_secs: f64,
    /// Average pointer position.
    pub centroid: (f64, f64),
    /// Maximum distance from centroid.
    pub spread: f64,
    pub sample_count: usize,
    pub click_count: usize,
}

impl DwellCluster {
    pub fn span_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// The cursor activity analyzer.
#[derive(Debug, Clone, Default)]
pub struct CursorActivityAnalyzer {
    config: ZoomConfig,
}

/// Zoom candidate carrying the weight needed for merging.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    time: f64,
    end: f64,
    x: f64,
    y: f64,
    scale: f64,
    weight: f64,
}

impl CursorActivityAnalyzer {
    /// Create a new analyzer with the given configuration.
    pub fn new(config: ZoomConfig) -> Self {
        Self { config }
    }

    /// Create an analyzer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ZoomConfig::default())
    }

    pub fn config(&self) -> &ZoomConfig {
        &self.config
    }

    /// Detect zoom points in a recording's pointer samples.
    ///
    /// Never fails: too few samples or no focus moments yield an empty list.
    pub fn detect_zoom_points(&self, samples: &[CursorSample]) -> Vec<ZoomPoint> {
        let (points, _) = self.analyze_with_clusters(samples);
        points
    }

    /// Detect zoom points and return the dwell clusters they came from.
    pub fn analyze_with_clusters(
        &self,
        samples: &[CursorSample],
    ) -> (Vec<ZoomPoint>, Vec<DwellCluster>) {
        let prepared = prepare_samples(samples);
        if prepared.is_empty() || prepared.len() < self.config.min_samples {
            tracing::debug!(
                samples = prepared.len(),
                min = self.config.min_samples,
                "too few cursor samples for zoom detection"
            );
            return (vec![], vec![]);
        }

        let clusters = self.find_clusters(&prepared);
        let candidates: Vec<Candidate> = clusters.iter().map(|c| self.score(c)).collect();
        let points = self.merge(&candidates);

        tracing::debug!(
            samples = prepared.len(),
            clusters = clusters.len(),
            zoom_points = points.len(),
            "cursor activity analysis complete"
        );

        (points, clusters)
    }

    /// Group consecutive dwell samples into qualifying clusters.
    pub fn find_clusters(&self, samples: &[CursorSample]) -> Vec<DwellCluster> {
        let mut clusters = vec![];
        let mut current: Vec<CursorSample> = vec![];
        let mut sum = (0.0, 0.0);

        for (i, sample) in samples.iter().enumerate() {
            let velocity = if i == 0 {
                0.0
            } else {
                Self::compute_velocity(&samples[i - 1], sample)
            };
            let is_dwell = sample.is_click() || velocity <= self.config.dwell_velocity_threshold;

            let fits = current
                .last()
                .map(|last| {
                    let n = current.len() as f64;
                    let centroid = (sum.0 / n, sum.1 / n);
                    let distance =
                        ((sample.x - centroid.0).powi(2) + (sample.y - centroid.1).powi(2)).sqrt();
                    sample.t - last.t <= self.config.max_sample_gap_secs
                        && distance <= self.config.dwell_radius
                })
                .unwrap_or(true);

            if !(is_dwell && fits) {
                if let Some(cluster) = self.close_cluster(&current) {
                    clusters.push(cluster);
                }
                current.clear();
                sum = (0.0, 0.0);
            }

            if is_dwell {
                current.push(*sample);
                sum.0 += sample.x;
                sum.1 += sample.y;
            }
        }

        if let Some(cluster) = self.close_cluster(&current) {
            clusters.push(cluster);
        }

        clusters
    }

    /// Summarize a run of dwell samples, or `None` if it does not qualify.
    fn close_cluster(&self, samples: &[CursorSample]) -> Option<DwellCluster> {
        let first = samples.first()?;
        let last = samples.last()?;

        let click_count = samples.iter().filter(|s| s.is_click()).count();
        let span = last.t - first.t;
        let long_enough = samples.len() >= 2 && span >= self.config.min_dwell_secs;
        if click_count == 0 && !long_enough {
            return None;
        }

        let positions: Vec<(f64, f64)> = samples.iter().map(|s| (s.x, s.y)).collect();
        let centroid = Self::compute_centroid(&positions);
        let spread = Self::compute_spread(&positions, centroid);

        Some(DwellCluster {
            start_secs: first.t,
            end_secs: last.t,
            centroid,
            spread,
            sample_count: samples.len(),
            click_count,
        })
    }

    /// Turn a cluster into a zoom candidate.
    fn score(&self, cluster: &DwellCluster) -> Candidate {
        let min_scale = self.config.min_scale.max(MIN_SCALE);
        let max_scale = self.config.max_scale.max(min_scale);

        let concentration = if self.config.dwell_radius > 0.0 {
            1.0 - (cluster.spread / self.config.dwell_radius).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let click_factor = if self.config.clicks_for_full_scale == 0 {
            if cluster.click_count > 0 {
                1.0
            } else {
                0.0
            }
        } else {
            (cluster.click_count as f64 / self.config.clicks_for_full_scale as f64).min(1.0)
        };

        let intensity = 0.5 * concentration + 0.5 * click_factor;
        let scale = (min_scale + (max_scale - min_scale) * intensity).clamp(min_scale, max_scale);
        let duration = cluster
            .span_secs()
            .max(self.config.min_duration_secs)
            .max(MIN_HOLD_SECS);

        Candidate {
            time: cluster.start_secs,
            end: cluster.start_secs + duration,
            x: cluster.centroid.0,
            y: cluster.centroid.1,
            scale,
            weight: cluster.sample_count as f64,
        }
    }

    /// Merge candidates closer than the minimum gap into one hold.
    fn merge(&self, candidates: &[Candidate]) -> Vec<ZoomPoint> {
        let min_gap = self.config.min_gap_secs.max(0.0);
        let mut merged: Vec<Candidate> = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            match merged.last_mut() {
                Some(previous) if candidate.time < previous.end + min_gap => {
                    let weight = previous.weight + candidate.weight;
                    previous.x = (previous.x * previous.weight + candidate.x * candidate.weight)
                        / weight;
                    previous.y = (previous.y * previous.weight + candidate.y * candidate.weight)
                        / weight;
                    previous.scale = previous.scale.max(candidate.scale);
                    previous.end = previous.end.max(candidate.end);
                    previous.weight = weight;
                }
                _ => merged.push(*candidate),
            }
        }

        merged
            .into_iter()
            .map(|c| ZoomPoint {
                time: c.time,
                x: c.x.clamp(0.0, 1.0),
                y: c.y.clamp(0.0, 1.0),
                scale: c.scale,
                duration: c.end - c.time,
            })
            .collect()
    }

    /// Compute the centroid (average position) of a set of points.
    fn compute_centroid(positions: &[(f64, f64)]) -> (f64, f64) {
        let n = positions.len() as f64;
        let sum_x: f64 = positions.iter().map(|(x, _)| x).sum();
        let sum_y: f64 = positions.iter().map(|(_, y)| y).sum();
        (sum_x / n, sum_y / n)
    }

    /// Compute the maximum spread (distance from centroid).
    fn compute_spread(positions: &[(f64, f64)], centroid: (f64, f64)) -> f64 {
        positions
            .iter()
            .map(|(x, y)| ((x - centroid.0).powi(2) + (y - centroid.1).powi(2)).sqrt())
            .fold(0.0_f64, f64::max)
    }

    /// Pointer speed between two samples (normalized units per second).
    /// Simultaneous samples count as stationary.
    fn compute_velocity(previous: &CursorSample, current: &CursorSample) -> f64 {
        let dt = current.t - previous.t;
        if dt <= 1e-9 {
            return 0.0;
        }
        previous.distance_to(current) / dt
    }
}

/// Drop non-finite samples, clamp coordinates and sort by time.
fn prepare_samples(samples: &[CursorSample]) -> Vec<CursorSample> {
    let mut prepared: Vec<CursorSample> = samples
        .iter()
        .filter(|s| s.is_finite())
        .map(|s| CursorSample {
            x: s.x.clamp(0.0, 1.0),
            y: s.y.clamp(0.0, 1.0),
            ..*s
        })
        .collect();
    prepared.sort_by(|a, b| a.t.total_cmp(&b.t));
    prepared
}
