//! Detect camera zoom points in recorded cursor samples.

use std::path::PathBuf;

use anyhow::Context;
use beatsync_common::config::AnalysisDefaults;
use beatsync_processing_core::{CursorActivityAnalyzer, DwellCluster, ZoomConfig};
use beatsync_project_model::cursor::{parse_samples, ZoomPoint};
use serde::Serialize;

pub struct ZoomArgs {
    pub samples: PathBuf,
    pub max_scale: Option<f64>,
    pub min_duration: Option<f64>,
    pub dwell_radius: Option<f64>,
    pub dwell_velocity: Option<f64>,
    pub clusters: bool,
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ZoomReport {
    zoom_points: Vec<ZoomPoint>,
    clusters: Vec<DwellCluster>,
}

pub fn run(args: ZoomArgs, defaults: &AnalysisDefaults) -> anyhow::Result<()> {
    let content = super::read_input(&args.samples)?;
    let samples = parse_samples(&content)
        .with_context(|| format!("Failed to parse samples {}", args.samples.display()))?;

    let mut config = ZoomConfig::from(defaults);
    if let Some(max_scale) = args.max_scale {
        config.max_scale = max_scale;
    }
    if let Some(min_duration) = args.min_duration {
        config.min_duration_secs = min_duration;
    }
    if let Some(radius) = args.dwell_radius {
        config.dwell_radius = radius;
    }
    if let Some(velocity) = args.dwell_velocity {
        config.dwell_velocity_threshold = velocity;
    }

    let analyzer = CursorActivityAnalyzer::new(config);
    let (zoom_points, clusters) = analyzer.analyze_with_clusters(&samples);

    tracing::info!(
        samples = samples.len(),
        clusters = clusters.len(),
        zoom_points = zoom_points.len(),
        "zoom analysis complete"
    );

    if args.clusters {
        super::write_json(
            &ZoomReport {
                zoom_points,
                clusters,
            },
            args.output.as_deref(),
        )
    } else {
        super::write_json(&zoom_points, args.output.as_deref())
    }
}
