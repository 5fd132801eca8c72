//! Compile a scene script onto the beat grid.

use std::path::PathBuf;

use anyhow::Context;
use beatsync_common::config::AnalysisDefaults;
use beatsync_processing_core::{CompileOptions, TimelineCompiler};
use beatsync_project_model::beat_map::BeatMap;
use beatsync_project_model::script::{parse_script, parse_script_or_fallback};

pub struct CompileArgs {
    pub script: PathBuf,
    pub bpm: Option<f64>,
    pub beat_map: Option<PathBuf>,
    pub target_secs: Option<f64>,
    pub screenshots: Vec<String>,
    pub fallback_title: Option<String>,
    pub output: Option<PathBuf>,
}

pub fn run(args: CompileArgs, defaults: &AnalysisDefaults) -> anyhow::Result<()> {
    let raw = super::read_input(&args.script)?;

    let script = match &args.fallback_title {
        Some(title) => parse_script_or_fallback(&raw, title),
        None => parse_script(&raw)
            .with_context(|| format!("Failed to parse script {}", args.script.display()))?,
    };

    let bpm = match (args.bpm, &args.beat_map) {
        (Some(bpm), _) => bpm,
        (None, Some(path)) => {
            let json = super::read_input(path)?;
            let beat_map: BeatMap = serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse beat map {}", path.display()))?;
            beat_map.bpm
        }
        (None, None) => anyhow::bail!("either --bpm or --beat-map is required"),
    };

    tracing::info!(
        scenes = script.scenes.len(),
        bpm,
        target_secs = ?args.target_secs,
        "compiling timeline"
    );

    let compiler = TimelineCompiler::new(CompileOptions::from(defaults));
    let timeline =
        compiler.compile_with_assets(&script.scenes, bpm, args.target_secs, &args.screenshots)?;

    timeline
        .validate()
        .context("Compiled timeline failed validation")?;

    tracing::info!(
        scenes = timeline.scenes.len(),
        total_frames = timeline.total_duration_frames,
        duration_secs = timeline.duration_secs(compiler.options().fps),
        "timeline compiled"
    );

    super::write_json(&timeline, args.output.as_deref())
}
