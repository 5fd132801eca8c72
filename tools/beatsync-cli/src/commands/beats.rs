//! Extract or synthesize a beat map.

use std::path::{Path, PathBuf};

use anyhow::Context;
use beatsync_common::config::AnalysisDefaults;
use beatsync_processing_core::{beat_map_from_bpm, AudioSignal, BeatDetectionConfig, BeatDetector};

pub struct BeatsArgs {
    pub input: Option<PathBuf>,
    pub bpm: Option<f64>,
    pub frames: Option<u64>,
    pub fps: Option<u32>,
    pub min_bpm: Option<f64>,
    pub max_bpm: Option<f64>,
    pub threshold: Option<f64>,
    pub output: Option<PathBuf>,
}

pub fn run(args: BeatsArgs, defaults: &AnalysisDefaults) -> anyhow::Result<()> {
    let mut config = BeatDetectionConfig::from(defaults);
    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    if let Some(min_bpm) = args.min_bpm {
        config.min_bpm = min_bpm;
    }
    if let Some(max_bpm) = args.max_bpm {
        config.max_bpm = max_bpm;
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }

    let beat_map = match (args.bpm, args.input) {
        (Some(bpm), _) => {
            let frames = args.frames.unwrap_or_default();
            tracing::info!(bpm, frames, "synthesizing beat grid");
            beat_map_from_bpm(bpm, frames, config.fps)?
        }
        (None, Some(input)) => {
            let signal = read_wav(&input)?;
            tracing::info!(
                path = %input.display(),
                sample_rate = signal.sample_rate,
                duration_secs = signal.duration_secs(),
                "analyzing audio"
            );
            BeatDetector::new(config).extract(&signal)?
        }
        (None, None) => anyhow::bail!("either an input WAV or --bpm is required"),
    };

    tracing::info!(
        bpm = beat_map.bpm,
        beats = beat_map.beat_count(),
        drops = beat_map.drops.len(),
        "beat map ready"
    );

    super::write_json(&beat_map, args.output.as_deref())
}

/// Decode a WAV file into a mono signal (first channel).
fn read_wav(path: &Path) -> anyhow::Result<AudioSignal> {
    super::ensure_exists(path)?;
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file {}", path.display()))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to decode float samples")?,
        hound::SampleFormat::Int => {
            let full_scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to decode integer samples")?
        }
    };

    Ok(AudioSignal::from_interleaved(
        &interleaved,
        spec.channels,
        spec.sample_rate,
    ))
}
