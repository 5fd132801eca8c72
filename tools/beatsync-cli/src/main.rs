//! Beatsync CLI: command-line driver for the beat-sync pipeline.
//!
//! Usage:
//!   beatsync beats <WAV>          Extract a beat map from a WAV file
//!   beatsync beats --bpm N ...    Synthesize a beat grid for a known tempo
//!   beatsync compile <SCRIPT>     Compile a scene script onto the beat grid
//!   beatsync zoom <SAMPLES>       Detect camera zoom points in cursor samples

use std::path::PathBuf;

use beatsync_common::config::AppConfig;
use beatsync_common::logging::init_logging;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "beatsync",
    about = "Beat-synchronized timelines for product videos",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the standard location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a beat map from a WAV file, or synthesize one from a tempo
    Beats {
        /// WAV file to analyze
        #[arg(required_unless_present = "bpm")]
        input: Option<PathBuf>,

        /// Skip analysis and build a grid at this tempo
        #[arg(long, conflicts_with = "input", requires = "frames")]
        bpm: Option<f64>,

        /// Grid length in frames (with --bpm)
        #[arg(long)]
        frames: Option<u64>,

        /// Output frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Lowest accepted tempo
        #[arg(long)]
        min_bpm: Option<f64>,

        /// Highest accepted tempo
        #[arg(long)]
        max_bpm: Option<f64>,

        /// Normalized energy threshold for beat peaks
        #[arg(long)]
        threshold: Option<f64>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile a scene script into a beat-aligned timeline
    Compile {
        /// Script JSON (fenced or loosely formatted text is repaired)
        script: PathBuf,

        /// Tempo to align to
        #[arg(long, required_unless_present = "beat_map", conflicts_with = "beat_map")]
        bpm: Option<f64>,

        /// Beat map JSON produced by `beatsync beats`
        #[arg(long)]
        beat_map: Option<PathBuf>,

        /// Desired video length in seconds (10-120)
        #[arg(long)]
        target_secs: Option<f64>,

        /// Screenshot asset that must appear in the timeline (repeatable)
        #[arg(long = "screenshot")]
        screenshots: Vec<String>,

        /// Substitute a minimal script with this title if parsing fails
        #[arg(long)]
        fallback_title: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Detect zoom points in a cursor sample stream (JSONL)
    Zoom {
        /// Cursor samples file
        samples: PathBuf,

        /// Upper bound on zoom scale
        #[arg(long)]
        max_scale: Option<f64>,

        /// Shortest zoom hold in seconds
        #[arg(long)]
        min_duration: Option<f64>,

        /// Dwell radius threshold (normalized)
        #[arg(long)]
        dwell_radius: Option<f64>,

        /// Dwell velocity threshold (normalized units/sec)
        #[arg(long)]
        dwell_velocity: Option<f64>,

        /// Include dwell cluster diagnostics in the output
        #[arg(long)]
        clusters: bool,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    init_logging(&logging);

    let defaults = &config.analysis;

    match cli.command {
        Commands::Beats {
            input,
            bpm,
            frames,
            fps,
            min_bpm,
            max_bpm,
            threshold,
            output,
        } => commands::beats::run(
            commands::beats::BeatsArgs {
                input,
                bpm,
                frames,
                fps,
                min_bpm,
                max_bpm,
                threshold,
                output,
            },
            defaults,
        ),
        Commands::Compile {
            script,
            bpm,
            beat_map,
            target_secs,
            screenshots,
            fallback_title,
            output,
        } => commands::compile::run(
            commands::compile::CompileArgs {
                script,
                bpm,
                beat_map,
                target_secs,
                screenshots,
                fallback_title,
                output,
            },
            defaults,
        ),
        Commands::Zoom {
            samples,
            max_scale,
            min_duration,
            dwell_radius,
            dwell_velocity,
            clusters,
            output,
        } => commands::zoom::run(
            commands::zoom::ZoomArgs {
                samples,
                max_scale,
                min_duration,
                dwell_radius,
                dwell_velocity,
                clusters,
                output,
            },
            defaults,
        ),
    }
}
