//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Analysis and compilation defaults.
    #[serde(default)]
    pub analysis: AnalysisDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default parameters for beat detection, timeline compilation, and
/// zoom-point detection. Components receive these as explicit config
/// structs; nothing reads them globally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisDefaults {
    /// Output frame rate.
    pub fps: u32,

    /// Lower bound of accepted tempo.
    pub min_bpm: f64,

    /// Upper bound of accepted tempo.
    pub max_bpm: f64,

    /// Normalized energy threshold for beat peaks.
    pub threshold: f64,

    /// Length of the synthesized closing call-to-action scene.
    pub cta_duration_secs: f64,

    /// Length of the synthesized screenshot scene.
    pub screenshot_duration_secs: f64,

    /// Longest a single scene may become when stretched to a target length.
    pub max_scene_secs: f64,

    /// Upper bound on zoom scale.
    pub zoom_max_scale: f64,

    /// Shortest zoom hold.
    pub zoom_min_duration_secs: f64,

    /// Pointer sampling rate during capture (Hz).
    pub pointer_sample_rate_hz: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "beatsync=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            fps: 30,
            min_bpm: 80.0,
            max_bpm: 180.0,
            threshold: 0.3,
            cta_duration_secs: 3.0,
            screenshot_duration_secs: 2.5,
            max_scene_secs: 10.0,
            zoom_max_scale: 2.5,
            zoom_min_duration_secs: 1.2,
            pointer_sample_rate_hz: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("beatsync").join("config.json")
}
