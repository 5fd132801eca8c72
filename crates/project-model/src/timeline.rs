//! Compiled scene schedules.
//!
//! A timeline is the contiguous, frame-addressed scene sequence the
//! renderer plays back. Draft scripts from the content generator use the
//! same shape before compilation, hence the [`VideoScript`] alias.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::beat_map::FrameIndex;
use crate::scene::Scene;

/// Ordered scene schedule with its total length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    /// Total length in frames; equals the last scene's end frame once
    /// compiled.
    #[serde(rename = "totalDuration", default)]
    pub total_duration_frames: u64,

    pub scenes: Vec<Scene>,
}

/// A draft or compiled scene list, as exchanged with the content generator.
pub type VideoScript = Timeline;

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a timeline whose total is taken from the last scene.
    pub fn from_scenes(scenes: Vec<Scene>) -> Self {
        let total_duration_frames = scenes.last().map(|s| s.end_frame).unwrap_or(0);
        Self {
            total_duration_frames,
            scenes,
        }
    }

    /// Length in seconds at `fps`.
    pub fn duration_secs(&self, fps: u32) -> f64 {
        if fps == 0 {
            return 0.0;
        }
        self.total_duration_frames as f64 / fps as f64
    }

    /// The scene playing at `frame`, if any.
    pub fn scene_at(&self, frame: FrameIndex) -> Option<&Scene> {
        self.scenes
            .iter()
            .find(|s| frame >= s.start_frame && frame < s.end_frame)
    }

    /// Check the contiguity invariant: first scene starts at 0, each scene
    /// starts where the previous ended, every scene is non-empty, and the
    /// total equals the last end frame.
    pub fn validate(&self) -> Result<(), TimelineError> {
        let Some(first) = self.scenes.first() else {
            return Err(TimelineError::Empty);
        };
        if first.start_frame != 0 {
            return Err(TimelineError::DoesNotStartAtZero {
                start_frame: first.start_frame,
            });
        }

        for (index, scene) in self.scenes.iter().enumerate() {
            if scene.end_frame <= scene.start_frame {
                return Err(TimelineError::EmptyScene {
                    id: scene.id.clone(),
                });
            }
            if index > 0 {
                let previous_end = self.scenes[index - 1].end_frame;
                if scene.start_frame != previous_end {
                    return Err(TimelineError::Gap {
                        id: scene.id.clone(),
                        expected: previous_end,
                        found: scene.start_frame,
                    });
                }
            }
        }

        let last_end = self.scenes.last().map(|s| s.end_frame).unwrap_or(0);
        if self.total_duration_frames != last_end {
            return Err(TimelineError::TotalMismatch {
                total: self.total_duration_frames,
                last_end,
            });
        }

        Ok(())
    }

    /// Load a timeline (or draft script) from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TimelineError> {
        let path = path.as_ref().to_path_buf();
        let json = std::fs::read_to_string(&path).map_err(|e| TimelineError::IoError {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| TimelineError::ParseError { path, source: e })
    }

    /// Save the timeline as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TimelineError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TimelineError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| TimelineError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        std::fs::write(&path, json).map_err(|e| TimelineError::IoError { path, source: e })
    }
}

/// Errors that can occur when validating or persisting timelines.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("timeline has no scenes")]
    Empty,

    #[error("first scene starts at frame {start_frame}, expected 0")]
    DoesNotStartAtZero { start_frame: FrameIndex },

    #[error("scene `{id}` has no frames")]
    EmptyScene { id: String },

    #[error("scene `{id}` starts at frame {found}, expected {expected}")]
    Gap {
        id: String,
        expected: FrameIndex,
        found: FrameIndex,
    },

    #[error("total duration {total} does not match last end frame {last_end}")]
    TotalMismatch { total: u64, last_end: FrameIndex },

    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneContent, SceneType};

    fn scene(id: &str, start: u64, end: u64, kind: SceneType) -> Scene {
        Scene::new(id, start, end, SceneContent::empty(kind))
    }

    #[test]
    fn test_contiguous_timeline_validates() {
        let timeline = Timeline::from_scenes(vec![
            scene("a", 0, 105, SceneType::Intro),
            scene("b", 105, 225, SceneType::Feature),
            scene("c", 225, 255, SceneType::Cta),
        ]);
        assert_eq!(timeline.total_duration_frames, 255);
        assert!(timeline.validate().is_ok());
        assert_eq!(timeline.scene_at(105).unwrap().id, "b");
        assert!(timeline.scene_at(255).is_none());
        assert!((timeline.duration_secs(30) - 8.5).abs() < 1e-9);
    }

    #[test]
    fn test_gap_is_reported() {
        let timeline = Timeline::from_scenes(vec![
            scene("a", 0, 100, SceneType::Intro),
            scene("b", 110, 200, SceneType::Cta),
        ]);
        match timeline.validate() {
            Err(TimelineError::Gap {
                id,
                expected,
                found,
            }) => {
                assert_eq!(id, "b");
                assert_eq!(expected, 100);
                assert_eq!(found, 110);
            }
            other => panic!("expected gap error, got {other:?}"),
        }
    }

    #[test]
    fn test_total_mismatch_and_empty() {
        let mut timeline = Timeline::from_scenes(vec![scene("a", 0, 30, SceneType::Cta)]);
        timeline.total_duration_frames = 40;
        assert!(matches!(
            timeline.validate(),
            Err(TimelineError::TotalMismatch { .. })
        ));
        assert!(matches!(Timeline::new().validate(), Err(TimelineError::Empty)));
    }

    #[test]
    fn test_wire_format_uses_total_duration() {
        let timeline = Timeline::from_scenes(vec![scene("a", 0, 30, SceneType::Cta)]);
        let json = serde_json::to_value(&timeline).unwrap();
        assert_eq!(json["totalDuration"], 30);
        assert_eq!(json["scenes"][0]["type"], "cta");
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join("beatsync_test_timeline");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("timeline.json");

        let timeline = Timeline::from_scenes(vec![
            scene("a", 0, 45, SceneType::Intro),
            scene("b", 45, 90, SceneType::Cta),
        ]);
        timeline.save(&path).unwrap();
        assert_eq!(Timeline::load(&path).unwrap(), timeline);

        std::fs::remove_dir_all(&dir).ok();
    }
}
