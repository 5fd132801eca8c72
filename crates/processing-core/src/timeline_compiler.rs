//! Timeline compilation: turn a draft scene list into a contiguous,
//! beat-aligned frame schedule.
//!
//! # Passes
//!
//! 1. **Structure**: append a closing `cta` scene when the draft does not
//!    end with one, and splice a screenshot scene in front of it when
//!    screenshot assets exist but no scene shows them.
//! 2. **Beat snap**: round each scene's length to a whole number of beats
//!    (at least one) and re-stamp scenes back to back from frame 0.
//! 3. **Duration enforcement**: when a target length is given and the
//!    snapped timeline is shorter than 80% of it, scale every scene, clamp
//!    it to `[1 beat, 10 s]`, snap again and re-stamp.
//!
//! The result is beat-aligned and close to the requested length, but the
//! exact frame count is not guaranteed to match the target.

use beatsync_common::clock::FrameClock;
use beatsync_common::config::AnalysisDefaults;
use beatsync_common::error::{BeatsyncError, BeatsyncResult};
use beatsync_project_model::beat_map::BeatMap;
use beatsync_project_model::scene::{
    CtaContent, Scene, SceneContent, SceneType, ScreenshotContent,
};
use beatsync_project_model::timeline::Timeline;
use serde::{Deserialize, Serialize};

/// Configuration for the timeline compiler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Output frame rate.
    pub fps: u32,

    /// Length of the appended call-to-action scene.
    pub cta_duration_secs: f64,

    /// Length of the inserted screenshot scene.
    pub screenshot_duration_secs: f64,

    /// Longest a scene may be stretched during duration enforcement.
    pub max_scene_secs: f64,

    /// Targets below this are ignored.
    pub min_target_secs: f64,

    /// Targets above this are clamped down to it.
    pub max_target_secs: f64,

    /// Enforcement only runs when the snapped length is below this share
    /// of the target.
    pub enforce_below_ratio: f64,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            fps: 30,
            cta_duration_secs: 3.0,
            screenshot_duration_secs: 2.5,
            max_scene_secs: 10.0,
            min_target_secs: 10.0,
            max_target_secs: 120.0,
            enforce_below_ratio: 0.8,
        }
    }
}

impl From<&AnalysisDefaults> for CompileOptions {
    fn from(defaults: &AnalysisDefaults) -> Self {
        Self {
            fps: defaults.fps,
            cta_duration_secs: defaults.cta_duration_secs,
            screenshot_duration_secs: defaults.screenshot_duration_secs,
            max_scene_secs: defaults.max_scene_secs,
            ..Default::default()
        }
    }
}

/// The timeline compiler.
#[derive(Debug, Clone, Default)]
pub struct TimelineCompiler {
    options: CompileOptions,
}

impl TimelineCompiler {
    /// Create a compiler with the given options.
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Create a compiler with default options.
    pub fn with_defaults() -> Self {
        Self::new(CompileOptions::default())
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile `scenes` against a fixed tempo.
    pub fn compile(
        &self,
        scenes: &[Scene],
        bpm: f64,
        target_duration_secs: Option<f64>,
    ) -> BeatsyncResult<Timeline> {
        self.compile_with_assets(scenes, bpm, target_duration_secs, &[])
    }

    /// Compile `scenes` against the tempo of a beat map.
    pub fn compile_to_beat_map(
        &self,
        scenes: &[Scene],
        beat_map: &BeatMap,
        target_duration_secs: Option<f64>,
    ) -> BeatsyncResult<Timeline> {
        self.compile(scenes, beat_map.bpm, target_duration_secs)
    }

    /// Compile `scenes`, making sure one of `screenshots` is shown when
    /// the list is non-empty.
    pub fn compile_with_assets(
        &self,
        scenes: &[Scene],
        bpm: f64,
        target_duration_secs: Option<f64>,
        screenshots: &[String],
    ) -> BeatsyncResult<Timeline> {
        if scenes.is_empty() {
            return Err(BeatsyncError::invalid_input(
                "timeline requires at least one scene",
            ));
        }
        if !(bpm.is_finite() && bpm > 0.0) {
            return Err(BeatsyncError::invalid_input(format!(
                "bpm must be positive, got {bpm}"
            )));
        }
        let clock = FrameClock::new(self.options.fps)?;
        let frames_per_beat = clock.frames_per_beat(bpm);

        let mut scenes = scenes.to_vec();
        self.ensure_cta(&mut scenes, &clock);
        self.ensure_screenshot(&mut scenes, &clock, screenshots);

        for scene in &mut scenes {
            let snapped = snap_to_beats(scene.duration_frames() as f64, frames_per_beat);
            scene.end_frame = scene.start_frame + snapped;
        }
        let mut total = restamp(&mut scenes);

        tracing::debug!(
            scenes = scenes.len(),
            frames_per_beat,
            total_frames = total,
            "beat snap complete"
        );

        if let Some(target_frames) = self.target_frames(target_duration_secs, &clock) {
            if (total as f64) < self.options.enforce_below_ratio * target_frames as f64 {
                total = self.enforce_duration(&mut scenes, total, target_frames, &clock, bpm);
            }
        }

        Ok(Timeline {
            total_duration_frames: total,
            scenes,
        })
    }

    /// Append a call-to-action scene unless the draft already ends with one.
    fn ensure_cta(&self, scenes: &mut Vec<Scene>, clock: &FrameClock) {
        let Some(last) = scenes.last() else {
            return;
        };
        if last.scene_type() == SceneType::Cta {
            return;
        }

        let start = last.end_frame;
        let length = clock.secs_to_frames(self.options.cta_duration_secs).max(1);
        let id = unique_id(scenes, "cta");
        scenes.push(Scene::new(
            id,
            start,
            start + length,
            SceneContent::Cta(CtaContent::default()),
        ));
    }

    /// Splice a screenshot scene in front of the closing scene when none of
    /// `screenshots` is shown yet. The closing scene shifts forward by the
    /// inserted length.
    fn ensure_screenshot(
        &self,
        scenes: &mut Vec<Scene>,
        clock: &FrameClock,
        screenshots: &[String],
    ) {
        let Some(asset) = screenshots.first() else {
            return;
        };
        let already_shown = scenes.iter().any(|scene| {
            scene
                .screenshot_asset()
                .map(|shown| screenshots.iter().any(|s| s == shown))
                .unwrap_or(false)
        });
        if already_shown {
            return;
        }

        let cta_index = scenes.len() - 1;
        let start = scenes[cta_index].start_frame;
        let length = clock
            .secs_to_frames(self.options.screenshot_duration_secs)
            .max(1);

        let screenshot = Scene::new(
            unique_id(scenes, "screenshot"),
            start,
            start + length,
            SceneContent::Screenshot(ScreenshotContent {
                asset: asset.clone(),
                caption: None,
            }),
        );
        scenes.insert(cta_index, screenshot);

        let cta = &mut scenes[cta_index + 1];
        cta.start_frame += length;
        cta.end_frame += length;
    }

    /// Requested length in frames, or `None` when no enforcement applies.
    fn target_frames(&self, target_duration_secs: Option<f64>, clock: &FrameClock) -> Option<u64> {
        let target = target_duration_secs?;
        if !target.is_finite() || target < self.options.min_target_secs {
            tracing::warn!(target, "target duration below minimum, skipping enforcement");
            return None;
        }
        let target = target.min(self.options.max_target_secs);
        Some(clock.secs_to_frames(target))
    }

    /// Scale every scene toward the target, clamp, re-snap and re-stamp.
    fn enforce_duration(
        &self,
        scenes: &mut [Scene],
        total: u64,
        target_frames: u64,
        clock: &FrameClock,
        bpm: f64,
    ) -> u64 {
        let frames_per_beat = clock.frames_per_beat(bpm);
        let scale = target_frames as f64 / total.max(1) as f64;
        let max_frames = (self.options.max_scene_secs * clock.fps() as f64).max(frames_per_beat);

        for scene in scenes.iter_mut() {
            let scaled =
                (scene.duration_frames() as f64 * scale).clamp(frames_per_beat, max_frames);
            scene.end_frame = scene.start_frame + snap_to_beats(scaled, frames_per_beat);
        }
        let total = restamp(scenes);

        tracing::debug!(scale, target_frames, total_frames = total, "duration enforcement complete");
        total
    }
}

/// Round `frames` to the nearest whole number of beats, at least one.
fn snap_to_beats(frames: f64, frames_per_beat: f64) -> u64 {
    let beats = (frames / frames_per_beat).round();
    let snapped = (beats * frames_per_beat).round();
    let one_beat = frames_per_beat.round().max(1.0);
    snapped.max(one_beat) as u64
}

/// Lay scenes back to back from frame 0, keeping each scene's length.
/// Returns the new total.
fn restamp(scenes: &mut [Scene]) -> u64 {
    let mut cursor = 0;
    for scene in scenes.iter_mut() {
        let length = scene.duration_frames();
        scene.start_frame = cursor;
        scene.end_frame = cursor + length;
        cursor += length;
    }
    cursor
}

fn unique_id(scenes: &[Scene], base: &str) -> String {
    let taken = |id: &str| scenes.iter().any(|s| s.id == id);
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|id| !taken(id))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatsync_project_model::scene::IntroContent;

    fn scene(id: &str, start: u64, end: u64, kind: SceneType) -> Scene {
        Scene::new(id, start, end, SceneContent::empty(kind))
    }

    fn draft() -> Vec<Scene> {
        vec![
            scene("intro", 0, 100, SceneType::Intro),
            scene("feature", 100, 220, SceneType::Feature),
            scene("cta", 220, 250, SceneType::Cta),
        ]
    }

    fn spans(timeline: &Timeline) -> Vec<(u64, u64)> {
        timeline
            .scenes
            .iter()
            .map(|s| (s.start_frame, s.end_frame))
            .collect()
    }

    #[test]
    fn test_snaps_durations_to_whole_beats() {
        let timeline = TimelineCompiler::with_defaults()
            .compile(&draft(), 120.0, None)
            .unwrap();

        assert_eq!(spans(&timeline), vec![(0, 105), (105, 225), (225, 255)]);
        assert_eq!(timeline.total_duration_frames, 255);
        assert!(timeline.validate().is_ok());
    }

    #[test]
    fn test_short_timeline_is_stretched_toward_target() {
        let timeline = TimelineCompiler::with_defaults()
            .compile(&draft(), 120.0, Some(20.0))
            .unwrap();

        // 255 < 0.8 * 600, so durations scale by 600/255 before re-snapping.
        assert_eq!(spans(&timeline), vec![(0, 240), (240, 525), (525, 600)]);
        assert_eq!(timeline.total_duration_frames, 600);
        assert!(timeline.validate().is_ok());
    }

    #[test]
    fn test_long_enough_timeline_is_left_alone() {
        let compiler = TimelineCompiler::with_defaults();
        // 255 frames >= 0.8 * 300 frames (10 s)
        let timeline = compiler.compile(&draft(), 120.0, Some(10.0)).unwrap();
        assert_eq!(timeline.total_duration_frames, 255);
    }

    #[test]
    fn test_target_below_minimum_is_ignored() {
        let timeline = TimelineCompiler::with_defaults()
            .compile(&draft(), 120.0, Some(5.0))
            .unwrap();
        assert_eq!(timeline.total_duration_frames, 255);
    }

    #[test]
    fn test_target_above_maximum_is_clamped_and_scenes_capped() {
        let timeline = TimelineCompiler::with_defaults()
            .compile(&draft(), 120.0, Some(500.0))
            .unwrap();
        // Each scene hits the 10 s (300 frame) cap, which is 20 whole beats.
        assert_eq!(spans(&timeline), vec![(0, 300), (300, 600), (600, 900)]);
    }

    #[test]
    fn test_appends_cta_when_missing() {
        let scenes = vec![
            scene("intro", 0, 90, SceneType::Intro),
            scene("feature", 90, 180, SceneType::Feature),
        ];
        let timeline = TimelineCompiler::with_defaults()
            .compile(&scenes, 120.0, None)
            .unwrap();

        let last = timeline.scenes.last().unwrap();
        assert_eq!(last.scene_type(), SceneType::Cta);
        assert_eq!(last.id, "cta");
        assert_eq!(last.duration_frames(), 90);
        assert_eq!(timeline.total_duration_frames, 270);
    }

    #[test]
    fn test_generated_cta_id_does_not_collide() {
        let scenes = vec![scene("cta", 0, 90, SceneType::Intro)];
        let timeline = TimelineCompiler::with_defaults()
            .compile(&scenes, 120.0, None)
            .unwrap();
        assert_eq!(timeline.scenes[1].id, "cta-2");
    }

    #[test]
    fn test_inserts_screenshot_before_cta() {
        let screenshots = vec!["shot.png".to_string()];
        let timeline = TimelineCompiler::with_defaults()
            .compile_with_assets(&draft(), 120.0, None, &screenshots)
            .unwrap();

        let kinds: Vec<SceneType> = timeline.scenes.iter().map(Scene::scene_type).collect();
        assert_eq!(
            kinds,
            vec![
                SceneType::Intro,
                SceneType::Feature,
                SceneType::Screenshot,
                SceneType::Cta
            ]
        );
        assert_eq!(timeline.scenes[2].screenshot_asset(), Some("shot.png"));
        // 2.5 s = 75 frames = 5 beats at 120 BPM
        assert_eq!(spans(&timeline)[2], (225, 300));
        assert_eq!(spans(&timeline)[3], (300, 330));
        assert!(timeline.validate().is_ok());
    }

    #[test]
    fn test_inserted_screenshot_is_stretched_with_timeline() {
        let screenshots = vec!["shot.png".to_string()];
        let timeline = TimelineCompiler::with_defaults()
            .compile_with_assets(&draft(), 120.0, Some(20.0), &screenshots)
            .unwrap();

        let kinds: Vec<SceneType> = timeline.scenes.iter().map(Scene::scene_type).collect();
        assert_eq!(
            kinds,
            vec![
                SceneType::Intro,
                SceneType::Feature,
                SceneType::Screenshot,
                SceneType::Cta
            ]
        );
        assert_eq!(timeline.scenes[2].id, "screenshot");
        assert_eq!(timeline.scenes[2].screenshot_asset(), Some("shot.png"));
        // 330 < 0.8 * 600, so all four scenes scale by 600/330 and re-snap.
        assert_eq!(
            spans(&timeline),
            vec![(0, 195), (195, 420), (420, 555), (555, 615)]
        );
        assert_eq!(timeline.total_duration_frames, 615);
        assert!(timeline.validate().is_ok());
    }

    #[test]
    fn test_existing_screenshot_scene_suppresses_insertion() {
        let mut scenes = draft();
        scenes.insert(
            2,
            Scene::new(
                "shot",
                220,
                250,
                SceneContent::Screenshot(ScreenshotContent {
                    asset: "shot.png".to_string(),
                    caption: None,
                }),
            ),
        );
        let screenshots = vec!["shot.png".to_string()];
        let timeline = TimelineCompiler::with_defaults()
            .compile_with_assets(&scenes, 120.0, None, &screenshots)
            .unwrap();
        let count = timeline
            .scenes
            .iter()
            .filter(|s| s.scene_type() == SceneType::Screenshot)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_recompiling_is_stable() {
        let compiler = TimelineCompiler::with_defaults();
        let once = compiler.compile(&draft(), 128.0, None).unwrap();
        let twice = compiler.compile(&once.scenes, 128.0, None).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_tiny_scene_gets_one_beat() {
        let scenes = vec![scene("cta", 0, 2, SceneType::Cta)];
        let timeline = TimelineCompiler::with_defaults()
            .compile(&scenes, 120.0, None)
            .unwrap();
        assert_eq!(timeline.total_duration_frames, 15);
    }

    #[test]
    fn test_payloads_are_preserved() {
        let mut scenes = draft();
        scenes[0].content = SceneContent::Intro(IntroContent {
            headline: "Hello".to_string(),
            subheadline: Some("world".to_string()),
        });
        scenes[0].style = serde_json::json!({"theme": "dark"});
        let timeline = TimelineCompiler::with_defaults()
            .compile(&scenes, 120.0, None)
            .unwrap();
        assert_eq!(timeline.scenes[0].content, scenes[0].content);
        assert_eq!(timeline.scenes[0].style, scenes[0].style);
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let compiler = TimelineCompiler::with_defaults();
        assert!(compiler.compile(&[], 120.0, None).unwrap_err().is_invalid_input());
        assert!(compiler.compile(&draft(), 0.0, None).unwrap_err().is_invalid_input());
        assert!(compiler.compile(&draft(), -90.0, None).is_err());
        assert!(compiler.compile(&draft(), f64::NAN, None).is_err());

        let zero_fps = TimelineCompiler::new(CompileOptions {
            fps: 0,
            ..Default::default()
        });
        assert!(zero_fps.compile(&draft(), 120.0, None).is_err());
    }

    #[test]
    fn test_compile_to_beat_map_uses_its_tempo() {
        let beat_map = BeatMap::empty(120.0);
        let timeline = TimelineCompiler::with_defaults()
            .compile_to_beat_map(&draft(), &beat_map, None)
            .unwrap();
        assert_eq!(timeline.total_duration_frames, 255);
    }
}
