//! Scene types for generated videos.
//!
//! A scene's `content` payload is a closed union keyed by the scene `type`.
//! On the wire a scene looks like:
//!
//! ```json
//! { "id": "s1", "startFrame": 0, "endFrame": 90, "type": "intro",
//!   "content": { "headline": "..." }, "animation": {}, "style": {} }
//! ```
//!
//! `animation` and `style` are opaque to this crate and pass through
//! untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::beat_map::FrameIndex;
use crate::cursor::ZoomPoint;

/// Scene discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SceneType {
    Intro,
    Feature,
    Testimonial,
    Cta,
    Screenshot,
    Recording,
    Transition,
    Stats,
    Tagline,
    ValueProp,
}

impl SceneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneType::Intro => "intro",
            SceneType::Feature => "feature",
            SceneType::Testimonial => "testimonial",
            SceneType::Cta => "cta",
            SceneType::Screenshot => "screenshot",
            SceneType::Recording => "recording",
            SceneType::Transition => "transition",
            SceneType::Stats => "stats",
            SceneType::Tagline => "tagline",
            SceneType::ValueProp => "value-prop",
        }
    }
}

impl fmt::Display for SceneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntroContent {
    pub headline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subheadline: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureContent {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TestimonialContent {
    pub quote: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CtaContent {
    pub headline: String,
    pub button_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScreenshotContent {
    /// Asset reference (path or URL) of the screenshot image.
    pub asset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordingContent {
    /// Asset reference of the screen recording.
    pub asset: String,
    /// Camera push-ins detected for this recording.
    pub zoom_points: Vec<ZoomPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransitionContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatItem {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsContent {
    pub items: Vec<StatItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaglineContent {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValuePropContent {
    pub title: String,
    pub points: Vec<String>,
}

/// Scene payload, one variant per [`SceneType`].
#[derive(Debug, Clone, PartialEq)]
pub enum SceneContent {
    Intro(IntroContent),
    Feature(FeatureContent),
    Testimonial(TestimonialContent),
    Cta(CtaContent),
    Screenshot(ScreenshotContent),
    Recording(RecordingContent),
    Transition(TransitionContent),
    Stats(StatsContent),
    Tagline(TaglineContent),
    ValueProp(ValuePropContent),
}

impl SceneContent {
    pub fn scene_type(&self) -> SceneType {
        match self {
            SceneContent::Intro(_) => SceneType::Intro,
            SceneContent::Feature(_) => SceneType::Feature,
            SceneContent::Testimonial(_) => SceneType::Testimonial,
            SceneContent::Cta(_) => SceneType::Cta,
            SceneContent::Screenshot(_) => SceneType::Screenshot,
            SceneContent::Recording(_) => SceneType::Recording,
            SceneContent::Transition(_) => SceneType::Transition,
            SceneContent::Stats(_) => SceneType::Stats,
            SceneContent::Tagline(_) => SceneType::Tagline,
            SceneContent::ValueProp(_) => SceneType::ValueProp,
        }
    }

    /// Empty payload for a scene type.
    pub fn empty(kind: SceneType) -> Self {
        match kind {
            SceneType::Intro => SceneContent::Intro(Default::default()),
            SceneType::Feature => SceneContent::Feature(Default::default()),
            SceneType::Testimonial => SceneContent::Testimonial(Default::default()),
            SceneType::Cta => SceneContent::Cta(Default::default()),
            SceneType::Screenshot => SceneContent::Screenshot(Default::default()),
            SceneType::Recording => SceneContent::Recording(Default::default()),
            SceneType::Transition => SceneContent::Transition(Default::default()),
            SceneType::Stats => SceneContent::Stats(Default::default()),
            SceneType::Tagline => SceneContent::Tagline(Default::default()),
            SceneType::ValueProp => SceneContent::ValueProp(Default::default()),
        }
    }

    /// Decode the payload for `kind`. A missing (`null`) payload decodes
    /// to the empty payload.
    pub fn from_value(kind: SceneType, value: Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::empty(kind));
        }
        Ok(match kind {
            SceneType::Intro => SceneContent::Intro(serde_json::from_value(value)?),
            SceneType::Feature => SceneContent::Feature(serde_json::from_value(value)?),
            SceneType::Testimonial => SceneContent::Testimonial(serde_json::from_value(value)?),
            SceneType::Cta => SceneContent::Cta(serde_json::from_value(value)?),
            SceneType::Screenshot => SceneContent::Screenshot(serde_json::from_value(value)?),
            SceneType::Recording => SceneContent::Recording(serde_json::from_value(value)?),
            SceneType::Transition => SceneContent::Transition(serde_json::from_value(value)?),
            SceneType::Stats => SceneContent::Stats(serde_json::from_value(value)?),
            SceneType::Tagline => SceneContent::Tagline(serde_json::from_value(value)?),
            SceneType::ValueProp => SceneContent::ValueProp(serde_json::from_value(value)?),
        })
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            SceneContent::Intro(c) => serde_json::to_value(c),
            SceneContent::Feature(c) => serde_json::to_value(c),
            SceneContent::Testimonial(c) => serde_json::to_value(c),
            SceneContent::Cta(c) => serde_json::to_value(c),
            SceneContent::Screenshot(c) => serde_json::to_value(c),
            SceneContent::Recording(c) => serde_json::to_value(c),
            SceneContent::Transition(c) => serde_json::to_value(c),
            SceneContent::Stats(c) => serde_json::to_value(c),
            SceneContent::Tagline(c) => serde_json::to_value(c),
            SceneContent::ValueProp(c) => serde_json::to_value(c),
        }
    }
}

/// One timed segment of a generated video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScene", into = "RawScene")]
pub struct Scene {
    pub id: String,
    pub start_frame: FrameIndex,
    /// Exclusive end frame, greater than `start_frame`.
    pub end_frame: FrameIndex,
    pub content: SceneContent,
    pub animation: Value,
    pub style: Value,
}

impl Scene {
    /// Create a scene with empty animation and style payloads.
    pub fn new(
        id: impl Into<String>,
        start_frame: FrameIndex,
        end_frame: FrameIndex,
        content: SceneContent,
    ) -> Self {
        Self {
            id: id.into(),
            start_frame,
            end_frame,
            content,
            animation: Value::Null,
            style: Value::Null,
        }
    }

    pub fn scene_type(&self) -> SceneType {
        self.content.scene_type()
    }

    pub fn duration_frames(&self) -> u64 {
        self.end_frame.saturating_sub(self.start_frame)
    }

    /// Screenshot asset this scene displays, if any.
    pub fn screenshot_asset(&self) -> Option<&str> {
        match &self.content {
            SceneContent::Screenshot(c) if !c.asset.is_empty() => Some(&c.asset),
            _ => None,
        }
    }

    /// Zoom points attached to a recording scene.
    pub fn zoom_points(&self) -> &[ZoomPoint] {
        match &self.content {
            SceneContent::Recording(c) => &c.zoom_points,
            _ => &[],
        }
    }
}

/// Wire representation of [`Scene`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScene {
    id: String,
    start_frame: FrameIndex,
    end_frame: FrameIndex,
    #[serde(rename = "type")]
    kind: SceneType,
    #[serde(default)]
    content: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    animation: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    style: Value,
}

impl TryFrom<RawScene> for Scene {
    type Error = serde_json::Error;

    fn try_from(raw: RawScene) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id,
            start_frame: raw.start_frame,
            end_frame: raw.end_frame,
            content: SceneContent::from_value(raw.kind, raw.content)?,
            animation: raw.animation,
            style: raw.style,
        })
    }
}

impl From<Scene> for RawScene {
    fn from(scene: Scene) -> Self {
        let kind = scene.scene_type();
        // Payload structs always serialize to a JSON object.
        let content = scene.content.to_value().unwrap_or(Value::Null);
        Self {
            id: scene.id,
            start_frame: scene.start_frame,
            end_frame: scene.end_frame,
            kind,
            content,
            animation: scene.animation,
            style: scene.style,
        }
    }
}
