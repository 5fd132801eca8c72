//! Repairing parser for generator-produced scene scripts.
//!
//! Text generators frequently wrap JSON in Markdown fences, add prose
//! around it, or leave trailing commas. [`parse_script`] undoes those
//! defects before deserializing and reports anything it cannot fix as a
//! typed [`ScriptError`]. [`parse_script_or_fallback`] turns a failure into
//! a minimal, well-formed script.

use crate::scene::{CtaContent, FeatureContent, IntroContent, Scene, SceneContent};
use crate::timeline::VideoScript;

/// Errors produced while parsing a script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("no JSON object or array found in script text")]
    NoJson,

    #[error("script JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("script contains no scenes")]
    NoScenes,
}

/// Parse a script, repairing common formatting defects first.
///
/// Accepts either a `{ "totalDuration", "scenes" }` object or a bare array
/// of scenes.
pub fn parse_script(raw: &str) -> Result<VideoScript, ScriptError> {
    let body = strip_code_fence(raw);
    let (json, is_array) = outermost_json(body).ok_or(ScriptError::NoJson)?;
    let repaired = remove_trailing_commas(json);

    let mut script = if is_array {
        let scenes: Vec<Scene> = serde_json::from_str(&repaired)?;
        VideoScript::from_scenes(scenes)
    } else {
        serde_json::from_str::<VideoScript>(&repaired)?
    };

    if script.scenes.is_empty() {
        return Err(ScriptError::NoScenes);
    }
    if script.total_duration_frames == 0 {
        script.total_duration_frames = script.scenes.iter().map(|s| s.end_frame).max().unwrap_or(0);
    }
    Ok(script)
}

/// Parse a script, substituting [`VideoScript::fallback`] on failure.
pub fn parse_script_or_fallback(raw: &str, title: &str) -> VideoScript {
    match parse_script(raw) {
        Ok(script) => script,
        Err(e) => {
            tracing::warn!(error = %e, "script could not be parsed, using fallback script");
            VideoScript::fallback(title)
        }
    }
}

impl VideoScript {
    /// Minimal intro/feature/cta script at 30 fps.
    pub fn fallback(title: &str) -> Self {
        Self::from_scenes(vec![
            Scene::new(
                "intro",
                0,
                90,
                SceneContent::Intro(IntroContent {
                    headline: title.to_string(),
                    subheadline: None,
                }),
            ),
            Scene::new(
                "feature",
                90,
                210,
                SceneContent::Feature(FeatureContent {
                    title: title.to_string(),
                    description: String::new(),
                    icon: None,
                }),
            ),
            Scene::new(
                "cta",
                210,
                300,
                SceneContent::Cta(CtaContent {
                    headline: title.to_string(),
                    button_text: "Get started".to_string(),
                    url: None,
                }),
            ),
        ])
    }
}

/// Return the body of the first fenced code block, or the input unchanged.
fn strip_code_fence(raw: &str) -> &str {
    let Some(open) = raw.find("```") else {
        return raw;
    };
    let after_open = &raw[open + 3..];
    // Skip the info string (e.g. `json`) up to the end of the fence line.
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

/// Slice from the first opening bracket to the matching last closing one.
fn outermost_json(text: &str) -> Option<(&str, bool)> {
    let obj = text.find('{');
    let arr = text.find('[');
    let (start, close, is_array) = match (obj, arr) {
        (Some(o), Some(a)) if a < o => (a, ']', true),
        (Some(o), _) => (o, '}', false),
        (None, Some(a)) => (a, ']', true),
        (None, None) => return None,
    };
    let end = text.rfind(close)?;
    (end > start).then(|| (&text[start..=end], is_array))
}

/// Drop commas that directly precede `}` or `]`, ignoring string contents.
fn remove_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}
