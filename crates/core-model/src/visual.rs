//! Visual render model: what the host paints for one frame.
//!
//! A [`RenderModel`] is a copy-on-build snapshot. Once returned to the host
//! the kernel never touches it again; the next snapshot supersedes it rather
//! than patching it. Run text is referenced by id and resolved lazily via a
//! separate lookup so large documents do not embed their text in every frame.

use serde::{Deserialize, Serialize};

use crate::{PointF, StyleId};

/// Classification of one contiguous, same-style segment on a visual line.
///
/// `InlayHint` and `PhantomText` are reserved for runs injected by an
/// annotation source rather than backed by buffer text; the layout pass
/// itself only produces the first three kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunKind {
    Text,
    Whitespace,
    Newline,
    InlayHint,
    PhantomText,
}

/// One positioned run. `y` is the baseline of the owning visual line.
///
/// `char_start`/`char_len` record the run's source columns inside its
/// logical line for hit testing; they are kernel-internal and stay off the
/// wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualRun {
    #[serde(rename = "type")]
    pub kind: RunKind,
    pub x: f32,
    pub y: f32,
    pub text_id: i64,
    pub style_id: StyleId,
    #[serde(skip)]
    pub char_start: usize,
    #[serde(skip)]
    pub char_len: usize,
}

/// A visually wrapped line. Soft wrap produces several visual lines that all
/// map back to the same `logical_line`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualLine {
    pub logical_line: usize,
    pub runs: Vec<VisualRun>,
}

/// Caret rendering state. `show_dragger` reflects the most recent resolved
/// gesture (a long-press shows the drag handle).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub position: PointF,
    pub show_dragger: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuideDirection {
    Horizontal,
    Vertical,
}

/// A non-text visual aid derived from layout (indent guide, current-line
/// rule). Purely presentational.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuideLine {
    pub direction: GuideDirection,
    pub start: PointF,
    pub end: PointF,
}

impl GuideLine {
    pub fn vertical(x: f32, top: f32, bottom: f32) -> Self {
        Self {
            direction: GuideDirection::Vertical,
            start: PointF::new(x, top),
            end: PointF::new(x, bottom),
        }
    }

    pub fn horizontal(y: f32, left: f32, right: f32) -> Self {
        Self {
            direction: GuideDirection::Horizontal,
            start: PointF::new(left, y),
            end: PointF::new(right, y),
        }
    }
}

/// Everything needed to paint one frame, in viewport coordinates.
/// `current_line` marks the top-left of the caret's visual line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderModel {
    pub current_line: PointF,
    pub lines: Vec<VisualLine>,
    pub cursor: Cursor,
    pub guide_lines: Vec<GuideLine>,
}

impl RenderModel {
    /// Serialize for transport across the boundary.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> RenderModel {
        RenderModel {
            current_line: PointF::new(0.0, 0.0),
            lines: vec![VisualLine {
                logical_line: 0,
                runs: vec![VisualRun {
                    kind: RunKind::Text,
                    x: 0.0,
                    y: 11.0,
                    text_id: 0,
                    style_id: StyleId::DEFAULT,
                    char_start: 0,
                    char_len: 5,
                }],
            }],
            cursor: Cursor::default(),
            guide_lines: vec![GuideLine::vertical(28.0, 0.0, 14.0)],
        }
    }

    #[test]
    fn wire_uses_snake_case_keys_and_symbolic_enums() {
        let json = sample_model().to_json().unwrap();
        assert!(json.contains("\"current_line\""));
        assert!(json.contains("\"guide_lines\""));
        assert!(json.contains("\"logical_line\""));
        assert!(json.contains("\"text_id\""));
        assert!(json.contains("\"type\": \"TEXT\""));
        assert!(json.contains("\"direction\": \"VERTICAL\""));
        // Hit-test bookkeeping must not leak onto the wire.
        assert!(!json.contains("char_start"));
        assert!(!json.contains("char_len"));
    }

    #[test]
    fn run_kind_symbolic_names() {
        assert_eq!(
            serde_json::to_string(&RunKind::InlayHint).unwrap(),
            "\"INLAY_HINT\""
        );
        assert_eq!(
            serde_json::to_string(&RunKind::PhantomText).unwrap(),
            "\"PHANTOM_TEXT\""
        );
    }

    #[test]
    fn model_round_trips_through_json() {
        let model = sample_model();
        let back: RenderModel = serde_json::from_str(&model.to_json().unwrap()).unwrap();
        assert_eq!(back.lines.len(), 1);
        assert_eq!(back.lines[0].runs[0].kind, RunKind::Text);
        // Skipped fields come back as defaults.
        assert_eq!(back.lines[0].runs[0].char_len, 0);
    }
}
