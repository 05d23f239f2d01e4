//! Shared data model for the editing kernel.
//!
//! Geometry and style primitives live here; the visual render model and its
//! wire contract live in [`visual`]. Everything that crosses the host
//! boundary serializes with snake_case keys and symbolic enum names so the
//! transport stays forward compatible (new variants never shift integers).

use serde::{Deserialize, Serialize};

mod visual;
pub use visual::{
    Cursor, GuideDirection, GuideLine, RenderModel, RunKind, VisualLine, VisualRun,
};

/// A point in device pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &PointF) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Visible drawing area in device pixels. Mutated by the host on resize;
/// layout reflows whenever it changes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A viewport is usable once both extents are positive.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Host-driven presentation state: zoom factor and scroll offsets. The
/// engine stores but never derives it; gesture results are advisory and the
/// host decides what scrolling/zooming they cause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub scale: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

/// Opaque handle to a host-registered text style. The kernel never looks
/// inside it; it is only a measurement key for the metrics callbacks.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StyleId(pub u32);

impl StyleId {
    pub const DEFAULT: StyleId = StyleId(0);
}

/// A styled region of one logical line, addressed in char columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleSpan {
    pub column: u32,
    pub length: u32,
    pub style_id: StyleId,
}

impl StyleSpan {
    pub fn new(column: u32, length: u32, style_id: StyleId) -> Self {
        Self {
            column,
            length,
            style_id,
        }
    }
}
