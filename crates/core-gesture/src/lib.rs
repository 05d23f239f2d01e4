//! Pointer gesture recognition.
//!
//! The recognizer consumes raw pointer samples in viewport coordinates and
//! classifies each input sequence into at most one high-level gesture. It is
//! deliberately ignorant of the buffer and the layout: a [`Gesture`] is
//! advisory, and the host decides what editing action it triggers.
//!
//! All time comes from an injected [`Clock`], so a fixed sample/timestamp
//! script always classifies the same way regardless of wall time.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use core_model::PointF;

mod recognizer;
pub use recognizer::GestureRecognizer;

/// Construction-time tuning for the recognizer. `touch_slop` and
/// `double_tap_timeout_ms` are the public knobs of the engine entry point;
/// the rest ship with conventional defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchConfig {
    /// Pixel displacement below which pointer movement is ignored for
    /// classification. Movement of exactly this distance is still a tap.
    pub touch_slop: f32,
    /// Maximum gap between two taps that still forms a double-tap.
    pub double_tap_timeout_ms: i64,
    /// Hold duration past which an unmoved release becomes a long-press.
    pub long_press_timeout_ms: i64,
    /// Release velocity (px/s) past which a scroll resolves as a fling.
    pub fast_scroll_min_velocity: f32,
}

impl TouchConfig {
    pub const DEFAULT_LONG_PRESS_TIMEOUT_MS: i64 = 500;
    pub const DEFAULT_FAST_SCROLL_MIN_VELOCITY: f32 = 1200.0;

    pub fn new(touch_slop: f32, double_tap_timeout_ms: i64) -> Self {
        Self {
            touch_slop,
            double_tap_timeout_ms,
            long_press_timeout_ms: Self::DEFAULT_LONG_PRESS_TIMEOUT_MS,
            fast_scroll_min_velocity: Self::DEFAULT_FAST_SCROLL_MIN_VELOCITY,
        }
    }
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self::new(10.0, 300)
    }
}

/// Millisecond time source. Injected so classification is a pure function
/// of (samples, timestamps, config).
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Monotonic wall clock measured from construction.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> i64 {
        self.origin.elapsed().as_millis() as i64
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// Raw pointer event kinds as the platform layer reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    TouchDown,
    TouchPointerDown,
    TouchMove,
    TouchPointerUp,
    TouchUp,
    TouchCancel,
    MouseDown,
}

/// One raw sample: event kind plus the current position of every pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureEvent {
    pub kind: EventKind,
    pub points: Vec<PointF>,
}

impl GestureEvent {
    pub fn new(kind: EventKind, points: Vec<PointF>) -> Self {
        Self { kind, points }
    }

    /// Build from the flat `[x0, y0, x1, y1, ..]` array the boundary uses.
    /// A trailing unpaired coordinate is dropped.
    pub fn from_flat(kind: EventKind, coords: &[f32]) -> Self {
        let points = coords
            .chunks_exact(2)
            .map(|c| PointF::new(c[0], c[1]))
            .collect();
        Self { kind, points }
    }
}

/// Classification result. Exactly one is produced per recognizer call;
/// non-terminal samples classify as `Undefined`.
///
/// Payloads are variant-scoped rather than defaulted shared fields, so a
/// `Scale` cannot carry a meaningless tap point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Undefined,
    Tap { point: PointF },
    DoubleTap { point: PointF },
    LongPress { point: PointF },
    Scale { factor: f32 },
    Scroll { dx: f32, dy: f32 },
    FastScroll { dx: f32, dy: f32 },
}

impl Gesture {
    /// Symbolic discriminant used on the wire.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Gesture::Undefined => "UNDEFINED",
            Gesture::Tap { .. } => "TAP",
            Gesture::DoubleTap { .. } => "DOUBLE_TAP",
            Gesture::LongPress { .. } => "LONG_PRESS",
            Gesture::Scale { .. } => "SCALE",
            Gesture::Scroll { .. } => "SCROLL",
            Gesture::FastScroll { .. } => "FAST_SCROLL",
        }
    }

    /// Serialize for transport across the boundary.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Flat wire record: `type` plus only the payload fields the variant owns.
#[derive(Serialize)]
struct GestureWire<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tap_point: Option<PointF>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scroll_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scroll_y: Option<f32>,
}

impl Serialize for Gesture {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut wire = GestureWire {
            kind: self.kind_name(),
            tap_point: None,
            scale: None,
            scroll_x: None,
            scroll_y: None,
        };
        match *self {
            Gesture::Undefined => {}
            Gesture::Tap { point } | Gesture::DoubleTap { point } | Gesture::LongPress { point } => {
                wire.tap_point = Some(point);
            }
            Gesture::Scale { factor } => wire.scale = Some(factor),
            Gesture::Scroll { dx, dy } | Gesture::FastScroll { dx, dy } => {
                wire.scroll_x = Some(dx);
                wire.scroll_y = Some(dy);
            }
        }
        wire.serialize(serializer)
    }
}
