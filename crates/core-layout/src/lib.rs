//! Viewport-aware text layout.
//!
//! The kernel never measures text itself: the host supplies a
//! [`TextMeasurer`] capability and the layout pass turns (document,
//! viewport, metrics) into positioned visual lines. Measurement results are
//! memoized per (text, style) in a [`MeasureCache`] that survives across
//! passes and is dropped only when the host swaps fonts.
//!
//! There is no partial reflow: any change to the document, the viewport, or
//! a style assignment invalidates the whole layout, and the pass is a total
//! rebuild. That keeps `build_render_model` an idempotent, side-effect-free
//! operation at the boundary.

use ahash::AHashMap;

use core_model::StyleId;

mod engine;
mod guides;

pub use engine::{LayoutPass, LayoutSnapshot, LineBox, StyleMap};
pub use guides::{INDENT_COLUMNS, indent_guides};
pub use hit_test::{caret_point, position_at_point};

/// Vertical font metrics for one style, in device pixels. Both values are
/// magnitudes (a typical host reports ascent as a negative offset; callers
/// hand the kernel absolute values).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
}

impl FontMetrics {
    pub fn new(ascent: f32, descent: f32) -> Self {
        Self { ascent, descent }
    }

    pub fn line_height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Width and metric callbacks supplied by the host.
///
/// Both are invoked synchronously, possibly many times per layout pass, and
/// must be deterministic for identical inputs within one pass. The host
/// callback may touch host-owned rendering resources; the kernel therefore
/// never holds internal state borrowed mutably while calling out.
pub trait TextMeasurer {
    /// Advance width of `text` in device pixels under `style_id`.
    fn measure_width(&self, text: &str, style_id: StyleId) -> f32;

    /// Vertical metrics for baseline placement under `style_id`.
    fn font_metrics(&self, style_id: StyleId) -> FontMetrics;
}

/// Per-(text, style) measurement memo.
///
/// Hostile measurement results degrade instead of failing the pass: a
/// non-finite or negative width is recorded as 0.0, and degenerate font
/// metrics clamp to zero.
#[derive(Default)]
pub struct MeasureCache {
    widths: AHashMap<StyleId, AHashMap<String, f32>>,
    metrics: AHashMap<StyleId, FontMetrics>,
}

impl MeasureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached width of `text` under `style_id`.
    pub fn width(&mut self, measurer: &dyn TextMeasurer, text: &str, style_id: StyleId) -> f32 {
        let per_style = self.widths.entry(style_id).or_default();
        if let Some(w) = per_style.get(text) {
            return *w;
        }
        let raw = measurer.measure_width(text, style_id);
        let width = if raw.is_finite() { raw.max(0.0) } else { 0.0 };
        per_style.insert(text.to_owned(), width);
        width
    }

    /// Cached vertical metrics for `style_id`.
    pub fn metrics(&mut self, measurer: &dyn TextMeasurer, style_id: StyleId) -> FontMetrics {
        if let Some(m) = self.metrics.get(&style_id) {
            return *m;
        }
        let raw = measurer.font_metrics(style_id);
        let sane = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let metrics = FontMetrics::new(sane(raw.ascent), sane(raw.descent));
        self.metrics.insert(style_id, metrics);
        metrics
    }

    /// Forget every measurement. Call when the host changes fonts; the next
    /// pass re-queries everything.
    pub fn reset(&mut self) {
        self.widths.clear();
        self.metrics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingMeasurer {
        calls: Cell<usize>,
    }

    impl TextMeasurer for CountingMeasurer {
        fn measure_width(&self, text: &str, _style_id: StyleId) -> f32 {
            self.calls.set(self.calls.get() + 1);
            text.chars().count() as f32 * 7.0
        }

        fn font_metrics(&self, _style_id: StyleId) -> FontMetrics {
            FontMetrics::new(11.0, 3.0)
        }
    }

    #[test]
    fn width_is_memoized_per_text_and_style() {
        let m = CountingMeasurer {
            calls: Cell::new(0),
        };
        let mut cache = MeasureCache::new();
        assert_eq!(cache.width(&m, "abc", StyleId(0)), 21.0);
        assert_eq!(cache.width(&m, "abc", StyleId(0)), 21.0);
        assert_eq!(m.calls.get(), 1);
        // A different style is a different measurement key.
        cache.width(&m, "abc", StyleId(1));
        assert_eq!(m.calls.get(), 2);
    }

    #[test]
    fn reset_forgets_measurements() {
        let m = CountingMeasurer {
            calls: Cell::new(0),
        };
        let mut cache = MeasureCache::new();
        cache.width(&m, "abc", StyleId(0));
        cache.reset();
        cache.width(&m, "abc", StyleId(0));
        assert_eq!(m.calls.get(), 2);
    }

    #[test]
    fn hostile_widths_degrade_to_zero() {
        struct Hostile;
        impl TextMeasurer for Hostile {
            fn measure_width(&self, _text: &str, _style_id: StyleId) -> f32 {
                f32::NAN
            }
            fn font_metrics(&self, _style_id: StyleId) -> FontMetrics {
                FontMetrics::new(f32::INFINITY, -4.0)
            }
        }
        let mut cache = MeasureCache::new();
        assert_eq!(cache.width(&Hostile, "x", StyleId(0)), 0.0);
        assert_eq!(cache.metrics(&Hostile, StyleId(0)), FontMetrics::new(0.0, 0.0));
    }

    #[test]
    fn line_height_is_ascent_plus_descent() {
        assert_eq!(FontMetrics::new(11.0, 3.0).line_height(), 14.0);
    }
}
