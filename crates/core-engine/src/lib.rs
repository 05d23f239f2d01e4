//! The editing kernel facade.
//!
//! An [`EditorEngine`] is the single logical owner of one editing surface:
//! it holds the document, the viewport and view state, host style
//! assignments, the caret, the gesture recognizer, and the host-supplied
//! measurement capability. Every public operation is a synchronous,
//! non-reentrant call; the engine spawns no background work and takes no
//! locks, so the one place it calls back into the host (measurement during
//! layout) can freely touch host-owned resources.
//!
//! Layout invalidation is coarse by design: loading a document, resizing
//! the viewport, changing a style assignment, or resetting metrics drops
//! the cached snapshot, and the next [`EditorEngine::build_render_model`]
//! recomputes everything. With no intervening change, rebuilding returns a
//! structurally identical copy of the cached pass: the call is idempotent
//! and side-effect free from the host's point of view.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use core_gesture::{Clock, Gesture, GestureEvent, GestureRecognizer, MonotonicClock, TouchConfig};
use core_layout::{
    LayoutPass, LayoutSnapshot, MeasureCache, StyleMap, TextMeasurer, caret_point, indent_guides,
    position_at_point,
};
use core_model::{
    Cursor, GuideLine, PointF, RenderModel, StyleSpan, ViewState, Viewport,
};
use core_text::{Document, TextPosition};

/// Engine operation failures. Reported as values across the boundary; the
/// host must be able to tell a failure from an empty frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The operation needs a document and none has been loaded yet.
    #[error("no document loaded")]
    NoDocumentLoaded,
    /// A run-text lookup used an id the latest layout pass did not mint.
    /// Ids do not survive reload or relayout.
    #[error("unknown text id {0}")]
    UnknownTextId(i64),
}

/// Construction-time configuration of the engine entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfig {
    pub touch: TouchConfig,
}

impl EngineConfig {
    pub fn new(touch_slop: f32, double_tap_timeout_ms: i64) -> Self {
        Self {
            touch: TouchConfig::new(touch_slop, double_tap_timeout_ms),
        }
    }
}

/// One editing surface. See the module docs for the ownership rules.
pub struct EditorEngine {
    config: EngineConfig,
    measurer: Box<dyn TextMeasurer>,
    recognizer: GestureRecognizer<Arc<dyn Clock>>,
    document: Option<Document>,
    viewport: Viewport,
    view_state: ViewState,
    styles: StyleMap,
    caret: TextPosition,
    show_dragger: bool,
    cache: MeasureCache,
    /// `None` means layout is invalidated; the next build recomputes it.
    layout: Option<LayoutSnapshot>,
}

impl EditorEngine {
    pub fn new(config: EngineConfig, measurer: Box<dyn TextMeasurer>) -> Self {
        Self::with_clock(config, measurer, Arc::new(MonotonicClock::new()))
    }

    /// Construct with an injected clock. Gesture classification becomes a
    /// pure function of samples and timestamps, which the tests rely on.
    pub fn with_clock(
        config: EngineConfig,
        measurer: Box<dyn TextMeasurer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            measurer,
            recognizer: GestureRecognizer::new(config.touch, clock),
            document: None,
            viewport: Viewport::default(),
            view_state: ViewState::default(),
            styles: StyleMap::new(),
            caret: TextPosition::origin(),
            show_dragger: false,
            cache: MeasureCache::new(),
            layout: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn view_state(&self) -> ViewState {
        self.view_state
    }

    pub fn caret(&self) -> TextPosition {
        self.caret
    }

    /// Replace the document wholesale. Style spans and the caret belong to
    /// the previous document and reset with it; outstanding text ids become
    /// stale.
    pub fn load_document(&mut self, document: Document) {
        info!(
            target: "engine",
            bytes = document.len_bytes(),
            lines = document.line_count(),
            "document_loaded"
        );
        self.document = Some(document);
        self.caret = TextPosition::origin();
        self.styles.clear();
        self.invalidate();
    }

    /// Report a viewport resize. A size change reflows the whole layout.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        let next = Viewport::new(width, height);
        if next != self.viewport {
            debug!(target: "engine", width, height, "viewport_changed");
            self.viewport = next;
            self.invalidate();
        }
    }

    /// Update scroll/zoom state. Pure translation at render-model time; the
    /// layout itself is unaffected.
    pub fn set_view_state(&mut self, view_state: ViewState) {
        self.view_state = view_state;
    }

    /// Replace the style spans of one logical line. Any style assignment
    /// change invalidates layout.
    pub fn set_style_spans(&mut self, line: usize, spans: Vec<StyleSpan>) {
        self.styles.set_line(line, spans);
        self.invalidate();
    }

    /// Move the caret, clamped onto the document.
    pub fn set_caret(&mut self, position: TextPosition) -> Result<(), EngineError> {
        let document = self.document.as_ref().ok_or(EngineError::NoDocumentLoaded)?;
        self.caret = position.clamped_to(document);
        Ok(())
    }

    /// Drop all cached measurements. Call after the host changes fonts; the
    /// next build re-queries the measurement callbacks.
    pub fn reset_metrics(&mut self) {
        self.cache.reset();
        self.invalidate();
    }

    /// Feed one raw pointer sample through the recognizer.
    ///
    /// The classification is advisory: it mutates no buffer or layout
    /// state. The single carve-out is cursor presentation: a long-press
    /// shows the drag handle and a (double-)tap hides it again.
    pub fn handle_gesture_event(&mut self, event: &GestureEvent) -> Gesture {
        let gesture = self.recognizer.handle_event(event);
        match gesture {
            Gesture::LongPress { .. } => self.show_dragger = true,
            Gesture::Tap { .. } | Gesture::DoubleTap { .. } => self.show_dragger = false,
            _ => {}
        }
        gesture
    }

    /// Resolve a viewport-space point (for example a tap location) to the
    /// nearest text position.
    pub fn position_at_point(&mut self, point: PointF) -> Result<TextPosition, EngineError> {
        self.ensure_layout()?;
        let Some(snapshot) = self.layout.as_ref() else {
            return Err(EngineError::NoDocumentLoaded);
        };
        let document_point = PointF::new(
            point.x + self.view_state.scroll_x,
            point.y + self.view_state.scroll_y,
        );
        Ok(position_at_point(
            snapshot,
            self.measurer.as_ref(),
            &mut self.cache,
            document_point,
        ))
    }

    /// Assemble one immutable frame snapshot in viewport coordinates.
    ///
    /// Copy-on-build: the returned model is owned by the caller and never
    /// touched by the engine afterward.
    pub fn build_render_model(&mut self) -> Result<RenderModel, EngineError> {
        self.ensure_layout()?;
        let (Some(document), Some(snapshot)) = (self.document.as_ref(), self.layout.as_ref())
        else {
            return Err(EngineError::NoDocumentLoaded);
        };

        let scroll_x = self.view_state.scroll_x;
        let scroll_y = self.view_state.scroll_y;

        let mut lines = snapshot.lines().to_vec();
        for line in &mut lines {
            for run in &mut line.runs {
                run.x -= scroll_x;
                run.y -= scroll_y;
            }
        }

        let mut guide_lines: Vec<GuideLine> =
            indent_guides(document, snapshot, self.measurer.as_ref(), &mut self.cache)
                .into_iter()
                .map(|g| GuideLine {
                    direction: g.direction,
                    start: PointF::new(g.start.x - scroll_x, g.start.y - scroll_y),
                    end: PointF::new(g.end.x - scroll_x, g.end.y - scroll_y),
                })
                .collect();

        let caret = caret_point(snapshot, self.measurer.as_ref(), &mut self.cache, self.caret);
        let (caret_pt, caret_line) = caret.unwrap_or((PointF::new(0.0, 0.0), 0));
        let caret_box = snapshot.line_boxes().get(caret_line).copied();

        // Current-line marker plus a horizontal rule under the caret line.
        let current_line = caret_box
            .map(|b| PointF::new(0.0, b.top - scroll_y))
            .unwrap_or_default();
        if let Some(b) = caret_box {
            let right = if self.viewport.is_valid() {
                self.viewport.width
            } else {
                snapshot.content_width()
            };
            guide_lines.push(GuideLine::horizontal(
                b.bottom() - scroll_y,
                0.0,
                right,
            ));
        }

        Ok(RenderModel {
            current_line,
            lines,
            cursor: Cursor {
                position: PointF::new(caret_pt.x - scroll_x, caret_pt.y - scroll_y),
                show_dragger: self.show_dragger,
            },
            guide_lines,
        })
    }

    /// Resolve a run's text id from the most recent layout pass.
    pub fn run_text(&self, text_id: i64) -> Result<&str, EngineError> {
        if self.document.is_none() {
            return Err(EngineError::NoDocumentLoaded);
        }
        self.layout
            .as_ref()
            .and_then(|s| s.run_text(text_id))
            .ok_or(EngineError::UnknownTextId(text_id))
    }

    fn invalidate(&mut self) {
        self.layout = None;
    }

    fn ensure_layout(&mut self) -> Result<(), EngineError> {
        if self.layout.is_some() {
            return Ok(());
        }
        let Some(document) = self.document.as_ref() else {
            return Err(EngineError::NoDocumentLoaded);
        };
        let snapshot = LayoutPass::new(
            document,
            self.viewport,
            &self.styles,
            self.measurer.as_ref(),
            &mut self.cache,
        )
        .run();
        debug!(
            target: "engine",
            visual_lines = snapshot.lines().len(),
            "layout_rebuilt"
        );
        self.layout = Some(snapshot);
        Ok(())
    }
}
