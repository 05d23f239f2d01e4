//! The layout pass: document + viewport + metrics in, visual lines out.
//!
//! Each logical line is segmented into style-uniform text/whitespace runs,
//! measured through the host callbacks, and soft-wrapped against the
//! viewport width. Graphemes are the indivisible wrap unit. A logical line's
//! terminating `\n` becomes a zero-width newline run on its final visual
//! line, so concatenating run texts in order reconstructs the buffer text.
//!
//! Wrap policy: a grapheme that would push the accumulated width strictly
//! past the viewport width starts a new visual line; an exact fit stays.
//! Every visual line places at least one grapheme, so layout always makes
//! progress even when a single cluster is wider than the viewport.
//!
//! An invalid (unset) viewport wraps nowhere: the pass still runs so a
//! render model can be built immediately after a document load.

use ahash::AHashMap;
use tracing::debug;

use core_model::{RunKind, StyleId, StyleSpan, Viewport, VisualLine, VisualRun};
use core_text::{Document, grapheme};

use crate::{MeasureCache, TextMeasurer};

/// Host-assigned style spans per logical line. Lines without an entry are
/// fully default-styled. Any mutation invalidates layout; the engine facade
/// enforces that.
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    spans: AHashMap<usize, Vec<StyleSpan>>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the spans of one logical line. Spans are kept sorted by
    /// column; later entries win where they overlap.
    pub fn set_line(&mut self, line: usize, mut spans: Vec<StyleSpan>) {
        if spans.is_empty() {
            self.spans.remove(&line);
            return;
        }
        spans.sort_by_key(|s| s.column);
        self.spans.insert(line, spans);
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    pub fn line(&self, line: usize) -> Option<&[StyleSpan]> {
        self.spans.get(&line).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Vertical extent of one visual line, in document space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineBox {
    pub top: f32,
    pub height: f32,
    pub ascent: f32,
}

impl LineBox {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn baseline(&self) -> f32 {
        self.top + self.ascent
    }
}

/// Interned run text for one pass. Ids restart at zero every pass, so a
/// text id is only meaningful against the snapshot that minted it.
#[derive(Debug, Clone, Default, PartialEq)]
struct TextTable {
    by_id: AHashMap<i64, String>,
    ids: AHashMap<String, i64>,
    next_id: i64,
}

impl TextTable {
    fn intern(&mut self, text: &str) -> i64 {
        if let Some(id) = self.ids.get(text) {
            return *id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.by_id.insert(id, text.to_owned());
        self.ids.insert(text.to_owned(), id);
        id
    }

    fn get(&self, id: i64) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }
}

/// The complete result of one layout pass. Immutable once produced;
/// invalidation replaces the whole snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSnapshot {
    lines: Vec<VisualLine>,
    boxes: Vec<LineBox>,
    content_width: f32,
    content_height: f32,
    text_table: TextTable,
}

impl LayoutSnapshot {
    /// Visual lines in logical-line order.
    pub fn lines(&self) -> &[VisualLine] {
        &self.lines
    }

    /// Per-visual-line vertical extents, parallel to [`Self::lines`].
    pub fn line_boxes(&self) -> &[LineBox] {
        &self.boxes
    }

    pub fn content_width(&self) -> f32 {
        self.content_width
    }

    pub fn content_height(&self) -> f32 {
        self.content_height
    }

    /// Resolve a run's text id minted by this pass.
    pub fn run_text(&self, text_id: i64) -> Option<&str> {
        self.text_table.get(text_id)
    }
}

/// One total layout rebuild. Construct, then [`LayoutPass::run`].
pub struct LayoutPass<'a> {
    document: &'a Document,
    viewport: Viewport,
    styles: &'a StyleMap,
    measurer: &'a dyn TextMeasurer,
    cache: &'a mut MeasureCache,
}

/// A style-uniform, kind-uniform slice of one logical line.
#[derive(Debug, Clone, Copy)]
struct Piece<'t> {
    kind: RunKind,
    text: &'t str,
    char_start: usize,
    char_len: usize,
    style_id: StyleId,
}

/// Accumulator for the visual line currently being filled.
#[derive(Default)]
struct LineAccum {
    runs: Vec<VisualRun>,
    x: f32,
}

impl LineAccum {
    fn has_content(&self) -> bool {
        !self.runs.is_empty()
    }
}

/// The mutable half of a pass: measurement access, split from the document
/// borrow so pieces can reference line text while runs are emitted.
struct PassCtx<'a> {
    measurer: &'a dyn TextMeasurer,
    cache: &'a mut MeasureCache,
}

impl<'a> LayoutPass<'a> {
    pub fn new(
        document: &'a Document,
        viewport: Viewport,
        styles: &'a StyleMap,
        measurer: &'a dyn TextMeasurer,
        cache: &'a mut MeasureCache,
    ) -> Self {
        Self {
            document,
            viewport,
            styles,
            measurer,
            cache,
        }
    }

    pub fn run(self) -> LayoutSnapshot {
        let LayoutPass {
            document,
            viewport,
            styles,
            measurer,
            cache,
        } = self;
        let wrap_width = if viewport.width > 0.0 {
            viewport.width
        } else {
            f32::INFINITY
        };
        let mut out = LayoutSnapshot {
            lines: Vec::new(),
            boxes: Vec::new(),
            content_width: 0.0,
            content_height: 0.0,
            text_table: TextTable::default(),
        };
        let mut ctx = PassCtx { measurer, cache };
        let mut y = 0.0;

        for line_idx in 0..document.line_count() {
            let text = document.line_text(line_idx).unwrap_or("");
            let pieces = segment_line(text, styles.line(line_idx));
            let mut accum = LineAccum::default();

            for piece in &pieces {
                ctx.place_piece(piece, wrap_width, line_idx, &mut accum, &mut y, &mut out);
            }

            if document.has_newline_after(line_idx) {
                let text_id = out.text_table.intern("");
                accum.runs.push(VisualRun {
                    kind: RunKind::Newline,
                    x: accum.x,
                    y: 0.0,
                    text_id,
                    style_id: StyleId::DEFAULT,
                    char_start: text.chars().count(),
                    char_len: 0,
                });
            }

            // The final visual line flushes even when empty: every logical
            // line contributes at least one visual line.
            ctx.flush_visual_line(line_idx, &mut accum, &mut y, &mut out);
        }
        out.content_height = y;
        debug!(
            target: "layout",
            logical_lines = document.line_count(),
            visual_lines = out.lines.len(),
            wrap_width,
            "pass_complete"
        );
        out
    }
}

impl PassCtx<'_> {
    fn width(&mut self, text: &str, style_id: StyleId) -> f32 {
        self.cache.width(self.measurer, text, style_id)
    }

    /// Place one piece, splitting it across visual lines as needed.
    fn place_piece(
        &mut self,
        piece: &Piece<'_>,
        wrap_width: f32,
        line_idx: usize,
        accum: &mut LineAccum,
        y: &mut f32,
        out: &mut LayoutSnapshot,
    ) {
        let whole_width = self.width(piece.text, piece.style_id);
        if accum.x + whole_width <= wrap_width {
            let text_id = out.text_table.intern(piece.text);
            accum.runs.push(VisualRun {
                kind: piece.kind,
                x: accum.x,
                y: 0.0,
                text_id,
                style_id: piece.style_id,
                char_start: piece.char_start,
                char_len: piece.char_len,
            });
            accum.x += whole_width;
            return;
        }

        // Overflow: step grapheme clusters, emitting a sub-run per visual
        // line this piece spans.
        let mut pending_start_byte = 0usize;
        let mut pending_char_start = 0usize;
        let mut pending_chars = 0usize;
        let mut pending_width = 0.0f32;
        let mut seen_bytes = 0usize;
        let mut seen_chars = 0usize;

        for (byte_idx, cluster) in grapheme::index_iter(piece.text) {
            let cluster_width = self.width(cluster, piece.style_id);
            let overflows = accum.x + pending_width + cluster_width > wrap_width;
            let line_has_content = accum.has_content() || pending_chars > 0;
            if overflows && line_has_content {
                if pending_chars > 0 {
                    self.emit_sub_run(
                        piece,
                        pending_start_byte..byte_idx,
                        pending_char_start,
                        pending_chars,
                        pending_width,
                        accum,
                        out,
                    );
                }
                self.flush_visual_line(line_idx, accum, y, out);
                pending_start_byte = byte_idx;
                pending_char_start = seen_chars;
                pending_chars = 0;
                pending_width = 0.0;
            }
            pending_width += cluster_width;
            pending_chars += cluster.chars().count();
            seen_chars += cluster.chars().count();
            seen_bytes = byte_idx + cluster.len();
        }
        if pending_chars > 0 {
            self.emit_sub_run(
                piece,
                pending_start_byte..seen_bytes,
                pending_char_start,
                pending_chars,
                pending_width,
                accum,
                out,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_sub_run(
        &mut self,
        piece: &Piece<'_>,
        bytes: std::ops::Range<usize>,
        char_offset: usize,
        char_len: usize,
        width: f32,
        accum: &mut LineAccum,
        out: &mut LayoutSnapshot,
    ) {
        let text_id = out.text_table.intern(&piece.text[bytes]);
        accum.runs.push(VisualRun {
            kind: piece.kind,
            x: accum.x,
            y: 0.0,
            text_id,
            style_id: piece.style_id,
            char_start: piece.char_start + char_offset,
            char_len,
        });
        accum.x += width;
    }

    /// Close the current visual line: resolve its ascent/descent from the
    /// styles it uses, assign run baselines, and push it onto the snapshot.
    fn flush_visual_line(
        &mut self,
        line_idx: usize,
        accum: &mut LineAccum,
        y: &mut f32,
        out: &mut LayoutSnapshot,
    ) {
        let mut ascent = 0.0f32;
        let mut descent = 0.0f32;
        if accum.runs.is_empty() {
            let m = self.cache.metrics(self.measurer, StyleId::DEFAULT);
            ascent = m.ascent;
            descent = m.descent;
        } else {
            for run in &accum.runs {
                let m = self.cache.metrics(self.measurer, run.style_id);
                ascent = ascent.max(m.ascent);
                descent = descent.max(m.descent);
            }
        }
        let baseline = *y + ascent;
        let mut finished = std::mem::take(accum);
        for run in &mut finished.runs {
            run.y = baseline;
        }
        out.content_width = out.content_width.max(finished.x);
        out.lines.push(VisualLine {
            logical_line: line_idx,
            runs: finished.runs,
        });
        out.boxes.push(LineBox {
            top: *y,
            height: ascent + descent,
            ascent,
        });
        *y += ascent + descent;
    }
}

/// Split one logical line into kind- and style-uniform pieces.
fn segment_line<'t>(text: &'t str, spans: Option<&[StyleSpan]>) -> Vec<Piece<'t>> {
    if text.is_empty() {
        return Vec::new();
    }
    let char_styles = spans.map(|spans| {
        let n = text.chars().count();
        let mut per_char = vec![StyleId::DEFAULT; n];
        for span in spans {
            let start = span.column as usize;
            let end = start.saturating_add(span.length as usize).min(n);
            for slot in per_char.iter_mut().take(end).skip(start) {
                *slot = span.style_id;
            }
        }
        per_char
    });
    let style_at = |idx: usize| char_styles.as_ref().map_or(StyleId::DEFAULT, |s| s[idx]);

    let mut pieces = Vec::new();
    let mut start_byte = 0usize;
    let mut start_char = 0usize;
    let mut current_kind = RunKind::Text;
    let mut current_style = StyleId::DEFAULT;

    for (char_idx, (byte_idx, ch)) in text.char_indices().enumerate() {
        let kind = if ch == ' ' || ch == '\t' {
            RunKind::Whitespace
        } else {
            RunKind::Text
        };
        let style = style_at(char_idx);
        if char_idx == 0 {
            current_kind = kind;
            current_style = style;
            continue;
        }
        if kind != current_kind || style != current_style {
            pieces.push(Piece {
                kind: current_kind,
                text: &text[start_byte..byte_idx],
                char_start: start_char,
                char_len: char_idx - start_char,
                style_id: current_style,
            });
            start_byte = byte_idx;
            start_char = char_idx;
            current_kind = kind;
            current_style = style;
        }
    }
    let total_chars = text.chars().count();
    pieces.push(Piece {
        kind: current_kind,
        text: &text[start_byte..],
        char_start: start_char,
        char_len: total_chars - start_char,
        style_id: current_style,
    });
    pieces
}
