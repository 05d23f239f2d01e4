//! Indent guides derived from layout. Purely presentational: a vertical
//! rule at each indent stop, spanning every contiguous block of lines
//! indented at least that deep.

use core_model::{GuideLine, StyleId};
use core_text::Document;

use crate::{LayoutSnapshot, MeasureCache, TextMeasurer};

/// Columns per indent stop. Tabs advance to the next stop.
pub const INDENT_COLUMNS: usize = 4;

/// Leading-whitespace width of a line in columns, or `None` for blank and
/// whitespace-only lines (those extend the enclosing block instead of
/// interrupting it).
fn indent_columns(line: &str) -> Option<usize> {
    let mut cols = 0;
    for ch in line.chars() {
        match ch {
            ' ' => cols += 1,
            '\t' => cols = (cols / INDENT_COLUMNS + 1) * INDENT_COLUMNS,
            _ => return Some(cols),
        }
    }
    None
}

/// Compute vertical indent guides for the snapshot, in document space.
///
/// A guide for indent level `l` sits at the parent level's x offset and
/// covers blocks of at least two logical lines indented `l` deep or deeper.
pub fn indent_guides(
    document: &Document,
    snapshot: &LayoutSnapshot,
    measurer: &dyn TextMeasurer,
    cache: &mut MeasureCache,
) -> Vec<GuideLine> {
    let line_count = document.line_count();
    if snapshot.lines().is_empty() {
        return Vec::new();
    }

    // Visual extent of each logical line.
    let mut first_visual = vec![usize::MAX; line_count];
    let mut last_visual = vec![0usize; line_count];
    for (i, vl) in snapshot.lines().iter().enumerate() {
        if first_visual[vl.logical_line] == usize::MAX {
            first_visual[vl.logical_line] = i;
        }
        last_visual[vl.logical_line] = i;
    }

    // Indent levels, blank lines inheriting the previous line's level.
    let mut levels = Vec::with_capacity(line_count);
    let mut prev_level = 0usize;
    for idx in 0..line_count {
        let level = match indent_columns(document.line_text(idx).unwrap_or("")) {
            Some(cols) => cols / INDENT_COLUMNS,
            None => prev_level,
        };
        levels.push(level);
        prev_level = level;
    }
    let max_level = levels.iter().copied().max().unwrap_or(0);
    if max_level == 0 {
        return Vec::new();
    }

    let space_width = cache.width(measurer, " ", StyleId::DEFAULT);
    let mut guides = Vec::new();
    for level in 1..=max_level {
        let x = (level - 1) as f32 * INDENT_COLUMNS as f32 * space_width;
        let mut block_start: Option<usize> = None;
        for idx in 0..=line_count {
            let inside = idx < line_count && levels[idx] >= level;
            match (block_start, inside) {
                (None, true) => block_start = Some(idx),
                (Some(start), false) => {
                    let end = idx - 1;
                    // One indented line alone draws no guide.
                    if end > start {
                        let top = snapshot.line_boxes()[first_visual[start]].top;
                        let bottom = snapshot.line_boxes()[last_visual[end]].bottom();
                        guides.push(GuideLine::vertical(x, top, bottom));
                    }
                    block_start = None;
                }
                _ => {}
            }
        }
    }
    guides
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FontMetrics, LayoutPass, StyleMap};
    use core_model::Viewport;

    struct FixedMeasurer;

    impl TextMeasurer for FixedMeasurer {
        fn measure_width(&self, text: &str, _style_id: StyleId) -> f32 {
            text.chars().count() as f32 * 7.0
        }

        fn font_metrics(&self, _style_id: StyleId) -> FontMetrics {
            FontMetrics::new(11.0, 3.0)
        }
    }

    fn guides_for(text: &str) -> Vec<GuideLine> {
        let doc = Document::from_str(text);
        let styles = StyleMap::new();
        let mut cache = MeasureCache::new();
        let snapshot = LayoutPass::new(
            &doc,
            Viewport::new(1000.0, 1000.0),
            &styles,
            &FixedMeasurer,
            &mut cache,
        )
        .run();
        indent_guides(&doc, &snapshot, &FixedMeasurer, &mut cache)
    }

    #[test]
    fn flat_text_has_no_guides() {
        assert!(guides_for("a\nb\nc").is_empty());
    }

    #[test]
    fn indented_block_draws_one_guide_at_parent_column() {
        let guides = guides_for("top\n    a\n    b\nend");
        assert_eq!(guides.len(), 1);
        let g = guides[0];
        assert_eq!(g.start.x, 0.0);
        // Lines 1..=2 are 14px tall each, starting below line 0.
        assert_eq!(g.start.y, 14.0);
        assert_eq!(g.end.y, 42.0);
    }

    #[test]
    fn nested_indentation_adds_inner_guide() {
        let guides = guides_for("top\n    a\n        b\n        c\n    d\nend");
        assert_eq!(guides.len(), 2);
        // Level 2 guide sits one indent unit in: 4 cols * 7px.
        assert!(guides.iter().any(|g| g.start.x == 28.0));
    }

    #[test]
    fn blank_lines_extend_the_enclosing_block() {
        let guides = guides_for("top\n    a\n\n    b\nend");
        assert_eq!(guides.len(), 1);
        assert_eq!(guides[0].end.y, 56.0);
    }

    #[test]
    fn single_indented_line_draws_nothing() {
        assert!(guides_for("top\n    a\nend").is_empty());
    }

    #[test]
    fn tab_rounds_to_the_next_indent_stop() {
        assert_eq!(indent_columns("\tx"), Some(4));
        assert_eq!(indent_columns("  \tx"), Some(4));
        assert_eq!(indent_columns("    x"), Some(4));
        assert_eq!(indent_columns("   "), None);
    }
}
