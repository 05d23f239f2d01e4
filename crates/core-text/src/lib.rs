//! Logical text buffer: an immutable UTF-8 document plus its newline index.
//!
//! The document is replaced wholesale on reload; there is no incremental edit
//! surface at this boundary. The newline index is a sorted table of `\n` byte
//! offsets, so mapping a byte offset to its logical line is a binary search.

use thiserror::Error;

/// Document ingestion failure. Input that is not valid UTF-8 is rejected
/// before anything is loaded; there is no partial document state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("document bytes are not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidEncoding { valid_up_to: usize },
}

/// A position inside a document expressed as (logical line, column).
/// Columns count chars within the line, not bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
}

impl TextPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn origin() -> Self {
        Self { line: 0, column: 0 }
    }

    /// Clamp the position onto an existing line/column of `doc`.
    pub fn clamped_to(mut self, doc: &Document) -> Self {
        if self.line >= doc.line_count() {
            self.line = doc.line_count() - 1;
        }
        let max_col = doc.line_char_count(self.line);
        if self.column > max_col {
            self.column = max_col;
        }
        self
    }
}

/// The logical document: owned UTF-8 text and the offsets of every `\n`.
///
/// A document always has at least one logical line; the empty document has a
/// single empty line. Line text excludes the terminating newline, which the
/// layout pass represents as its own zero-width run.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    newline_offsets: Vec<usize>,
}

impl Document {
    /// Ingest raw bytes, rejecting anything that is not valid UTF-8.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, EncodingError> {
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Self::from_string(text)),
            Err(e) => Err(EncodingError::InvalidEncoding {
                valid_up_to: e.utf8_error().valid_up_to(),
            }),
        }
    }

    pub fn from_str(text: &str) -> Self {
        Self::from_string(text.to_owned())
    }

    pub fn from_string(text: String) -> Self {
        let newline_offsets = text
            .bytes()
            .enumerate()
            .filter_map(|(i, b)| (b == b'\n').then_some(i))
            .collect();
        Self {
            text,
            newline_offsets,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len_bytes(&self) -> usize {
        self.text.len()
    }

    /// Total number of logical lines. Always >= 1.
    pub fn line_count(&self) -> usize {
        self.newline_offsets.len() + 1
    }

    /// Byte offset where line `idx` starts.
    fn line_start(&self, idx: usize) -> usize {
        if idx == 0 {
            0
        } else {
            self.newline_offsets[idx - 1] + 1
        }
    }

    /// Byte offset just past the content of line `idx` (before its newline).
    fn line_content_end(&self, idx: usize) -> usize {
        self.newline_offsets
            .get(idx)
            .copied()
            .unwrap_or(self.text.len())
    }

    /// The text of line `idx`, excluding any trailing newline.
    pub fn line_text(&self, idx: usize) -> Option<&str> {
        if idx >= self.line_count() {
            return None;
        }
        Some(&self.text[self.line_start(idx)..self.line_content_end(idx)])
    }

    /// Byte range of line `idx` including its newline, if present.
    pub fn line_span(&self, idx: usize) -> Option<std::ops::Range<usize>> {
        if idx >= self.line_count() {
            return None;
        }
        let end = match self.newline_offsets.get(idx) {
            Some(nl) => nl + 1,
            None => self.text.len(),
        };
        Some(self.line_start(idx)..end)
    }

    /// Whether line `idx` is terminated by a `\n` in the buffer.
    pub fn has_newline_after(&self, idx: usize) -> bool {
        idx < self.newline_offsets.len()
    }

    /// Number of chars on line `idx` (newline excluded).
    pub fn line_char_count(&self, idx: usize) -> usize {
        self.line_text(idx).map_or(0, |s| s.chars().count())
    }

    /// Logical line containing byte `offset`. O(log n) over the newline
    /// table; offsets past the end land on the last line.
    pub fn line_at_byte(&self, offset: usize) -> usize {
        self.newline_offsets.partition_point(|&nl| nl < offset)
    }

    /// (line, column) of byte `offset` (clamped to the document end).
    pub fn position_at_byte(&self, offset: usize) -> TextPosition {
        let offset = offset.min(self.text.len());
        let line = self.line_at_byte(offset);
        let start = self.line_start(line);
        let column = self.text[start..offset].chars().count();
        TextPosition { line, column }
    }

    /// Byte offset of `pos`, after clamping it onto the document.
    pub fn byte_at_position(&self, pos: TextPosition) -> usize {
        let pos = pos.clamped_to(self);
        let line = self.line_text(pos.line).unwrap_or("");
        let within: usize = line
            .char_indices()
            .nth(pos.column)
            .map_or(line.len(), |(i, _)| i);
        self.line_start(pos.line) + within
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Self::from_string(text)
    }
}

/// Grapheme-cluster helpers operating on a single line of text. Wrap and hit
/// testing step by cluster so multi-byte sequences never split mid-glyph.
pub mod grapheme {
    use unicode_segmentation::UnicodeSegmentation;

    /// Iterate grapheme clusters in a line.
    pub fn iter(line: &str) -> impl Iterator<Item = &str> {
        line.graphemes(true)
    }

    /// Iterate (byte offset, cluster) pairs.
    pub fn index_iter(line: &str) -> impl Iterator<Item = (usize, &str)> {
        line.grapheme_indices(true)
    }

    /// Previous cluster boundary (returns 0 at or below the first boundary).
    pub fn prev_boundary(line: &str, byte: usize) -> usize {
        if byte == 0 || byte > line.len() {
            return 0;
        }
        let mut last = 0;
        for (idx, _) in line.grapheme_indices(true) {
            if idx >= byte {
                break;
            }
            last = idx;
        }
        last
    }

    /// Next cluster boundary (returns `line.len()` at or beyond the end).
    pub fn next_boundary(line: &str, byte: usize) -> usize {
        if byte >= line.len() {
            return line.len();
        }
        for (idx, _) in line.grapheme_indices(true) {
            if idx > byte {
                return idx;
            }
        }
        line.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_has_one_line() {
        let d = Document::from_str("");
        assert_eq!(d.line_count(), 1);
        assert_eq!(d.line_text(0), Some(""));
        assert!(!d.has_newline_after(0));
    }

    #[test]
    fn trailing_newline_creates_final_empty_line() {
        let d = Document::from_str("abc\n");
        assert_eq!(d.line_count(), 2);
        assert_eq!(d.line_text(0), Some("abc"));
        assert_eq!(d.line_text(1), Some(""));
        assert!(d.has_newline_after(0));
        assert!(!d.has_newline_after(1));
    }

    #[test]
    fn line_text_excludes_newline() {
        let d = Document::from_str("hello\nworld");
        assert_eq!(d.line_text(0), Some("hello"));
        assert_eq!(d.line_text(1), Some("world"));
        assert_eq!(d.line_text(2), None);
    }

    #[test]
    fn line_span_includes_newline() {
        let d = Document::from_str("ab\ncd");
        assert_eq!(d.line_span(0), Some(0..3));
        assert_eq!(d.line_span(1), Some(3..5));
    }

    #[test]
    fn rejects_invalid_utf8_wholesale() {
        let err = Document::from_bytes(vec![b'o', b'k', 0xFF, 0xFE]).unwrap_err();
        assert_eq!(err, EncodingError::InvalidEncoding { valid_up_to: 2 });
    }

    #[test]
    fn line_at_byte_binary_search_edges() {
        let d = Document::from_str("ab\ncd\nef");
        // Offsets 0..=2 live on line 0 (the '\n' at byte 2 belongs to line 0).
        assert_eq!(d.line_at_byte(0), 0);
        assert_eq!(d.line_at_byte(2), 0);
        assert_eq!(d.line_at_byte(3), 1);
        assert_eq!(d.line_at_byte(5), 1);
        assert_eq!(d.line_at_byte(6), 2);
        assert_eq!(d.line_at_byte(100), 2);
    }

    #[test]
    fn position_byte_round_trip_multibyte() {
        let d = Document::from_str("a\u{00e9}b\n\u{6f22}\u{5b57}");
        let pos = d.position_at_byte(d.byte_at_position(TextPosition::new(1, 1)));
        assert_eq!(pos, TextPosition::new(1, 1));
        // Columns count chars, not bytes.
        assert_eq!(d.line_char_count(0), 3);
        assert_eq!(d.line_char_count(1), 2);
    }

    #[test]
    fn clamp_past_end_lands_on_last_column() {
        let d = Document::from_str("ab\ncd");
        let p = TextPosition::new(9, 9).clamped_to(&d);
        assert_eq!(p, TextPosition::new(1, 2));
    }

    #[test]
    fn grapheme_boundaries_cluster_emoji() {
        let s = "a\u{1F600}b";
        let after_a = grapheme::next_boundary(s, 0);
        let after_emoji = grapheme::next_boundary(s, after_a);
        assert_eq!(grapheme::prev_boundary(s, after_emoji), after_a);
        assert_eq!(grapheme::iter(s).count(), 3);
    }
}
