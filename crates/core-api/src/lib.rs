//! The boundary surface of the kernel.
//!
//! Hosts talk to the engine through two ownership tokens and a handful of
//! operations whose results cross the boundary as UTF-8 JSON with a stable
//! snake_case field contract. A [`DocumentHandle`] and an [`EngineHandle`]
//! are unique, non-`Copy` values: release is their `Drop`, which runs
//! exactly once on every path, so the stale-handle failure class of a raw
//! pointer boundary cannot occur here and carries no error variant.
//!
//! Errors are values, never unwinds: a failed operation returns an
//! [`ApiError`] the host can distinguish from an empty result.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use core_engine::{EditorEngine, EngineConfig, EngineError};
use core_gesture::{EventKind, Gesture, GestureEvent};
use core_layout::TextMeasurer;
use core_text::{Document, EncodingError};

/// Boundary error taxonomy. `InvalidEncoding` rejects a document before
/// anything loads; the rest mirror [`EngineError`] plus the I/O and
/// serialization failures this layer introduces.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    InvalidEncoding(#[from] EncodingError),
    #[error("no document loaded")]
    NoDocumentLoaded,
    #[error("unknown text id {0}")]
    UnknownTextId(i64),
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::NoDocumentLoaded => ApiError::NoDocumentLoaded,
            EngineError::UnknownTextId(id) => ApiError::UnknownTextId(id),
        }
    }
}

/// Ownership token for a loaded-but-unattached document.
///
/// Consumed by [`EngineHandle::load_document`]; dropping it without loading
/// releases the document.
#[derive(Debug)]
pub struct DocumentHandle(Document);

impl DocumentHandle {
    pub fn text(&self) -> &str {
        self.0.text()
    }

    pub fn line_count(&self) -> usize {
        self.0.line_count()
    }

    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.0.line_text(line)
    }

    pub fn into_inner(self) -> Document {
        self.0
    }
}

/// Create a document from raw UTF-8 bytes. Rejects invalid UTF-8 wholesale.
pub fn create_document(bytes: Vec<u8>) -> Result<DocumentHandle, ApiError> {
    Ok(DocumentHandle(Document::from_bytes(bytes)?))
}

/// Create a document from an already-validated string.
pub fn create_document_from_str(text: &str) -> DocumentHandle {
    DocumentHandle(Document::from_str(text))
}

/// Create a document by reading a file. The bytes face the same encoding
/// check as [`create_document`].
pub fn create_document_from_file(path: impl AsRef<Path>) -> Result<DocumentHandle, ApiError> {
    let bytes = std::fs::read(path.as_ref())?;
    debug!(target: "api", bytes = bytes.len(), "document_file_read");
    Ok(DocumentHandle(Document::from_bytes(bytes)?))
}

/// Ownership token for one engine instance. All operations are synchronous
/// and require `&mut`, which statically enforces the single-owner,
/// exclusive-access discipline the kernel demands.
pub struct EngineHandle(EditorEngine);

/// Create an engine with the public gesture tunables and the host's
/// measurement capability. The capability is held for the engine's
/// lifetime.
pub fn create_engine(
    touch_slop_px: f32,
    double_tap_timeout_ms: i64,
    measurer: Box<dyn TextMeasurer>,
) -> EngineHandle {
    EngineHandle(EditorEngine::new(
        EngineConfig::new(touch_slop_px, double_tap_timeout_ms),
        measurer,
    ))
}

impl EngineHandle {
    /// Report the drawing area in device pixels. Negative extents clamp to
    /// zero.
    pub fn set_viewport(&mut self, width: i32, height: i32) {
        self.0
            .set_viewport(width.max(0) as f32, height.max(0) as f32);
    }

    /// Attach a document, consuming its token. The engine owns the document
    /// from here on; reloading replaces it wholesale.
    pub fn load_document(&mut self, document: DocumentHandle) {
        self.0.load_document(document.into_inner());
    }

    /// Feed one raw pointer sample (`[x0, y0, x1, y1, ..]`) and serialize
    /// the classification.
    pub fn handle_gesture_event(
        &mut self,
        kind: EventKind,
        points: &[f32],
    ) -> Result<String, ApiError> {
        let event = GestureEvent::from_flat(kind, points);
        let result = self.0.handle_gesture_event(&event);
        Ok(result.to_json()?)
    }

    /// Classify without serializing, for in-process hosts.
    pub fn handle_gesture_event_value(&mut self, kind: EventKind, points: &[f32]) -> Gesture {
        self.0.handle_gesture_event(&GestureEvent::from_flat(kind, points))
    }

    /// Build and serialize one frame snapshot.
    pub fn build_render_model(&mut self) -> Result<String, ApiError> {
        let model = self.0.build_render_model()?;
        Ok(model.to_json()?)
    }

    /// Resolve a run's text id from the snapshot that minted it.
    pub fn get_run_text(&self, text_id: i64) -> Result<String, ApiError> {
        Ok(self.0.run_text(text_id)?.to_owned())
    }

    /// Drop cached measurements after a host-side font change.
    pub fn reset_text_measurer(&mut self) {
        self.0.reset_metrics();
    }

    /// Direct access for in-process hosts that want typed values instead of
    /// serialized payloads.
    pub fn engine(&self) -> &EditorEngine {
        &self.0
    }

    pub fn engine_mut(&mut self) -> &mut EditorEngine {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_bytes_are_rejected_at_creation() {
        let err = create_document(vec![0xC0, 0x80]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidEncoding(_)));
    }

    #[test]
    fn document_handle_exposes_line_access() {
        let doc = create_document(b"ab\ncd".to_vec()).unwrap();
        assert_eq!(doc.line_count(), 2);
        assert_eq!(doc.line_text(1), Some("cd"));
        assert_eq!(doc.text(), "ab\ncd");
    }
}
