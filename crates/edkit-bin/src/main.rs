//! Headless demo driver for the editing kernel.
//!
//! Loads a document (a file path argument, or a built-in sample), replays a
//! short gesture script, and prints the resulting render-model JSON, the
//! same payloads a UI host would consume across the boundary. Useful for
//! eyeballing the wire contract and for tracing the kernel with
//! `RUST_LOG=debug`.

use anyhow::{Context, Result};
use tracing::info;

use core_api::{EngineHandle, create_document_from_file, create_document_from_str, create_engine};
use core_gesture::EventKind;
use core_layout::{FontMetrics, TextMeasurer};
use core_model::StyleId;

const SAMPLE: &str = "fn greet(name: &str) {\n    let msg = format!(\"hi {name}\");\n    println!(\"{msg}\");\n}\n";

/// Fixed-advance measurer standing in for a host font system: every
/// grapheme is `advance` pixels wide.
struct MonospaceMeasurer {
    advance: f32,
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure_width(&self, text: &str, _style_id: StyleId) -> f32 {
        text.chars().count() as f32 * self.advance
    }

    fn font_metrics(&self, _style_id: StyleId) -> FontMetrics {
        FontMetrics::new(12.0, 4.0)
    }
}

fn build_engine() -> EngineHandle {
    create_engine(8.0, 300, Box::new(MonospaceMeasurer { advance: 8.0 }))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut engine = build_engine();
    engine.set_viewport(480, 320);

    let document = match std::env::args().nth(1) {
        Some(path) => create_document_from_file(&path)
            .with_context(|| format!("loading document from {path}"))?,
        None => create_document_from_str(SAMPLE),
    };
    info!(lines = document.line_count(), "document_ready");
    engine.load_document(document);

    // A tap followed by a short drag, the way a touch host would report it.
    let script = [
        (EventKind::TouchDown, vec![40.0, 20.0]),
        (EventKind::TouchUp, vec![40.0, 20.0]),
        (EventKind::TouchDown, vec![40.0, 60.0]),
        (EventKind::TouchMove, vec![40.0, 90.0]),
        (EventKind::TouchMove, vec![40.0, 120.0]),
        (EventKind::TouchUp, vec![40.0, 120.0]),
    ];
    for (kind, points) in script {
        let result = engine.handle_gesture_event(kind, &points)?;
        println!("gesture {kind:?} -> {result}");
    }

    let frame = engine.build_render_model()?;
    println!("{frame}");
    Ok(())
}
