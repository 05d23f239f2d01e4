//! Wire-contract tests: the serialized payloads keep snake_case keys and
//! symbolic enum names, and errors surface as values the host can match on.

use std::io::Write;

use serde_json::Value;

use core_api::{
    ApiError, create_document, create_document_from_file, create_document_from_str, create_engine,
};
use core_gesture::EventKind;
use core_layout::{FontMetrics, TextMeasurer};
use core_model::StyleId;

struct FixedMeasurer;

impl TextMeasurer for FixedMeasurer {
    fn measure_width(&self, text: &str, _style_id: StyleId) -> f32 {
        text.chars().count() as f32 * 7.0
    }

    fn font_metrics(&self, _style_id: StyleId) -> FontMetrics {
        FontMetrics::new(11.0, 3.0)
    }
}

#[test]
fn render_model_payload_keeps_the_field_contract() {
    let mut engine = create_engine(10.0, 300, Box::new(FixedMeasurer));
    engine.set_viewport(300, 100);
    engine.load_document(create_document_from_str("AAAAA\nBBB"));

    let json = engine.build_render_model().unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    assert!(value.get("current_line").is_some());
    assert!(value.get("cursor").is_some());
    assert!(value.get("guide_lines").is_some());
    let lines = value["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["logical_line"], 0);
    assert_eq!(lines[1]["logical_line"], 1);

    let first_run = &lines[0]["runs"][0];
    assert_eq!(first_run["type"], "TEXT");
    for key in ["x", "y", "text_id", "style_id"] {
        assert!(first_run.get(key).is_some(), "missing run key {key}");
    }
    // The newline run rides on the first line as its own kind.
    let kinds: Vec<&str> = lines[0]["runs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["TEXT", "NEWLINE"]);

    assert_eq!(value["cursor"]["show_dragger"], false);
    assert!(value["cursor"]["position"].get("x").is_some());
}

#[test]
fn run_text_resolves_ids_from_the_payload() {
    let mut engine = create_engine(10.0, 300, Box::new(FixedMeasurer));
    engine.set_viewport(300, 100);
    engine.load_document(create_document_from_str("hi there"));

    let json = engine.build_render_model().unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    let mut rebuilt = String::new();
    for run in value["lines"][0]["runs"].as_array().unwrap() {
        let id = run["text_id"].as_i64().unwrap();
        rebuilt.push_str(&engine.get_run_text(id).unwrap());
    }
    assert_eq!(rebuilt, "hi there");

    assert!(matches!(
        engine.get_run_text(9999),
        Err(ApiError::UnknownTextId(9999))
    ));
}

#[test]
fn gesture_payload_uses_symbolic_type_names() {
    let mut engine = create_engine(10.0, 300, Box::new(FixedMeasurer));
    engine.set_viewport(300, 100);
    engine.load_document(create_document_from_str("text"));

    // A mouse click resolves immediately and carries only its tap point.
    let json = engine
        .handle_gesture_event(EventKind::MouseDown, &[12.0, 8.0])
        .unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["type"], "TAP");
    assert_eq!(value["tap_point"]["x"], 12.0);
    assert!(value.get("scale").is_none());
    assert!(value.get("scroll_x").is_none());

    // A non-terminal sample still answers, with the undefined classification.
    let json = engine
        .handle_gesture_event(EventKind::TouchDown, &[12.0, 8.0])
        .unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["type"], "UNDEFINED");
}

#[test]
fn build_before_load_reports_no_document() {
    let mut engine = create_engine(10.0, 300, Box::new(FixedMeasurer));
    engine.set_viewport(300, 100);
    assert!(matches!(
        engine.build_render_model(),
        Err(ApiError::NoDocumentLoaded)
    ));
}

#[test]
fn invalid_utf8_never_partially_loads() {
    let err = create_document(vec![b'a', 0xF0, 0x28]).unwrap_err();
    assert!(matches!(err, ApiError::InvalidEncoding(_)));
}

#[test]
fn documents_load_from_files_with_the_same_encoding_check() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all("from\ndisk".as_bytes()).unwrap();
    let doc = create_document_from_file(file.path()).unwrap();
    assert_eq!(doc.line_count(), 2);
    assert_eq!(doc.line_text(1), Some("disk"));

    let mut bad = tempfile::NamedTempFile::new().unwrap();
    bad.write_all(&[0xFF, 0xFF]).unwrap();
    assert!(matches!(
        create_document_from_file(bad.path()),
        Err(ApiError::InvalidEncoding(_))
    ));

    assert!(matches!(
        create_document_from_file("/definitely/not/a/real/path"),
        Err(ApiError::Io(_))
    ));
}

#[test]
fn negative_viewport_extents_clamp_instead_of_failing() {
    let mut engine = create_engine(10.0, 300, Box::new(FixedMeasurer));
    engine.set_viewport(-5, -5);
    engine.load_document(create_document_from_str("abc"));
    // Unwrapped layout still produces a frame.
    let json = engine.build_render_model().unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["lines"].as_array().unwrap().len(), 1);
}
