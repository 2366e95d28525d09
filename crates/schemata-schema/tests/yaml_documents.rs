//! Integration test: decode YAML pipeline documents from `tests/fixtures/`.
//!
//! The fixtures are parsed with `serde_yaml` into `serde_json::Value` and
//! decoded under a recursive pipeline schema: tagged step structs, a
//! forward-declared group that contains further steps, a struct proxy for
//! the short string form of a step, and evaluated fields resolved after
//! decoding.

mod common;

use serde_json::json;

use schemata_schema::{CollectSink, Context, Hint, TracingSink};

use common::{fixture, pipeline};

fn pointers(hint: &Hint, out: &mut Vec<String>) {
    if let Some(loc) = &hint.loc {
        out.push(loc.pointer());
    }
    for child in &hint.children {
        pointers(child, out);
    }
}

#[test]
fn test_decode_valid_pipeline() {
    let schema = pipeline();
    let doc = schema.decode(&fixture("pipeline.yaml")).unwrap();

    assert_eq!(doc.get("name").unwrap().as_str(), Some("nightly-build"));
    assert!(doc.get("workers").unwrap().is_deferred());

    let steps = doc.get("steps").unwrap();
    let short = steps.index(0).unwrap();
    assert_eq!(short.get("run").unwrap().as_str(), Some("cargo fmt --check"));
    assert_eq!(short.get("retries").unwrap().as_int(), Some(0));

    let nested = steps.index(2).unwrap().get("steps").unwrap();
    assert_eq!(nested.index(0).unwrap().get("retries").unwrap().as_int(), Some(2));
    let inner = nested.index(1).unwrap().get("steps").unwrap();
    assert_eq!(
        inner.index(0).unwrap().get("run").unwrap().loc().pointer(),
        "/steps/2/steps/1/steps/0/run"
    );
}

#[test]
fn test_evaluate_and_encode_pipeline() {
    let schema = pipeline();
    let doc = schema.decode(&fixture("pipeline.yaml")).unwrap();
    let ctx = Context::new()
        .with("cpu", json!({"count": 4}))
        .with("arch", "x86_64");
    let resolved = doc.evaluate(&ctx).unwrap();
    assert!(resolved.is_resolved());

    let out = resolved.encode();
    assert_eq!(out["type"], json!("pipeline"));
    assert_eq!(out["workers"], json!(4));
    assert_eq!(out["env"]["TARGET"], json!("x86_64-linux"));
    assert_eq!(
        out["steps"][0],
        json!({"type": "shell", "run": "cargo fmt --check", "retries": 0})
    );
    assert_eq!(out["steps"][2]["steps"][1]["type"], json!("group"));

    // The encoded document is itself a valid, fully resolved pipeline.
    let again = schema.decode(&out).unwrap();
    assert_eq!(again, resolved);
}

#[test]
fn test_invalid_pipeline_reports_every_location() {
    let schema = pipeline();
    let err = schema.decode(&fixture("pipeline_invalid.yaml")).unwrap_err();
    assert!(err.is_validation());

    let mut found = Vec::new();
    pointers(err.hint(), &mut found);
    for expected in ["/name", "/workers", "/steps/0/run", "/steps/1", "/timeout"] {
        assert!(
            found.iter().any(|p| p == expected),
            "no hint at {expected}; found {found:?}"
        );
    }
}

#[test]
fn test_invalid_pipeline_through_sinks() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();

    let schema = pipeline();
    let raw = fixture("pipeline_invalid.yaml");

    let sink = CollectSink::new();
    assert!(!schema.validate_into(&raw, &sink));
    assert_eq!(sink.len(), 1);
    assert!(sink.hints()[0].primary.contains("`Pipeline`"));

    assert!(!schema.validate_into(&raw, &TracingSink));
    assert!(schema.validate_into(&fixture("pipeline.yaml"), &TracingSink));
}

#[test]
fn test_group_documentation() {
    let schema = pipeline();
    let steps = schema.as_struct().unwrap().field("steps").unwrap();
    let group = &steps.item().unwrap().members()[1];
    let doc = group.render_doc();
    assert!(doc.starts_with("Group\nSteps run in order.\n"));
    assert!(doc.contains("tag: group (tag_key: type)"));
}
