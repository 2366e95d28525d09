//! Integration test: encoded documents validate against the exported JSON
//! Schema.
//!
//! The export is compiled with the `jsonschema` crate, the same validator
//! downstream tooling would use, so a mismatch between `to_json_schema` and
//! the encoder shows up here rather than in an editor plugin.

mod common;

use serde_json::{json, Value};

use schemata_schema::{
    to_json_schema, Context, FloatPrim, IntPrim, Schema, SeqPrim, StrPrim, StructSchema,
    UnionPrim,
};

use common::{fixture, pipeline};

fn validator(schema: &Schema) -> jsonschema::Validator {
    let exported = to_json_schema(schema);
    jsonschema::validator_for(&exported)
        .unwrap_or_else(|e| panic!("export is not a valid JSON Schema: {e}\n{exported:#}"))
}

#[test]
fn test_encoded_pipeline_matches_export() {
    let schema = pipeline();
    let check = validator(&schema);

    let doc = schema.decode(&fixture("pipeline.yaml")).unwrap();
    // Deferred values encode as their marker strings, which the export admits.
    assert!(check.is_valid(&doc.encode()));

    let ctx = Context::new()
        .with("cpu", json!({"count": 2}))
        .with("arch", "aarch64");
    let resolved = doc.evaluate(&ctx).unwrap();
    assert!(check.is_valid(&resolved.encode()));
}

#[test]
fn test_export_rejects_invalid_documents() {
    let schema = pipeline();
    let check = validator(&schema);

    let raw = fixture("pipeline_invalid.yaml");
    assert!(!schema.is_valid(&raw));
    assert!(!check.is_valid(&raw));

    let mut unknown_tag = schema
        .decode(&fixture("pipeline.yaml"))
        .unwrap()
        .encode();
    unknown_tag["steps"][1]["type"] = json!("deploy");
    assert!(!check.is_valid(&unknown_tag));
}

#[test]
fn test_scalar_exports_agree_with_decode() {
    let schemas = [
        IntPrim::new().min(-3).max(3).build().unwrap(),
        IntPrim::new().restricted([2, 4, 8]).build().unwrap(),
        FloatPrim::new().min(0.0).build().unwrap(),
        StrPrim::new().pattern("[a-f0-9]{4}").build().unwrap(),
        StrPrim::new().min_len(2).max_len(3).build().unwrap(),
        SeqPrim::new(IntPrim::new().build().unwrap())
            .max_len(2)
            .build()
            .unwrap(),
        UnionPrim::new([
            IntPrim::new().build().unwrap(),
            StrPrim::new().build().unwrap(),
        ])
        .build()
        .unwrap(),
    ];
    let samples: Vec<Value> = vec![
        json!(-4),
        json!(0),
        json!(3),
        json!(4),
        json!(0.5),
        json!(-0.5),
        json!("beef"),
        json!("BEEF"),
        json!("ab"),
        json!("abcd"),
        json!([1, 2]),
        json!([1, 2, 3]),
        json!(true),
    ];
    for schema in &schemas {
        let check = validator(schema);
        for raw in &samples {
            assert_eq!(
                schema.is_valid(raw),
                check.is_valid(raw),
                "{} disagrees with its export on {raw}",
                schema.summary()
            );
        }
    }
}

#[test]
fn test_open_struct_export() {
    let closed = StructSchema::builder("Closed")
        .field("a", IntPrim::new().build().unwrap())
        .build()
        .unwrap();
    let open = StructSchema::builder("Open")
        .field("a", IntPrim::new().build().unwrap())
        .open(true)
        .build()
        .unwrap();
    let raw = json!({"a": 1, "b": 2});
    assert!(!validator(&closed).is_valid(&raw));
    assert!(validator(&open).is_valid(&raw));
    assert_eq!(open.normalize(&raw).unwrap(), raw);
}
