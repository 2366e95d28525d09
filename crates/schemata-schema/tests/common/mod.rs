//! Shared fixtures: the recursive pipeline schema and its YAML documents.

use std::path::PathBuf;

use serde_json::{json, Value};

use schemata_schema::{
    Declared, EvaluatedClass, IntPrim, MapPrim, Schema, SeqPrim, StrPrim, StructSchema, UnionPrim,
};

/// Parse `tests/fixtures/<name>` into a raw tree.
pub fn fixture(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_yaml::from_str(&text).unwrap_or_else(|e| panic!("invalid YAML in {name}: {e}"))
}

/// Build the pipeline schema. The group step refers to the step union,
/// which in turn contains the group, so it goes through a declaration.
pub fn pipeline() -> Schema {
    let shell = StructSchema::builder("Shell")
        .tag("shell")
        .field("run", StrPrim::new().min_len(1).build().unwrap())
        .field("retries", IntPrim::new().min(0).default_val(0).build().unwrap())
        .struct_proxy("run")
        .build()
        .unwrap();

    let group = Declared::new("group");
    let step = UnionPrim::new([shell, group.schema()]).build().unwrap();
    let steps = SeqPrim::new(step).min_len(1).build().unwrap();

    StructSchema::builder("Group")
        .tag("group")
        .doc("Steps run in order.")
        .field("steps", steps.clone())
        .declared(&group)
        .build()
        .unwrap();

    let evaluated = EvaluatedClass::standard();
    StructSchema::builder("Pipeline")
        .tag("pipeline")
        .field(
            "name",
            StrPrim::new().pattern("[a-z][a-z0-9-]*").build().unwrap(),
        )
        .field(
            "workers",
            IntPrim::new()
                .min(1)
                .default_val(1)
                .evaluated(evaluated.clone())
                .build()
                .unwrap(),
        )
        .field(
            "env",
            MapPrim::new(StrPrim::new().evaluated(evaluated).build().unwrap())
                .default_val(json!({}))
                .build()
                .unwrap(),
        )
        .field("steps", steps)
        .build()
        .unwrap()
}
