//! # JSON Schema Export
//!
//! Translates a [`Schema`] into a JSON Schema (Draft 2020-12) document
//! describing its *encoded* form, so any tree produced by
//! [`crate::Valued::encode`] validates against the export. Downstream
//! tooling (editors, CI linters) can then check documents without this
//! crate.
//!
//! ## Mapping
//!
//! | Schema | JSON Schema |
//! |--------|-------------|
//! | bool / int / float / str | `type` with bounds, `pattern` and `enum` |
//! | pass | `{}` |
//! | seq / map | `items` / `additionalProperties` |
//! | union | `anyOf` |
//! | struct | `properties`, `required`, `additionalProperties` |
//! | declared | `$ref` into `$defs`, keyed by tag |
//!
//! An evaluated schema additionally admits any string carrying one of its
//! markers.

use serde_json::{json, Map, Value};

use crate::schema::{Schema, SchemaKind};

/// `$schema` URI of exported documents.
pub const JSON_SCHEMA_DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Export `schema` as a standalone JSON Schema document.
pub fn to_json_schema(schema: &Schema) -> Value {
    let mut defs = Map::new();
    let body = export_node(schema, &mut defs);
    let mut doc = Map::new();
    doc.insert("$schema".to_string(), Value::String(JSON_SCHEMA_DRAFT.to_string()));
    match body {
        Value::Object(m) => doc.extend(m),
        other => {
            doc.insert("allOf".to_string(), Value::Array(vec![other]));
        }
    }
    if !defs.is_empty() {
        doc.insert("$defs".to_string(), Value::Object(defs));
    }
    Value::Object(doc)
}

fn export_node(schema: &Schema, defs: &mut Map<String, Value>) -> Value {
    if let Some(d) = schema.declared() {
        let name = d.tag().to_string();
        if !defs.contains_key(&name) {
            // Placeholder first so recursive references terminate.
            defs.insert(name.clone(), Value::Bool(true));
            if let Some(target) = d.target() {
                let body = export_node(target, defs);
                defs.insert(name.clone(), body);
            }
        }
        return json!({ "$ref": format!("#/$defs/{name}") });
    }

    let mut out = Map::new();
    match schema.kind() {
        SchemaKind::Bool => {
            out.insert("type".into(), json!("boolean"));
        }
        SchemaKind::Int { min, max } => {
            out.insert("type".into(), json!("integer"));
            if let Some(v) = min {
                out.insert("minimum".into(), json!(v));
            }
            if let Some(v) = max {
                out.insert("maximum".into(), json!(v));
            }
        }
        SchemaKind::Float { min, max } => {
            out.insert("type".into(), json!("number"));
            if let Some(v) = min {
                out.insert("minimum".into(), json!(v));
            }
            if let Some(v) = max {
                out.insert("maximum".into(), json!(v));
            }
        }
        SchemaKind::Str(opts) => {
            out.insert("type".into(), json!("string"));
            if let Some(n) = opts.min_len {
                out.insert("minLength".into(), json!(n));
            }
            if let Some(n) = opts.max_len {
                out.insert("maxLength".into(), json!(n));
            }
            if let Some(p) = &opts.pattern {
                out.insert("pattern".into(), json!(p.as_str()));
            }
        }
        SchemaKind::Pass | SchemaKind::Declared(_) => {}
        SchemaKind::Seq(c) => {
            out.insert("type".into(), json!("array"));
            out.insert("items".into(), export_node(&c.item, defs));
            if let Some(n) = c.min_len {
                out.insert("minItems".into(), json!(n));
            }
            if let Some(n) = c.max_len {
                out.insert("maxItems".into(), json!(n));
            }
        }
        SchemaKind::Map(c) => {
            out.insert("type".into(), json!("object"));
            out.insert("additionalProperties".into(), export_node(&c.item, defs));
            if let Some(n) = c.min_len {
                out.insert("minProperties".into(), json!(n));
            }
            if let Some(n) = c.max_len {
                out.insert("maxProperties".into(), json!(n));
            }
        }
        SchemaKind::Union(members) => {
            let any: Vec<Value> = members.iter().map(|m| export_node(m, defs)).collect();
            out.insert("anyOf".into(), Value::Array(any));
        }
        SchemaKind::Struct(def) => {
            let mut props = Map::new();
            let mut required = Vec::new();
            if let Some(tag) = &def.tag {
                props.insert(def.tag_key.clone(), json!({ "const": tag }));
            }
            for (name, field) in &def.fields {
                props.insert(name.clone(), export_node(field, defs));
                if field.default_value().is_none() && schemata_core::is_required(field.default_val())
                {
                    required.push(Value::String(name.clone()));
                }
            }
            out.insert("type".into(), json!("object"));
            out.insert("title".into(), json!(def.name));
            out.insert("properties".into(), Value::Object(props));
            if !required.is_empty() {
                out.insert("required".into(), Value::Array(required));
            }
            if !def.open {
                out.insert("additionalProperties".into(), Value::Bool(false));
            }
        }
    }

    if let Some(values) = schema.restricted() {
        out.insert("enum".into(), Value::Array(values.to_vec()));
    }
    if !schema.doc().is_empty() {
        out.insert("description".into(), json!(schema.doc()));
    }
    if let Some(v) = schema.default_value().filter(|_| !schema.default_is_expression()) {
        out.insert("default".into(), v.clone());
    }

    let body = Value::Object(out);
    match schema.evaluated() {
        Some(class) => {
            let names: Vec<String> = class.names().map(regex::escape).collect();
            let pattern = format!(
                "^{}({}):",
                regex::escape(class.marker()),
                names.join("|")
            );
            json!({ "anyOf": [body, { "type": "string", "pattern": pattern }] })
        }
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declared::Declared;
    use crate::prim::{IntPrim, SeqPrim, StrPrim, UnionPrim};
    use crate::structure::StructSchema;
    use schemata_eval::EvaluatedClass;

    #[test]
    fn exports_scalar_constraints() {
        let s = IntPrim::new().min(1).max(9).restricted([1, 5]).build().unwrap();
        let doc = to_json_schema(&s);
        assert_eq!(doc["$schema"], json!(JSON_SCHEMA_DRAFT));
        assert_eq!(doc["type"], json!("integer"));
        assert_eq!(doc["minimum"], json!(1));
        assert_eq!(doc["enum"], json!([1, 5]));
    }

    #[test]
    fn exports_struct_properties() {
        let s = StructSchema::builder("S")
            .tag("s")
            .field("a", IntPrim::new().build().unwrap())
            .field("b", StrPrim::new().default_val("x").build().unwrap())
            .build()
            .unwrap();
        let doc = to_json_schema(&s);
        assert_eq!(doc["properties"]["type"], json!({"const": "s"}));
        assert_eq!(doc["required"], json!(["a"]));
        assert_eq!(doc["additionalProperties"], json!(false));
        assert_eq!(doc["properties"]["b"]["default"], json!("x"));
    }

    #[test]
    fn recursive_declarations_use_defs() {
        let d = Declared::new("node");
        StructSchema::builder("Node")
            .tag("node")
            .field(
                "children",
                SeqPrim::new(UnionPrim::new([d.schema()]).build().unwrap())
                    .default_val(json!([]))
                    .build()
                    .unwrap(),
            )
            .declared(&d)
            .build()
            .unwrap();
        let doc = to_json_schema(&d.schema());
        assert_eq!(doc["$ref"], json!("#/$defs/node"));
        assert_eq!(doc["$defs"]["node"]["title"], json!("Node"));
        assert_eq!(
            doc["$defs"]["node"]["properties"]["children"]["items"]["anyOf"][0],
            json!({"$ref": "#/$defs/node"})
        );
    }

    #[test]
    fn evaluated_schemas_admit_markers() {
        let s = IntPrim::new()
            .evaluated(EvaluatedClass::standard())
            .build()
            .unwrap();
        let doc = to_json_schema(&s);
        assert_eq!(doc["anyOf"][1]["pattern"], json!("^\\$(expr|tmpl):"));
    }
}
