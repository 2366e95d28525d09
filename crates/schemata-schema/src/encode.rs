//! # Encoding — Valueds to Raw Trees
//!
//! Encoding is the inverse of decoding: `schema.decode(&v.encode())`
//! yields a valued equal to `v`, and a second encode gives the same tree.
//!
//! Absent struct fields are omitted; an absent sequence item or mapping
//! entry encodes as null so positions and keys survive. A struct writes its tag
//! only where it could be mistaken for another schema: at the top level
//! and wherever the enclosing field or item schema is a union.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use schemata_core::{SchemaError, SchemaResult};

use crate::schema::{Schema, SchemaFamily};
use crate::valued::{State, StructVal, Val, Valued};

/// Encoding switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Omit struct fields whose value equals the field default.
    pub no_defaults: bool,
}

impl Valued {
    pub fn encode(&self) -> Value {
        self.encode_with(&EncodeOptions::default())
    }

    pub fn encode_with(&self, opts: &EncodeOptions) -> Value {
        encode_node(self, true, opts)
    }
}

impl Schema {
    /// Encode a valued that was decoded under this schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Validation` if `valued` belongs to a different
    /// schema.
    pub fn encode(&self, valued: &Valued) -> SchemaResult<Value> {
        if !self.admits(valued.schema()) {
            return Err(SchemaError::validation(
                format!(
                    "value was decoded under `{}`, not `{}`",
                    valued.schema().summary(),
                    self.summary()
                ),
                valued.loc(),
            ));
        }
        Ok(valued.encode())
    }

    /// Decode then encode: the canonical raw form of `raw`.
    pub fn normalize(&self, raw: &Value) -> SchemaResult<Value> {
        Ok(self.decode(raw)?.encode())
    }
}

fn in_union_position(schema: &Schema) -> bool {
    schema.family() == SchemaFamily::Union
}

fn encode_node(valued: &Valued, tagged: bool, opts: &EncodeOptions) -> Value {
    let val = match valued.state() {
        State::Absent => return Value::Null,
        State::Deferred(e) => return Value::String(e.src().to_string()),
        State::Resolved(val) => val,
    };
    match val {
        Val::Bool(b) => Value::Bool(*b),
        Val::Int(i) => Value::from(*i),
        Val::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Val::Str(s) => Value::String(s.clone()),
        Val::Pass(raw) => raw.clone(),
        Val::Seq(items) => {
            let tag_items = valued.schema().item().is_some_and(in_union_position);
            Value::Array(
                items
                    .iter()
                    .map(|v| encode_node(v, tag_items, opts))
                    .collect(),
            )
        }
        Val::Map(entries) => {
            let tag_items = valued.schema().item().is_some_and(in_union_position);
            Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), encode_node(v, tag_items, opts)))
                    .collect(),
            )
        }
        Val::Struct(sv) => encode_struct(valued.schema(), sv, tagged, opts),
    }
}

fn encode_struct(schema: &Schema, sv: &StructVal, tagged: bool, opts: &EncodeOptions) -> Value {
    let mut out = Map::new();
    let def = schema.as_struct();
    if let Some(def) = def.filter(|_| tagged) {
        if let Some(tag) = &def.tag {
            out.insert(def.tag_key.clone(), Value::String(tag.clone()));
        }
    }
    for (name, value) in sv.fields.iter() {
        if value.is_absent() {
            continue;
        }
        let field = def.and_then(|d| d.field(name));
        if opts.no_defaults {
            if let Some(default) = field.and_then(Schema::default_value) {
                if value == default {
                    continue;
                }
            }
        }
        let tag = field.is_some_and(in_union_position);
        out.insert(name.to_string(), encode_node(value, tag, opts));
    }
    for (k, v) in &sv.extra {
        out.insert(k.clone(), v.clone());
    }
    Value::Object(out)
}
