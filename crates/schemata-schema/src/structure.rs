//! # Struct Schemas
//!
//! A struct schema is an ordered set of named field schemas, optionally
//! tagged so it can be told apart from other structs inside a union.
//!
//! ## Design
//!
//! - Fields keep declaration order; decoding and encoding preserve it.
//! - A tagged struct reserves `tag_key` in its raw mapping. The tag is
//!   emitted only where the struct could be confused with another schema:
//!   at the top level and in union positions.
//! - `struct_proxy` names a field that receives the raw value whenever the
//!   input is not a mapping, so `5` decodes like `{"x": 5}`.
//! - `extends` copies the parent's fields (and tag key, proxy and
//!   openness) ahead of the child's own. A child field with a parent's name
//!   replaces it in place.
//! - A `derived` default is computed from the field defaults and validated
//!   like any other default.
//!
//! ```
//! use schemata_schema::prim::IntPrim;
//! use schemata_schema::structure::StructSchema;
//!
//! let point = StructSchema::builder("Point")
//!     .field("x", IntPrim::new().build().unwrap())
//!     .field("y", IntPrim::new().default_val(0).build().unwrap())
//!     .build()
//!     .unwrap();
//! let v = point.decode(&serde_json::json!({"x": 1})).unwrap();
//! assert_eq!(v.encode(), serde_json::json!({"x": 1, "y": 0}));
//! ```

use std::collections::HashSet;

use serde_json::{Map, Value};

use schemata_core::{is_derived, is_required, DefaultVal, Hint, SchemaError, SchemaResult, Special};
use schemata_eval::EvaluatedClass;

use crate::declared::Declared;
use crate::prim::impl_common_options;
use crate::schema::{finish, CommonSpec, Schema, SchemaKind};

/// Tag key used when a struct does not name its own.
pub const DEFAULT_TAG_KEY: &str = "type";

/// Field layout and tagging of a struct schema.
#[derive(Debug, Clone)]
pub struct StructDef {
    pub(crate) name: String,
    pub(crate) fields: Vec<(String, Schema)>,
    pub(crate) tag: Option<String>,
    pub(crate) tag_key: String,
    pub(crate) proxy: Option<String>,
    pub(crate) open: bool,
}

impl StructDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn tag_key(&self) -> &str {
        &self.tag_key
    }

    /// Field that receives a non-mapping raw value.
    pub fn struct_proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// Whether unknown keys are kept instead of rejected.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.fields.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn field(&self, name: &str) -> Option<&Schema> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether `key` is this struct's tag key and `value` its tag.
    pub(crate) fn is_tag_entry(&self, key: &str, value: &Value) -> bool {
        match &self.tag {
            Some(tag) => key == self.tag_key && value.as_str() == Some(tag.as_str()),
            None => false,
        }
    }

    pub(crate) fn zero_init(&self) -> Value {
        let mut out = Map::new();
        if let Some(tag) = &self.tag {
            out.insert(self.tag_key.clone(), Value::String(tag.clone()));
        }
        for (name, field) in &self.fields {
            let init = field.init_val();
            if !init.is_null() {
                out.insert(name.clone(), strip_tag(field, init.clone()));
            }
        }
        Value::Object(out)
    }
}

/// Drop the tag entry from a raw struct nested in a non-union position.
pub(crate) fn strip_tag(schema: &Schema, value: Value) -> Value {
    match (schema.as_struct(), value) {
        (Some(def), Value::Object(mut map)) => {
            if let Some(tag) = &def.tag {
                if map.get(&def.tag_key).and_then(Value::as_str) == Some(tag.as_str()) {
                    map.remove(&def.tag_key);
                }
            }
            Value::Object(map)
        }
        (_, value) => value,
    }
}

/// Entry point for building struct schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructSchema;

impl StructSchema {
    pub fn builder(name: impl Into<String>) -> StructBuilder {
        StructBuilder {
            name: name.into(),
            fields: Vec::new(),
            tag: None,
            tag_key: None,
            proxy: None,
            open: None,
            parent: None,
            declared: None,
            problems: Vec::new(),
            common: CommonSpec::default(),
        }
    }
}

/// Builder for a struct schema. See [`StructSchema::builder`].
#[derive(Debug, Clone)]
pub struct StructBuilder {
    name: String,
    fields: Vec<(String, Schema)>,
    tag: Option<String>,
    tag_key: Option<String>,
    proxy: Option<String>,
    open: Option<bool>,
    parent: Option<StructDef>,
    declared: Option<Declared>,
    problems: Vec<Hint>,
    common: CommonSpec,
}

impl StructBuilder {
    /// Append a field.
    pub fn field(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.fields.push((name.into(), schema));
        self
    }

    /// Value stored under the tag key to identify this struct.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Mapping key holding the tag. Defaults to [`DEFAULT_TAG_KEY`].
    pub fn tag_key(mut self, key: impl Into<String>) -> Self {
        self.tag_key = Some(key.into());
        self
    }

    pub fn struct_proxy(mut self, field: impl Into<String>) -> Self {
        self.proxy = Some(field.into());
        self
    }

    /// Keep unknown keys instead of rejecting them.
    pub fn open(mut self, open: bool) -> Self {
        self.open = Some(open);
        self
    }

    /// Inherit the fields of another struct schema.
    pub fn extends(mut self, parent: &Schema) -> Self {
        let has_parent = self.parent.is_some();
        match parent.as_struct() {
            _ if has_parent => self
                .problems
                .push(Hint::error("a struct may extend only one parent")),
            None => self.problems.push(Hint::error(format!(
                "cannot extend a {} schema",
                parent.family()
            ))),
            Some(def) => self.parent = Some(def.clone()),
        }
        self
    }

    /// Bind `declared` to the struct once it is built.
    pub fn declared(mut self, declared: &Declared) -> Self {
        self.declared = Some(declared.clone());
        self
    }

    pub fn build(self) -> SchemaResult<Schema> {
        let mut problems = self.problems;
        let name = self.name;
        if !is_identifier(&name) {
            problems.push(Hint::error(format!("struct name {name:?} is not an identifier")));
        }

        let (mut fields, tag_key, proxy, open) = match self.parent {
            Some(parent) => (
                parent.fields,
                self.tag_key.unwrap_or(parent.tag_key),
                self.proxy.or(parent.proxy),
                self.open.unwrap_or(parent.open),
            ),
            None => (
                Vec::new(),
                self.tag_key.unwrap_or_else(|| DEFAULT_TAG_KEY.to_string()),
                self.proxy,
                self.open.unwrap_or(false),
            ),
        };
        let tag = self.tag;

        let mut own = HashSet::new();
        for (field_name, schema) in self.fields {
            if !own.insert(field_name.clone()) {
                problems.push(Hint::error(format!("field `{field_name}` is defined twice")));
                continue;
            }
            match fields.iter_mut().find(|(n, _)| *n == field_name) {
                Some(slot) => slot.1 = schema,
                None => fields.push((field_name, schema)),
            }
        }

        if let Some(tag) = &tag {
            if !is_identifier(tag) {
                problems.push(Hint::error(format!("tag {tag:?} is not an identifier")));
            }
        }
        if !is_identifier(&tag_key) {
            problems.push(Hint::error(format!("tag key {tag_key:?} is not an identifier")));
        }
        for (field_name, _) in &fields {
            if !is_identifier(field_name) || field_name.starts_with('_') {
                problems.push(Hint::error(format!(
                    "field name {field_name:?} must be an identifier not starting with `_`"
                )));
            }
            if tag.is_some() && *field_name == tag_key {
                problems.push(Hint::error(format!(
                    "field `{field_name}` collides with the tag key"
                )));
            }
        }

        if let Some(proxy) = &proxy {
            match fields.iter().find(|(n, _)| n == proxy) {
                None => problems.push(Hint::error(format!(
                    "proxy field `{proxy}` is not a field"
                ))),
                Some((_, schema)) if !is_required(schema.default_val()) => {
                    problems.push(Hint::error(format!(
                        "proxy field `{proxy}` must not have a default"
                    )))
                }
                Some(_) => {}
            }
            for (field_name, schema) in &fields {
                if field_name != proxy && is_required(schema.default_val()) {
                    problems.push(Hint::error(format!(
                        "field `{field_name}` needs a default because `{proxy}` is the proxy"
                    )));
                }
            }
        }

        if !problems.is_empty() {
            return Err(SchemaError::Definition(
                Hint::error(format!("invalid struct `{name}`")).with_children(problems),
            ));
        }

        let def = StructDef {
            name,
            fields,
            tag,
            tag_key,
            proxy,
            open,
        };

        if let Some(d) = &self.declared {
            if d.is_defined() {
                return Err(SchemaError::declared(format!(
                    "declared schema `{}` is already defined",
                    d.tag()
                )));
            }
            if def.tag.as_deref() != Some(d.tag()) || def.tag_key != d.tag_key() {
                return Err(SchemaError::definition(format!(
                    "struct `{}` does not match declaration `{}` (tag key `{}`)",
                    def.name,
                    d.tag(),
                    d.tag_key()
                )));
            }
        }

        let derived = if is_derived(&self.common.default_val) {
            Some(derive_default(&def)?)
        } else {
            None
        };

        let schema = finish(SchemaKind::Struct(def), self.common, derived)?;
        if let Some(d) = &self.declared {
            d.bind(&schema)?;
        }
        Ok(schema)
    }
}

impl_common_options!(StructBuilder);

/// The default raw assembled from every field default.
fn derive_default(def: &StructDef) -> SchemaResult<Value> {
    let mut out = Map::new();
    let mut problems = Vec::new();
    if let Some(tag) = &def.tag {
        out.insert(def.tag_key.clone(), Value::String(tag.clone()));
    }
    for (name, field) in &def.fields {
        match (field.default_val(), field.default_value()) {
            (DefaultVal::Special(Special::Optional), _) => {}
            (_, Some(v)) => {
                out.insert(name.clone(), strip_tag(field, v.clone()));
            }
            _ => problems.push(Hint::error(format!("field `{name}` has no default"))),
        }
    }
    if problems.is_empty() {
        Ok(Value::Object(out))
    } else {
        Err(SchemaError::Definition(
            Hint::error(format!(
                "cannot derive a default for struct `{}`",
                def.name
            ))
            .with_children(problems),
        ))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
