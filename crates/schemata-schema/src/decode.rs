//! # Decoding — Raw Trees to Valueds
//!
//! Decoding validates a raw tree against a schema and produces a
//! [`Valued`] tree located at every node.
//!
//! ## Design
//!
//! - Null and a missing key are the same: the datum is absent. An absent
//!   datum takes the schema default, becomes an absent valued if the
//!   schema is optional, and is an error otherwise.
//! - A string carrying an expression marker of the schema's evaluated class
//!   is deferred, not validated. Markers are ignored when decoding an
//!   evaluation result.
//! - Containers and structs decode every child before failing, so one
//!   error describes every violation in the subtree. The hint has one
//!   child per failing location.
//! - A declaration error aborts decoding immediately; it means the schema
//!   itself is incomplete.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use schemata_core::{type_name, Hint, Loc, SchemaError, SchemaResult, Special};

use crate::declared::Declared;
use crate::evaluated::Evaluated;
use crate::schema::{Common, Container, Schema, SchemaKind, StrOptions};
use crate::structure::StructDef;
use crate::valued::{Entries, StructVal, Val, Valued};

/// Decoding switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Defer strings that carry an expression marker. Disabled when
    /// decoding evaluation results.
    pub evaluate_markers: bool,
}

impl DecodeOptions {
    /// Options for decoding a value produced by an evaluator.
    pub fn resolved() -> Self {
        Self {
            evaluate_markers: false,
        }
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            evaluate_markers: true,
        }
    }
}

impl Schema {
    /// Decode `raw` at the root location.
    ///
    /// # Errors
    ///
    /// `SchemaError::Validation` if `raw` is rejected, with a hint tree
    /// localising every violation. `SchemaError::Declared` if decoding
    /// reaches an unbound declaration.
    pub fn decode(&self, raw: &Value) -> SchemaResult<Valued> {
        self.decode_with(Some(raw), &Loc::root(), &DecodeOptions::default())
    }

    /// Decode `raw` found at `loc`.
    pub fn decode_at(&self, raw: &Value, loc: &Loc) -> SchemaResult<Valued> {
        self.decode_with(Some(raw), loc, &DecodeOptions::default())
    }

    /// Decode a datum that may be absent.
    pub fn decode_opt(&self, raw: Option<&Value>) -> SchemaResult<Valued> {
        self.decode_with(raw, &Loc::root(), &DecodeOptions::default())
    }

    pub fn decode_with(
        &self,
        raw: Option<&Value>,
        loc: &Loc,
        opts: &DecodeOptions,
    ) -> SchemaResult<Valued> {
        decode_node(self, raw, loc, opts)
    }

    /// Re-bind a valued to this schema. A valued already decoded under this
    /// schema (or one of its union members) is returned as is; anything
    /// else is decoded from its source.
    pub fn decode_valued(&self, valued: &Valued) -> SchemaResult<Valued> {
        if self.admits(valued.schema()) {
            Ok(valued.clone())
        } else {
            self.decode_with(Some(&valued.src()), valued.loc(), &DecodeOptions::default())
        }
    }
}

fn decode_node(
    schema: &Schema,
    raw: Option<&Value>,
    loc: &Loc,
    opts: &DecodeOptions,
) -> SchemaResult<Valued> {
    if let SchemaKind::Declared(d) = schema.kind() {
        return Err(unbound(d, loc));
    }
    let schema = schema.resolved();
    let raw = match raw {
        Some(v) if !v.is_null() => v,
        _ => return decode_absent(&schema, loc, opts),
    };

    if opts.evaluate_markers {
        if let (Some(class), Value::String(s)) = (schema.evaluated(), raw) {
            if class.is_expression(s) {
                let deferred = Evaluated::at(&schema, s.as_str(), loc);
                return Ok(Valued::deferred(schema.clone(), loc.clone(), deferred));
            }
        }
    }

    let common = schema.common();
    let val = match schema.kind() {
        SchemaKind::Bool => match raw {
            Value::Bool(b) => {
                check_restricted(common, raw, loc)?;
                Val::Bool(*b)
            }
            _ => return Err(type_error("bool", raw, loc)),
        },
        SchemaKind::Int { min, max } => {
            let i = decode_int(raw, loc)?;
            check_restricted(common, &Value::from(i), loc)?;
            check_bounds(i, *min, *max, loc)?;
            Val::Int(i)
        }
        SchemaKind::Float { min, max } => {
            let f = match raw {
                Value::Number(n) => n.as_f64().ok_or_else(|| type_error("float", raw, loc))?,
                _ => return Err(type_error("float", raw, loc)),
            };
            check_restricted(common, &Value::from(f), loc)?;
            check_bounds(f, *min, *max, loc)?;
            Val::Float(f)
        }
        SchemaKind::Str(str_opts) => Val::Str(decode_str(str_opts, common, raw, loc)?),
        SchemaKind::Pass => Val::Pass(raw.clone()),
        SchemaKind::Seq(c) => Val::Seq(decode_seq(c, raw, loc, opts)?),
        SchemaKind::Map(c) => Val::Map(decode_map(c, raw, loc, opts)?),
        SchemaKind::Union(members) => return decode_union(members, raw, loc, opts),
        SchemaKind::Struct(def) => Val::Struct(decode_struct(def, raw, loc, opts)?),
        SchemaKind::Declared(d) => return Err(unbound(d, loc)),
    };
    Ok(Valued::resolved(schema.clone(), loc.clone(), val))
}

fn unbound(d: &Declared, loc: &Loc) -> SchemaError {
    SchemaError::Declared(
        Hint::error(format!("declared schema `{}` was never defined", d.tag())).with_loc(loc),
    )
}

fn decode_absent(schema: &Schema, loc: &Loc, opts: &DecodeOptions) -> SchemaResult<Valued> {
    // An evaluation result is never deferred again, so an absent one takes
    // the concrete stand-in of an expression default.
    if schema.default_is_expression() && !opts.evaluate_markers {
        return match schema.default_eval() {
            Some(stand_in) => decode_node(schema, Some(stand_in), loc, opts),
            None => Err(SchemaError::validation(
                "value is missing and the expression default has no `default_eval`",
                loc,
            )),
        };
    }
    if let Some(default) = schema.default_value() {
        // Defaults belong to the schema, so their markers always count.
        return decode_node(schema, Some(default), loc, &DecodeOptions::default());
    }
    match schema.default_val().special() {
        Some(Special::Optional) => Ok(Valued::absent(schema.clone(), loc.clone())),
        _ => Err(SchemaError::validation("required value is missing", loc)),
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

fn type_error(expected: &str, raw: &Value, loc: &Loc) -> SchemaError {
    SchemaError::Validation(
        Hint::error(format!("expected {expected}, found {}", type_name(raw)))
            .with_loc(loc)
            .with_data(raw.to_string()),
    )
}

fn decode_int(raw: &Value, loc: &Loc) -> SchemaResult<i64> {
    match raw {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None if n.is_u64() => Err(SchemaError::Validation(
                Hint::error("integer does not fit in 64 bits")
                    .with_loc(loc)
                    .with_data(n.to_string()),
            )),
            None => Err(type_error("int", raw, loc)),
        },
        _ => Err(type_error("int", raw, loc)),
    }
}

fn check_bounds<T>(v: T, min: Option<T>, max: Option<T>, loc: &Loc) -> SchemaResult<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if let Some(lo) = min {
        if v < lo {
            return Err(SchemaError::validation(
                format!("{v} is less than the minimum {lo}"),
                loc,
            ));
        }
    }
    if let Some(hi) = max {
        if v > hi {
            return Err(SchemaError::validation(
                format!("{v} is greater than the maximum {hi}"),
                loc,
            ));
        }
    }
    Ok(())
}

/// Equality of normalised scalars; integers and floats compare by value.
pub(crate) fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i == j,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

fn check_restricted(common: &Common, value: &Value, loc: &Loc) -> SchemaResult<()> {
    let Some(allowed) = &common.restricted else {
        return Ok(());
    };
    if allowed.iter().any(|a| scalar_eq(a, value)) {
        return Ok(());
    }
    let listed: Vec<String> = allowed.iter().map(Value::to_string).collect();
    Err(SchemaError::Validation(
        Hint::error(format!("{value} is not one of the allowed values"))
            .with_loc(loc)
            .with_data(listed.join(", ")),
    ))
}

fn decode_str(opts: &StrOptions, common: &Common, raw: &Value, loc: &Loc) -> SchemaResult<String> {
    let Value::String(s) = raw else {
        return Err(type_error("str", raw, loc));
    };
    let mut s = if opts.strip { s.trim().to_string() } else { s.clone() };
    if let Some(case) = opts.char_case {
        s = case.apply(&s);
    }
    check_restricted(common, &Value::String(s.clone()), loc)?;

    let len = s.chars().count();
    if let Some(min) = opts.min_len {
        if len < min {
            return Err(SchemaError::validation(
                format!("string has {len} character(s), expected at least {min}"),
                loc,
            ));
        }
    }
    if let Some(max) = opts.max_len {
        if len > max {
            return Err(SchemaError::validation(
                format!("string has {len} character(s), expected at most {max}"),
                loc,
            ));
        }
    }
    if let Some(pattern) = &opts.pattern {
        if !pattern.is_match(&s) {
            return Err(SchemaError::Validation(
                Hint::error("string does not match the required pattern")
                    .with_loc(loc)
                    .with_data(pattern.as_str().to_string()),
            ));
        }
    }
    Ok(s)
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

/// Sort a child result into the decoded values or the collected hints.
/// Anything other than a validation failure aborts the container.
fn gather<T>(result: SchemaResult<T>, hints: &mut Vec<Hint>) -> SchemaResult<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(SchemaError::Validation(hint)) => {
            hints.push(hint);
            Ok(None)
        }
        Err(other) => Err(other),
    }
}

fn length_hint(c: &Container, len: usize, what: &str, loc: &Loc) -> Option<Hint> {
    if let Some(min) = c.min_len {
        if len < min {
            return Some(
                Hint::error(format!("{what} has {len} item(s), expected at least {min}"))
                    .with_loc(loc),
            );
        }
    }
    if let Some(max) = c.max_len {
        if len > max {
            return Some(
                Hint::error(format!("{what} has {len} item(s), expected at most {max}"))
                    .with_loc(loc),
            );
        }
    }
    None
}

fn container_error(what: &str, loc: &Loc, hints: Vec<Hint>) -> SchemaError {
    SchemaError::Validation(Hint::error(format!("invalid {what}")).with_loc(loc).with_children(hints))
}

fn decode_seq(
    c: &Container,
    raw: &Value,
    loc: &Loc,
    opts: &DecodeOptions,
) -> SchemaResult<Vec<Valued>> {
    let Value::Array(items) = raw else {
        return Err(type_error("seq", raw, loc));
    };
    let mut hints = Vec::new();
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let result = decode_node(&c.item, Some(item), &loc.index(i), opts);
        if let Some(v) = gather(result, &mut hints)? {
            out.push(v);
        }
    }
    hints.extend(length_hint(c, items.len(), "sequence", loc));
    if hints.is_empty() {
        Ok(out)
    } else {
        Err(container_error("sequence", loc, hints))
    }
}

fn decode_map(
    c: &Container,
    raw: &Value,
    loc: &Loc,
    opts: &DecodeOptions,
) -> SchemaResult<Entries> {
    let Value::Object(entries) = raw else {
        return Err(type_error("map", raw, loc));
    };
    let mut hints = Vec::new();
    let mut out = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let result = decode_node(&c.item, Some(v), &loc.key(k), opts);
        if let Some(v) = gather(result, &mut hints)? {
            out.push((k.clone(), v));
        }
    }
    hints.extend(length_hint(c, entries.len(), "mapping", loc));
    if hints.is_empty() {
        Ok(Entries::from_vec(out))
    } else {
        Err(container_error("mapping", loc, hints))
    }
}

fn decode_union(
    members: &[Schema],
    raw: &Value,
    loc: &Loc,
    opts: &DecodeOptions,
) -> SchemaResult<Valued> {
    let mut attempts = Vec::with_capacity(members.len());
    for (i, member) in members.iter().enumerate() {
        match decode_node(member, Some(raw), loc, opts) {
            Ok(v) => return Ok(v),
            Err(SchemaError::Validation(hint)) => {
                tracing::trace!(loc = %loc, member = i, "union member rejected value");
                attempts.push(
                    Hint::error(format!("not a valid {}", member.summary()))
                        .with_loc(loc)
                        .with_child(hint),
                );
            }
            Err(other) => return Err(other),
        }
    }
    Err(SchemaError::Validation(
        Hint::error(format!(
            "value matches none of the {} union member(s)",
            members.len()
        ))
        .with_loc(loc)
        .with_data(raw.to_string())
        .with_children(attempts),
    ))
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

fn decode_struct(
    def: &StructDef,
    raw: &Value,
    loc: &Loc,
    opts: &DecodeOptions,
) -> SchemaResult<StructVal> {
    let proxied;
    let map: &Map<String, Value> = match raw {
        Value::Object(m) => m,
        other => match &def.proxy {
            Some(field) => {
                let mut m = Map::new();
                m.insert(field.clone(), other.clone());
                proxied = m;
                &proxied
            }
            None => return Err(type_error(&format!("`{}` mapping", def.name), raw, loc)),
        },
    };

    if let Some(tag) = &def.tag {
        if let Some(found) = map.get(&def.tag_key) {
            if found.as_str() != Some(tag.as_str()) {
                return Err(SchemaError::Validation(
                    Hint::error(format!("expected tag `{tag}`"))
                        .with_loc(&loc.key(&def.tag_key))
                        .with_data(found.to_string()),
                ));
            }
        }
    }

    let mut hints = Vec::new();
    let mut fields = Vec::with_capacity(def.fields.len());
    for (name, field) in &def.fields {
        let floc = loc.key(name);
        let fraw = map.get(name).filter(|v| !v.is_null());
        if fraw.is_none()
            && field.default_value().is_none()
            && field.default_val().special() != Some(Special::Optional)
            && field.declared().map_or(true, |d| d.is_defined())
        {
            hints.push(Hint::error(format!("missing required field `{name}`")).with_loc(&floc));
            continue;
        }
        if let Some(v) = gather(decode_node(field, fraw, &floc, opts), &mut hints)? {
            fields.push((name.clone(), v));
        }
    }

    let mut extra = Map::new();
    for (k, v) in map {
        if def.field(k).is_some() || (def.tag.is_some() && *k == def.tag_key) {
            continue;
        }
        if def.open {
            extra.insert(k.clone(), v.clone());
        } else {
            hints.push(
                Hint::error(format!("unexpected key `{k}`"))
                    .with_loc(&loc.key(k))
                    .with_data(v.to_string()),
            );
        }
    }

    if !hints.is_empty() {
        return Err(container_error(&format!("`{}` struct", def.name), loc, hints));
    }
    Ok(StructVal {
        fields: Entries::from_vec(fields),
        extra,
    })
}
