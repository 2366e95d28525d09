//! # Valued Trees
//!
//! A [`Valued`] is the result of decoding a raw tree under a schema: the
//! schema that accepted it, the location it was decoded from, and one of
//! three states.
//!
//! | State | Meaning |
//! |-------|---------|
//! | absent | optional datum not supplied |
//! | deferred | an expression awaiting [`Valued::evaluate`] |
//! | resolved | a typed [`Val`], whose children are themselves valueds |
//!
//! ## Equality
//!
//! Two valueds are equal when their schemas are identical and their states
//! are equal. Deferred values compare by source text, and mapping entries
//! compare without regard to order. Comparing a valued with a raw
//! [`Value`] is semantic: a float equals any number with the same value,
//! and a struct ignores its own tag entry and unset fields.

use serde_json::{Map, Value};

use schemata_core::{Hint, Loc, SchemaError, SchemaResult};
use schemata_eval::Context;

use crate::evaluated::Evaluated;
use crate::schema::Schema;

/// Shape of a resolved valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValuedType {
    Bool,
    Int,
    Float,
    Str,
    Pass,
    Seq,
    Map,
    Struct,
}

/// Resolved content of a valued.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Raw tree accepted by a pass schema.
    Pass(Value),
    Seq(Vec<Valued>),
    Map(Entries),
    Struct(StructVal),
}

impl Val {
    pub fn valued_type(&self) -> ValuedType {
        match self {
            Self::Bool(_) => ValuedType::Bool,
            Self::Int(_) => ValuedType::Int,
            Self::Float(_) => ValuedType::Float,
            Self::Str(_) => ValuedType::Str,
            Self::Pass(_) => ValuedType::Pass,
            Self::Seq(_) => ValuedType::Seq,
            Self::Map(_) => ValuedType::Map,
            Self::Struct(_) => ValuedType::Struct,
        }
    }
}

/// Insertion-ordered string-keyed entries.
#[derive(Debug, Clone, Default)]
pub struct Entries(Vec<(String, Valued)>);

impl Entries {
    pub(crate) fn from_vec(entries: Vec<(String, Valued)>) -> Self {
        Self(entries)
    }

    pub fn get(&self, key: &str) -> Option<&Valued> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Valued)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Valued> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Entries {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

/// Field values of a decoded struct, plus unknown keys kept by an open
/// struct.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructVal {
    pub(crate) fields: Entries,
    pub(crate) extra: Map<String, Value>,
}

impl StructVal {
    /// Every declared field, absent ones included.
    pub fn fields(&self) -> &Entries {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Valued> {
        self.fields.get(name)
    }

    /// Whether the field holds a value rather than being absent.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_absent())
    }

    /// Unknown keys retained by an open struct.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

#[derive(Debug, Clone)]
pub(crate) enum State {
    Absent,
    Deferred(Evaluated),
    Resolved(Val),
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Absent, Self::Absent) => true,
            (Self::Deferred(a), Self::Deferred(b)) => a.src() == b.src(),
            (Self::Resolved(a), Self::Resolved(b)) => a == b,
            _ => false,
        }
    }
}

/// A decoded datum bound to the schema that accepted it.
#[derive(Debug, Clone)]
pub struct Valued {
    schema: Schema,
    loc: Loc,
    state: State,
}

impl Valued {
    /// Decode `raw` under `schema`. Same as [`Schema::decode`].
    pub fn new(schema: &Schema, raw: &Value) -> SchemaResult<Self> {
        schema.decode(raw)
    }

    pub(crate) fn absent(schema: Schema, loc: Loc) -> Self {
        Self {
            schema,
            loc,
            state: State::Absent,
        }
    }

    pub(crate) fn deferred(schema: Schema, loc: Loc, evaluated: Evaluated) -> Self {
        Self {
            schema,
            loc,
            state: State::Deferred(evaluated),
        }
    }

    pub(crate) fn resolved(schema: Schema, loc: Loc, val: Val) -> Self {
        Self {
            schema,
            loc,
            state: State::Resolved(val),
        }
    }

    pub(crate) fn state(&self) -> &State {
        &self.state
    }

    /// The schema that accepted this datum. For a union member this is the
    /// member, not the union.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn loc(&self) -> &Loc {
        &self.loc
    }

    pub fn val(&self) -> Option<&Val> {
        match &self.state {
            State::Resolved(v) => Some(v),
            _ => None,
        }
    }

    /// The pending expression, if this datum is deferred.
    pub fn evaluated(&self) -> Option<&Evaluated> {
        match &self.state {
            State::Deferred(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self.state, State::Absent)
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.state, State::Deferred(_))
    }

    /// Whether this datum and every descendant is free of expressions.
    pub fn is_resolved(&self) -> bool {
        match &self.state {
            State::Absent => true,
            State::Deferred(_) => false,
            State::Resolved(val) => match val {
                Val::Seq(items) => items.iter().all(Valued::is_resolved),
                Val::Map(entries) => entries.values().all(Valued::is_resolved),
                Val::Struct(sv) => sv.fields.values().all(Valued::is_resolved),
                _ => true,
            },
        }
    }

    pub fn valued_type(&self) -> Option<ValuedType> {
        self.val().map(Val::valued_type)
    }

    /// Raw form of this datum: the expression source when deferred, null
    /// when absent, otherwise the canonical encoding. A resolved datum does
    /// not keep the raw it was decoded from, so `strip`, `char_case`, a
    /// proxy short form or a filled default show up in their normalised
    /// form here. `src()` of a resolved datum decodes to an equal datum.
    pub fn src(&self) -> Value {
        match &self.state {
            State::Absent => Value::Null,
            State::Deferred(e) => Value::String(e.src().to_string()),
            State::Resolved(_) => self.encode(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.val()? {
            Val::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.val()? {
            Val::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.val()? {
            Val::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.val()? {
            Val::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Valued]> {
        match self.val()? {
            Val::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Entries> {
        match self.val()? {
            Val::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructVal> {
        match self.val()? {
            Val::Struct(sv) => Some(sv),
            _ => None,
        }
    }

    /// Mapping entry or struct field by key.
    pub fn get(&self, key: &str) -> Option<&Valued> {
        match self.val()? {
            Val::Map(entries) => entries.get(key),
            Val::Struct(sv) => sv.get(key),
            _ => None,
        }
    }

    /// Sequence item by position.
    pub fn index(&self, i: usize) -> Option<&Valued> {
        self.as_seq()?.get(i)
    }

    /// Resolve every deferred value in this tree against `context`.
    ///
    /// Each result is decoded under the schema that deferred it, so a
    /// resolved tree satisfies every restriction and bound.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Evaluation` whose hint has one child per
    /// failing expression. A declaration error propagates immediately.
    pub fn evaluate(&self, context: &Context) -> SchemaResult<Valued> {
        let val = match &self.state {
            State::Absent => return Ok(self.clone()),
            State::Deferred(e) => return e.evaluate(context),
            State::Resolved(val) => val,
        };
        let mut failures = Vec::new();
        let val = match val {
            Val::Seq(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(v) = collect(item.evaluate(context), &mut failures)? {
                        out.push(v);
                    }
                }
                Val::Seq(out)
            }
            Val::Map(entries) => Val::Map(evaluate_entries(entries, context, &mut failures)?),
            Val::Struct(sv) => Val::Struct(StructVal {
                fields: evaluate_entries(&sv.fields, context, &mut failures)?,
                extra: sv.extra.clone(),
            }),
            _ => return Ok(self.clone()),
        };
        if !failures.is_empty() {
            return Err(SchemaError::Evaluation(
                Hint::error(format!(
                    "{} deferred value(s) failed to evaluate",
                    failures.len()
                ))
                .with_loc(&self.loc)
                .with_children(failures),
            ));
        }
        Ok(Self::resolved(self.schema.clone(), self.loc.clone(), val))
    }
}

fn collect(
    result: SchemaResult<Valued>,
    failures: &mut Vec<Hint>,
) -> SchemaResult<Option<Valued>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(SchemaError::Evaluation(hint)) => {
            failures.push(hint);
            Ok(None)
        }
        Err(other) => Err(other),
    }
}

fn evaluate_entries(
    entries: &Entries,
    context: &Context,
    failures: &mut Vec<Hint>,
) -> SchemaResult<Entries> {
    let mut out = Vec::with_capacity(entries.len());
    for (k, v) in entries.iter() {
        if let Some(v) = collect(v.evaluate(context), failures)? {
            out.push((k.to_string(), v));
        }
    }
    Ok(Entries(out))
}

impl PartialEq for Valued {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.state == other.state
    }
}

impl PartialEq<Value> for Valued {
    fn eq(&self, raw: &Value) -> bool {
        match &self.state {
            State::Absent => raw.is_null(),
            State::Deferred(e) => raw.as_str() == Some(e.src()),
            State::Resolved(val) => val_matches(&self.schema, val, raw),
        }
    }
}

fn val_matches(schema: &Schema, val: &Val, raw: &Value) -> bool {
    match (val, raw) {
        (Val::Bool(b), Value::Bool(r)) => b == r,
        (Val::Int(i), Value::Number(n)) => n.as_i64() == Some(*i),
        (Val::Float(f), Value::Number(n)) => n.as_f64() == Some(*f),
        (Val::Str(s), Value::String(r)) => s == r,
        (Val::Pass(v), r) => v == r,
        (Val::Seq(items), Value::Array(raws)) => {
            items.len() == raws.len() && items.iter().zip(raws).all(|(v, r)| v == r)
        }
        (Val::Map(entries), Value::Object(raws)) => {
            entries.len() == raws.len()
                && raws
                    .iter()
                    .all(|(k, r)| entries.get(k).is_some_and(|v| v == r))
        }
        (Val::Struct(sv), Value::Object(raws)) => {
            let def = schema.as_struct();
            let keys_match = raws.iter().all(|(k, r)| {
                if def.is_some_and(|d| d.is_tag_entry(k, r)) {
                    return true;
                }
                match sv.fields.get(k) {
                    Some(v) => v == r,
                    None => sv.extra.get(k) == Some(r),
                }
            });
            let set_fields_present = sv
                .fields
                .iter()
                .all(|(k, v)| v.is_absent() || raws.contains_key(k));
            let extras_present = sv.extra.keys().all(|k| raws.contains_key(k));
            keys_match && set_fields_present && extras_present
        }
        _ => false,
    }
}
