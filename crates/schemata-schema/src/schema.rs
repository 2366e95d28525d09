//! # Schema Handles — Immutable Schema Nodes
//!
//! A [`Schema`] is a cheap, clonable handle to an immutable node built by
//! one of the builders in [`crate::prim`] or [`crate::structure`]. Nodes are
//! shared by reference: embedding a schema as a field or item never copies
//! it, and schema equality is identity.
//!
//! ## Design
//!
//! - Every node carries the same [`Common`] block (documentation, default
//!   policy, initial value, restriction, evaluated class) plus a
//!   [`SchemaKind`] with the kind-specific options.
//! - A declared node is a placeholder for a struct defined later. All
//!   accessors resolve through a bound declaration, so callers never see the
//!   placeholder once it is bound.
//! - Nodes are finalised by [`finish`], which runs every definition check.
//!   A `Schema` value therefore always satisfies the definition invariants.
//!
//! ## Recursion
//!
//! Recursive schemas go through a declaration, which holds an `Arc` to its
//! target. The resulting reference cycle is never freed. Schemas are
//! expected to live for the lifetime of the process.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use schemata_core::{DefaultVal, Hint, SchemaError, SchemaResult, Special};
use schemata_eval::EvaluatedClass;

use crate::declared::Declared;
use crate::structure::StructDef;

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

/// The kind of a schema, without its options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaFamily {
    Bool,
    Int,
    Float,
    Str,
    Pass,
    Seq,
    Map,
    Union,
    Struct,
    /// An unbound declaration.
    Declared,
}

impl SchemaFamily {
    /// Families that accept a `restricted` value set.
    pub fn is_restrictable(self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Float | Self::Str)
    }

    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::Bool | Self::Int | Self::Float | Self::Str | Self::Pass
        )
    }
}

impl fmt::Display for SchemaFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Pass => "pass",
            Self::Seq => "seq",
            Self::Map => "map",
            Self::Union => "union",
            Self::Struct => "struct",
            Self::Declared => "declared",
        };
        write!(f, "{s}")
    }
}

/// Case folding applied by a string schema before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharCase {
    Lower,
    Upper,
}

impl CharCase {
    pub(crate) fn apply(self, s: &str) -> String {
        match self {
            Self::Lower => s.to_lowercase(),
            Self::Upper => s.to_uppercase(),
        }
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub(crate) struct StrOptions {
    pub(crate) pattern: Option<Regex>,
    pub(crate) min_len: Option<usize>,
    pub(crate) max_len: Option<usize>,
    pub(crate) strip: bool,
    pub(crate) char_case: Option<CharCase>,
}

impl StrOptions {
    /// Whether any option conflicts with a `restricted` value set.
    pub(crate) fn constrains_content(&self) -> bool {
        self.pattern.is_some() || self.min_len.is_some() || self.max_len.is_some()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Container {
    pub(crate) item: Schema,
    pub(crate) min_len: Option<usize>,
    pub(crate) max_len: Option<usize>,
}

#[derive(Debug, Clone)]
pub(crate) enum SchemaKind {
    Bool,
    Int { min: Option<i64>, max: Option<i64> },
    Float { min: Option<f64>, max: Option<f64> },
    Str(StrOptions),
    Pass,
    Seq(Container),
    Map(Container),
    Union(Vec<Schema>),
    Struct(StructDef),
    Declared(Declared),
}

impl SchemaKind {
    pub(crate) fn family(&self) -> SchemaFamily {
        match self {
            Self::Bool => SchemaFamily::Bool,
            Self::Int { .. } => SchemaFamily::Int,
            Self::Float { .. } => SchemaFamily::Float,
            Self::Str(_) => SchemaFamily::Str,
            Self::Pass => SchemaFamily::Pass,
            Self::Seq(_) => SchemaFamily::Seq,
            Self::Map(_) => SchemaFamily::Map,
            Self::Union(_) => SchemaFamily::Union,
            Self::Struct(_) => SchemaFamily::Struct,
            Self::Declared(_) => SchemaFamily::Declared,
        }
    }
}

/// Options shared by every schema kind.
#[derive(Debug, Clone)]
pub(crate) struct Common {
    pub(crate) doc: String,
    pub(crate) default_val: DefaultVal,
    /// Effective default raw: the normalised concrete default, the
    /// expression source, or the computed derived default.
    pub(crate) default_value: Option<Value>,
    pub(crate) default_is_expr: bool,
    pub(crate) default_eval: Option<Value>,
    pub(crate) init_val: Value,
    pub(crate) restricted: Option<Vec<Value>>,
    pub(crate) evaluated: Option<EvaluatedClass>,
}

impl Common {
    pub(crate) fn bare() -> Self {
        Self {
            doc: String::new(),
            default_val: DefaultVal::REQUIRED,
            default_value: None,
            default_is_expr: false,
            default_eval: None,
            init_val: Value::Null,
            restricted: None,
            evaluated: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct SchemaNode {
    pub(crate) kind: SchemaKind,
    pub(crate) common: Common,
}

/// Immutable, shared schema handle.
#[derive(Clone)]
pub struct Schema(Arc<SchemaNode>);

impl Schema {
    pub(crate) fn from_parts(kind: SchemaKind, common: Common) -> Self {
        Self(Arc::new(SchemaNode { kind, common }))
    }

    /// The node this handle stands for, resolving a bound declaration.
    pub(crate) fn node(&self) -> &SchemaNode {
        match &self.0.kind {
            SchemaKind::Declared(d) => match d.target() {
                Some(target) => target.node(),
                None => &self.0,
            },
            _ => &self.0,
        }
    }

    pub(crate) fn kind(&self) -> &SchemaKind {
        &self.node().kind
    }

    pub(crate) fn common(&self) -> &Common {
        &self.node().common
    }

    /// A handle to the resolved node. Identical to `self` unless this is a
    /// bound declaration.
    pub fn resolved(&self) -> Schema {
        match &self.0.kind {
            SchemaKind::Declared(d) => match d.target() {
                Some(target) => target.resolved(),
                None => self.clone(),
            },
            _ => self.clone(),
        }
    }

    /// Whether two handles refer to the same resolved node.
    pub fn ptr_eq(a: &Schema, b: &Schema) -> bool {
        std::ptr::eq(a.node(), b.node())
    }

    pub fn family(&self) -> SchemaFamily {
        self.kind().family()
    }

    /// The declaration this handle was created from, bound or not.
    pub fn declared(&self) -> Option<&Declared> {
        match &self.0.kind {
            SchemaKind::Declared(d) => Some(d),
            _ => None,
        }
    }

    pub fn doc(&self) -> &str {
        &self.common().doc
    }

    pub fn default_val(&self) -> &DefaultVal {
        &self.common().default_val
    }

    /// The raw used when a datum is absent: the normalised concrete
    /// default, an expression source, or the computed derived default.
    pub fn default_value(&self) -> Option<&Value> {
        self.common().default_value.as_ref()
    }

    /// Whether the declared default is an expression of the evaluated class.
    pub fn default_is_expression(&self) -> bool {
        self.common().default_is_expr
    }

    pub fn default_eval(&self) -> Option<&Value> {
        self.common().default_eval.as_ref()
    }

    /// Initial raw value for editors and fresh documents.
    pub fn init_val(&self) -> &Value {
        &self.common().init_val
    }

    pub fn restricted(&self) -> Option<&[Value]> {
        self.common().restricted.as_deref()
    }

    pub fn evaluated(&self) -> Option<&EvaluatedClass> {
        self.common().evaluated.as_ref()
    }

    /// Whether `raw` is an expression source this schema would defer.
    pub fn is_expression(&self, raw: &Value) -> bool {
        self.evaluated()
            .is_some_and(|class| class.is_expression_value(raw))
    }

    /// Numeric lower bound.
    pub fn min(&self) -> Option<Value> {
        match self.kind() {
            SchemaKind::Int { min, .. } => min.map(Value::from),
            SchemaKind::Float { min, .. } => min.map(Value::from),
            _ => None,
        }
    }

    /// Numeric upper bound.
    pub fn max(&self) -> Option<Value> {
        match self.kind() {
            SchemaKind::Int { max, .. } => max.map(Value::from),
            SchemaKind::Float { max, .. } => max.map(Value::from),
            _ => None,
        }
    }

    /// Length lower bound of a string, sequence or mapping schema.
    pub fn min_len(&self) -> Option<usize> {
        match self.kind() {
            SchemaKind::Str(opts) => opts.min_len,
            SchemaKind::Seq(c) | SchemaKind::Map(c) => c.min_len,
            _ => None,
        }
    }

    /// Length upper bound of a string, sequence or mapping schema.
    pub fn max_len(&self) -> Option<usize> {
        match self.kind() {
            SchemaKind::Str(opts) => opts.max_len,
            SchemaKind::Seq(c) | SchemaKind::Map(c) => c.max_len,
            _ => None,
        }
    }

    pub fn pattern(&self) -> Option<&str> {
        match self.kind() {
            SchemaKind::Str(opts) => opts.pattern.as_ref().map(Regex::as_str),
            _ => None,
        }
    }

    /// Item schema of a sequence or mapping.
    pub fn item(&self) -> Option<&Schema> {
        match self.kind() {
            SchemaKind::Seq(c) | SchemaKind::Map(c) => Some(&c.item),
            _ => None,
        }
    }

    /// Union members in match order. Empty for any other kind.
    pub fn members(&self) -> &[Schema] {
        match self.kind() {
            SchemaKind::Union(members) => members,
            _ => &[],
        }
    }

    pub fn as_struct(&self) -> Option<&StructDef> {
        match self.kind() {
            SchemaKind::Struct(def) => Some(def),
            _ => None,
        }
    }

    /// Whether valueds decoded under `other` belong to this schema, either
    /// directly or as one of its union members.
    pub(crate) fn admits(&self, other: &Schema) -> bool {
        self == other || self.members().iter().any(|m| m.admits(other))
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl Eq for Schema {}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema({})", self.summary())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

// ---------------------------------------------------------------------------
// Finalisation
// ---------------------------------------------------------------------------

/// Options collected by a builder before the node is checked.
#[derive(Debug, Clone, Default)]
pub(crate) struct CommonSpec {
    pub(crate) doc: String,
    pub(crate) default_val: DefaultVal,
    pub(crate) default_eval: Option<Value>,
    pub(crate) init_val: Option<Value>,
    pub(crate) restricted: Option<Vec<Value>>,
    pub(crate) evaluated: Option<EvaluatedClass>,
}

fn definition(primary: impl Into<String>, child: SchemaError) -> SchemaError {
    SchemaError::Definition(Hint::error(primary).with_child(child.into_hint()))
}

/// Run the definition checks shared by every kind and build the node.
///
/// `derived` carries the computed default of a struct whose default policy
/// is `derived`; it is `None` for every other schema.
pub(crate) fn finish(
    kind: SchemaKind,
    spec: CommonSpec,
    derived: Option<Value>,
) -> SchemaResult<Schema> {
    let family = kind.family();
    check_kind(&kind)?;

    let restricted = match spec.restricted {
        None => None,
        Some(values) => {
            if !family.is_restrictable() {
                return Err(SchemaError::definition(format!(
                    "`restricted` is not supported by {family} schemas"
                )));
            }
            if values.is_empty() {
                return Err(SchemaError::definition("`restricted` must not be empty"));
            }
            if let SchemaKind::Str(opts) = &kind {
                if opts.constrains_content() {
                    return Err(SchemaError::definition(
                        "`restricted` cannot be combined with `pattern`, `min_len` or `max_len`",
                    ));
                }
            }
            let probe = Schema::from_parts(kind.clone(), Common::bare());
            let mut normalized = Vec::with_capacity(values.len());
            for (i, value) in values.iter().enumerate() {
                let value = probe.normalize(value).map_err(|e| {
                    definition(format!("restricted value {i} ({value}) is invalid"), e)
                })?;
                if !normalized.contains(&value) {
                    normalized.push(value);
                }
            }
            Some(normalized)
        }
    };

    let probe = Schema::from_parts(
        kind.clone(),
        Common {
            restricted: restricted.clone(),
            evaluated: spec.evaluated.clone(),
            ..Common::bare()
        },
    );
    let is_expr = |v: &Value| {
        spec.evaluated
            .as_ref()
            .is_some_and(|class| class.is_expression_value(v))
    };

    let (default_value, default_is_expr) = match &spec.default_val {
        DefaultVal::Special(Special::Required | Special::Optional) => (None, false),
        DefaultVal::Special(Special::Derived) => {
            let Some(derived) = derived else {
                return Err(SchemaError::definition(format!(
                    "`derived` default is only valid for struct schemas, not {family}"
                )));
            };
            let value = probe
                .normalize(&derived)
                .map_err(|e| definition("derived default is invalid", e))?;
            (Some(value), false)
        }
        DefaultVal::Value(Value::Null) => {
            return Err(SchemaError::definition(
                "default must not be null; use the `optional` default instead",
            ))
        }
        // Only an evaluated schema can hold an expression default; anywhere
        // else the marker string is decoded as data and must validate.
        DefaultVal::Value(v) if is_expr(v) => (Some(v.clone()), true),
        DefaultVal::Value(v) => {
            let value = probe
                .normalize(v)
                .map_err(|e| definition(format!("default value {v} is invalid"), e))?;
            (Some(value), false)
        }
    };

    let default_eval = match spec.default_eval {
        None => None,
        Some(v) => {
            if !default_is_expr {
                return Err(SchemaError::definition(
                    "`default_eval` requires an expression default",
                ));
            }
            if v.is_null() {
                return Err(SchemaError::definition("`default_eval` must not be null"));
            }
            if is_expr(&v) {
                return Err(SchemaError::definition(
                    "`default_eval` must be a concrete value, not an expression",
                ));
            }
            let value = probe
                .normalize(&v)
                .map_err(|e| definition(format!("`default_eval` value {v} is invalid"), e))?;
            Some(value)
        }
    };

    let init_val = match spec.init_val {
        Some(Value::Null) => {
            return Err(SchemaError::definition("`init_val` must not be null"));
        }
        Some(v) if is_expr(&v) => v,
        Some(v) => probe
            .normalize(&v)
            .map_err(|e| definition(format!("`init_val` {v} is invalid"), e))?,
        None => match (&default_value, &default_eval) {
            (Some(v), _) if !default_is_expr => v.clone(),
            (_, Some(v)) => v.clone(),
            _ => zero_init(&kind, restricted.as_deref()),
        },
    };

    Ok(Schema::from_parts(
        kind,
        Common {
            doc: spec.doc,
            default_val: spec.default_val,
            default_value,
            default_is_expr,
            default_eval,
            init_val,
            restricted,
            evaluated: spec.evaluated,
        },
    ))
}

fn check_kind(kind: &SchemaKind) -> SchemaResult<()> {
    let bounds = |min: bool, max: bool, ordered: bool, what: &str| {
        if min && max && !ordered {
            Err(SchemaError::definition(format!(
                "{what} lower bound exceeds its upper bound"
            )))
        } else {
            Ok(())
        }
    };
    match kind {
        SchemaKind::Int { min, max } => bounds(
            min.is_some(),
            max.is_some(),
            min.zip(*max).map_or(true, |(lo, hi)| lo <= hi),
            "int",
        ),
        SchemaKind::Float { min, max } => {
            if min.is_some_and(f64::is_nan) || max.is_some_and(f64::is_nan) {
                return Err(SchemaError::definition("float bounds must not be NaN"));
            }
            bounds(
                min.is_some(),
                max.is_some(),
                min.zip(*max).map_or(true, |(lo, hi)| lo <= hi),
                "float",
            )
        }
        SchemaKind::Str(opts) => bounds(
            opts.min_len.is_some(),
            opts.max_len.is_some(),
            opts.min_len.zip(opts.max_len).map_or(true, |(lo, hi)| lo <= hi),
            "str length",
        ),
        SchemaKind::Seq(c) | SchemaKind::Map(c) => bounds(
            c.min_len.is_some(),
            c.max_len.is_some(),
            c.min_len.zip(c.max_len).map_or(true, |(lo, hi)| lo <= hi),
            "container length",
        ),
        SchemaKind::Union(members) => crate::union::check_members(members),
        _ => Ok(()),
    }
}

/// Initial value when neither `init_val` nor a concrete default is given.
fn zero_init(kind: &SchemaKind, restricted: Option<&[Value]>) -> Value {
    if let Some(first) = restricted.and_then(|r| r.first()) {
        return first.clone();
    }
    match kind {
        SchemaKind::Bool => Value::Bool(false),
        SchemaKind::Int { min, max } => {
            let mut v = 0i64;
            if let Some(lo) = min {
                v = v.max(*lo);
            }
            if let Some(hi) = max {
                v = v.min(*hi);
            }
            Value::from(v)
        }
        SchemaKind::Float { min, max } => {
            let mut v = 0.0f64;
            if let Some(lo) = min {
                v = v.max(*lo);
            }
            if let Some(hi) = max {
                v = v.min(*hi);
            }
            Value::from(v)
        }
        SchemaKind::Str(_) => Value::String(String::new()),
        SchemaKind::Pass | SchemaKind::Declared(_) => Value::Null,
        SchemaKind::Seq(_) => Value::Array(Vec::new()),
        SchemaKind::Map(_) => Value::Object(Map::new()),
        SchemaKind::Union(members) => members
            .first()
            .map_or(Value::Null, |m| m.init_val().clone()),
        SchemaKind::Struct(def) => def.zero_init(),
    }
}
