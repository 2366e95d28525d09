//! # Primitive and Container Builders
//!
//! One builder per schema kind. Each collects options and finishes with
//! `build()`, which runs the definition checks and returns an immutable
//! [`Schema`].
//!
//! ```
//! use schemata_schema::prim::IntPrim;
//!
//! let level = IntPrim::new()
//!     .restricted([1, 2, 3, 4])
//!     .default_val(3)
//!     .doc("Verbosity level")
//!     .build()
//!     .unwrap();
//! assert_eq!(level.init_val(), &serde_json::json!(3));
//! ```

use regex::Regex;
use serde_json::Value;

use schemata_core::{DefaultVal, Hint, SchemaError, SchemaResult, Special};
use schemata_eval::EvaluatedClass;

use crate::schema::{finish, CharCase, CommonSpec, Container, Schema, SchemaKind, StrOptions};

/// Builder methods for the options shared by every schema kind.
macro_rules! impl_common_options {
    ($builder:ty) => {
        impl $builder {
            /// Free-form documentation rendered by `Schema::render_doc`.
            pub fn doc(mut self, doc: impl Into<String>) -> Self {
                self.common.doc = doc.into();
                self
            }

            /// Value used when the datum is absent, or a default-policy
            /// sentinel. Defaults to `required`.
            pub fn default_val(mut self, default: impl Into<DefaultVal>) -> Self {
                self.common.default_val = default.into();
                self
            }

            /// Shorthand for `default_val(Special::Optional)`.
            pub fn optional(self) -> Self {
                self.default_val(Special::Optional)
            }

            /// Concrete stand-in for an expression default, used where the
            /// expression cannot be evaluated.
            pub fn default_eval(mut self, value: impl Into<Value>) -> Self {
                self.common.default_eval = Some(value.into());
                self
            }

            /// Initial value for fresh documents.
            pub fn init_val(mut self, value: impl Into<Value>) -> Self {
                self.common.init_val = Some(value.into());
                self
            }

            /// Treat strings carrying one of `class`'s markers as deferred
            /// expressions.
            pub fn evaluated(mut self, class: EvaluatedClass) -> Self {
                self.common.evaluated = Some(class);
                self
            }
        }
    };
}

pub(crate) use impl_common_options;

/// Builder method for the closed value set of scalar kinds.
macro_rules! impl_restricted {
    ($builder:ty) => {
        impl $builder {
            /// Accept only the listed values.
            pub fn restricted<I, V>(mut self, values: I) -> Self
            where
                I: IntoIterator<Item = V>,
                V: Into<Value>,
            {
                self.common.restricted = Some(values.into_iter().map(Into::into).collect());
                self
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// Builder for a boolean schema. Integers are not booleans.
#[derive(Debug, Clone, Default)]
pub struct BoolPrim {
    common: CommonSpec,
}

impl BoolPrim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> SchemaResult<Schema> {
        finish(SchemaKind::Bool, self.common, None)
    }
}

/// Builder for a 64-bit signed integer schema. Booleans and non-integral
/// numbers are rejected.
#[derive(Debug, Clone, Default)]
pub struct IntPrim {
    min: Option<i64>,
    max: Option<i64>,
    common: CommonSpec,
}

impl IntPrim {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive lower bound.
    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    /// Inclusive upper bound.
    pub fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn build(self) -> SchemaResult<Schema> {
        finish(
            SchemaKind::Int {
                min: self.min,
                max: self.max,
            },
            self.common,
            None,
        )
    }
}

/// Builder for a float schema. Any number other than a boolean is
/// accepted and stored as `f64`.
#[derive(Debug, Clone, Default)]
pub struct FloatPrim {
    min: Option<f64>,
    max: Option<f64>,
    common: CommonSpec,
}

impl FloatPrim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn build(self) -> SchemaResult<Schema> {
        finish(
            SchemaKind::Float {
                min: self.min,
                max: self.max,
            },
            self.common,
            None,
        )
    }
}

/// Builder for a string schema.
///
/// `strip` and `char_case` normalise the input before any check, so the
/// decoded and re-encoded value is the normalised text.
#[derive(Debug, Clone, Default)]
pub struct StrPrim {
    pattern: Option<String>,
    min_len: Option<usize>,
    max_len: Option<usize>,
    strip: bool,
    char_case: Option<CharCase>,
    common: CommonSpec,
}

impl StrPrim {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regular expression the whole string must match.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Minimum length in characters.
    pub fn min_len(mut self, n: usize) -> Self {
        self.min_len = Some(n);
        self
    }

    /// Maximum length in characters.
    pub fn max_len(mut self, n: usize) -> Self {
        self.max_len = Some(n);
        self
    }

    /// Trim surrounding whitespace before validation.
    pub fn strip(mut self, strip: bool) -> Self {
        self.strip = strip;
        self
    }

    pub fn char_case(mut self, case: CharCase) -> Self {
        self.char_case = Some(case);
        self
    }

    pub fn build(self) -> SchemaResult<Schema> {
        let pattern = match &self.pattern {
            None => None,
            // Anchored so the pattern has to cover the whole string.
            Some(p) => Some(Regex::new(&format!("^(?:{p})$")).map_err(|e| {
                SchemaError::Definition(
                    Hint::error(format!("invalid pattern {p:?}")).with_data(e.to_string()),
                )
            })?),
        };
        let opts = StrOptions {
            pattern,
            min_len: self.min_len,
            max_len: self.max_len,
            strip: self.strip,
            char_case: self.char_case,
        };
        finish(SchemaKind::Str(opts), self.common, None)
    }
}

/// Builder for a schema that accepts any raw tree unchanged.
#[derive(Debug, Clone, Default)]
pub struct PassPrim {
    common: CommonSpec,
}

impl PassPrim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> SchemaResult<Schema> {
        finish(SchemaKind::Pass, self.common, None)
    }
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

/// Builder for a homogeneous sequence schema.
#[derive(Debug, Clone)]
pub struct SeqPrim {
    item: Schema,
    min_len: Option<usize>,
    max_len: Option<usize>,
    common: CommonSpec,
}

impl SeqPrim {
    pub fn new(item: Schema) -> Self {
        Self {
            item,
            min_len: None,
            max_len: None,
            common: CommonSpec::default(),
        }
    }

    pub fn min_len(mut self, n: usize) -> Self {
        self.min_len = Some(n);
        self
    }

    pub fn max_len(mut self, n: usize) -> Self {
        self.max_len = Some(n);
        self
    }

    pub fn build(self) -> SchemaResult<Schema> {
        let container = Container {
            item: self.item,
            min_len: self.min_len,
            max_len: self.max_len,
        };
        finish(SchemaKind::Seq(container), self.common, None)
    }
}

/// Builder for a string-keyed mapping schema with homogeneous values.
#[derive(Debug, Clone)]
pub struct MapPrim {
    item: Schema,
    min_len: Option<usize>,
    max_len: Option<usize>,
    common: CommonSpec,
}

impl MapPrim {
    pub fn new(item: Schema) -> Self {
        Self {
            item,
            min_len: None,
            max_len: None,
            common: CommonSpec::default(),
        }
    }

    pub fn min_len(mut self, n: usize) -> Self {
        self.min_len = Some(n);
        self
    }

    pub fn max_len(mut self, n: usize) -> Self {
        self.max_len = Some(n);
        self
    }

    pub fn build(self) -> SchemaResult<Schema> {
        let container = Container {
            item: self.item,
            min_len: self.min_len,
            max_len: self.max_len,
        };
        finish(SchemaKind::Map(container), self.common, None)
    }
}

// ---------------------------------------------------------------------------
// Unions
// ---------------------------------------------------------------------------

/// Builder for an ordered union. The first member that accepts a raw
/// value wins. Nested unions are flattened into their members, and must
/// not carry a default, an evaluated class or a doc of their own.
#[derive(Debug, Clone, Default)]
pub struct UnionPrim {
    members: Vec<Schema>,
    common: CommonSpec,
}

impl UnionPrim {
    pub fn new(members: impl IntoIterator<Item = Schema>) -> Self {
        Self {
            members: members.into_iter().collect(),
            common: CommonSpec::default(),
        }
    }

    /// Append one member.
    pub fn member(mut self, schema: Schema) -> Self {
        self.members.push(schema);
        self
    }

    pub fn build(self) -> SchemaResult<Schema> {
        let mut members = Vec::with_capacity(self.members.len());
        for (i, m) in self.members.into_iter().enumerate() {
            match m.members() {
                [] => members.push(m),
                // Flattening keeps only the members, so the nested union
                // must not carry options of its own.
                nested => {
                    if !schemata_core::is_required(m.default_val())
                        || m.evaluated().is_some()
                        || !m.doc().is_empty()
                    {
                        return Err(SchemaError::definition(format!(
                            "nested union member {i} carries options that flattening would drop"
                        )));
                    }
                    members.extend(nested.iter().cloned());
                }
            }
        }
        finish(SchemaKind::Union(members), self.common, None)
    }
}

impl_common_options!(BoolPrim);
impl_common_options!(IntPrim);
impl_common_options!(FloatPrim);
impl_common_options!(StrPrim);
impl_common_options!(PassPrim);
impl_common_options!(SeqPrim);
impl_common_options!(MapPrim);
impl_common_options!(UnionPrim);

impl_restricted!(BoolPrim);
impl_restricted!(IntPrim);
impl_restricted!(FloatPrim);
impl_restricted!(StrPrim);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn int_default_must_satisfy_restriction() {
        let err = IntPrim::new()
            .restricted([1, 2, 3, 4])
            .default_val(5)
            .build()
            .unwrap_err();
        assert!(err.is_definition());
    }

    #[test]
    fn int_default_must_satisfy_bounds() {
        assert!(IntPrim::new().min(0).default_val(-1).build().is_err());
        assert!(IntPrim::new().min(0).default_val(0).build().is_ok());
    }

    #[test]
    fn restricted_elements_must_validate() {
        let err = IntPrim::new().restricted([json!(1), json!("2")]).build().unwrap_err();
        assert!(err.is_definition());
        assert_eq!(err.hint().children.len(), 1);
    }

    #[test]
    fn restricted_must_not_be_empty() {
        let err = StrPrim::new().restricted(Vec::<String>::new()).build().unwrap_err();
        assert!(err.is_definition());
    }

    #[test]
    fn float_restriction_is_normalised() {
        let s = FloatPrim::new().restricted([0, 1]).build().unwrap();
        assert_eq!(s.restricted().unwrap(), &[json!(0.0), json!(1.0)]);
    }

    #[test]
    fn str_restriction_conflicts_with_pattern() {
        let err = StrPrim::new()
            .pattern("[a-z]+")
            .restricted(["a"])
            .build()
            .unwrap_err();
        assert!(err.is_definition());
    }

    #[test]
    fn invalid_pattern_is_a_definition_error() {
        let err = StrPrim::new().pattern("(").build().unwrap_err();
        assert!(err.is_definition());
        assert!(err.hint().data.is_some());
    }

    #[test]
    fn str_default_is_normalised() {
        let s = StrPrim::new()
            .strip(true)
            .char_case(CharCase::Lower)
            .default_val("  HeLLo ")
            .build()
            .unwrap();
        assert_eq!(s.default_value(), Some(&json!("hello")));
    }

    #[test]
    fn derived_default_is_struct_only() {
        let err = IntPrim::new().default_val(Special::Derived).build().unwrap_err();
        assert!(err.is_definition());
    }

    #[test]
    fn expression_default_needs_evaluated_class() {
        // Without a class the marker string is just a bad int.
        assert!(IntPrim::new().default_val("$expr:n").build().is_err());
        let s = IntPrim::new()
            .evaluated(EvaluatedClass::standard())
            .default_val("$expr:n")
            .build()
            .unwrap();
        assert!(s.default_is_expression());
        assert_eq!(s.init_val(), &json!(0));
    }

    #[test]
    fn default_eval_rules() {
        let class = EvaluatedClass::standard();
        // Concrete default: default_eval is not allowed.
        assert!(IntPrim::new()
            .evaluated(class.clone())
            .default_val(1)
            .default_eval(2)
            .build()
            .is_err());
        // default_eval may not itself be an expression.
        assert!(IntPrim::new()
            .evaluated(class.clone())
            .default_val("$expr:n")
            .default_eval("$expr:m")
            .build()
            .is_err());
        // default_eval must validate.
        assert!(IntPrim::new()
            .evaluated(class.clone())
            .default_val("$expr:n")
            .default_eval("x")
            .build()
            .is_err());
        let s = IntPrim::new()
            .evaluated(class)
            .default_val("$expr:n")
            .default_eval(7)
            .build()
            .unwrap();
        assert_eq!(s.default_eval(), Some(&json!(7)));
        assert_eq!(s.init_val(), &json!(7));
    }

    #[test]
    fn init_val_rules() {
        assert!(IntPrim::new().init_val("x").build().is_err());
        assert!(IntPrim::new().init_val(Value::Null).build().is_err());
        // A marker string is only an expression on an evaluated schema.
        assert!(IntPrim::new().init_val("$expr:n").build().is_err());
        let s = IntPrim::new()
            .evaluated(EvaluatedClass::standard())
            .init_val("$expr:n")
            .build()
            .unwrap();
        assert_eq!(s.init_val(), &json!("$expr:n"));
    }

    #[test]
    fn container_length_bounds() {
        let s = SeqPrim::new(IntPrim::new().build().unwrap())
            .min_len(1)
            .max_len(3)
            .build()
            .unwrap();
        assert_eq!(s.min_len(), Some(1));
        assert_eq!(s.max_len(), Some(3));
        assert!(SeqPrim::new(IntPrim::new().build().unwrap())
            .min_len(3)
            .max_len(1)
            .build()
            .is_err());
    }

    #[test]
    fn nested_unions_are_flattened() {
        let inner = UnionPrim::new([
            IntPrim::new().build().unwrap(),
            StrPrim::new().build().unwrap(),
        ])
        .build()
        .unwrap();
        let outer = UnionPrim::new([inner, BoolPrim::new().build().unwrap()])
            .build()
            .unwrap();
        assert_eq!(outer.members().len(), 3);
    }

    #[test]
    fn nested_union_with_options_is_rejected() {
        let members = || {
            [
                IntPrim::new().build().unwrap(),
                StrPrim::new().build().unwrap(),
            ]
        };
        let with_default = UnionPrim::new(members()).default_val(5).build().unwrap();
        let with_doc = UnionPrim::new(members()).doc("id or name").build().unwrap();
        for inner in [with_default, with_doc] {
            let err = UnionPrim::new([inner, BoolPrim::new().build().unwrap()])
                .build()
                .unwrap_err();
            assert!(err.is_definition());
        }
    }
}
