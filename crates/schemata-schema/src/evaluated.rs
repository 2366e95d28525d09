//! # Deferred Values
//!
//! An [`Evaluated`] is an expression source captured during decoding in
//! place of a concrete value. It keeps the schema that deferred it, so the
//! evaluation result is validated under exactly the rules the raw value
//! would have been.

use schemata_core::{Hint, Loc, SchemaError, SchemaResult};
use schemata_eval::{Context, Expression};

use crate::decode::DecodeOptions;
use crate::schema::Schema;
use crate::valued::Valued;

/// A deferred expression bound to its schema and location.
#[derive(Debug, Clone)]
pub struct Evaluated {
    schema: Schema,
    src: String,
    loc: Loc,
}

impl Evaluated {
    /// Defer `src` under `schema` at the root location.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Validation` if `schema` is not evaluated or
    /// `src` is not one of its expressions.
    pub fn new(schema: &Schema, src: impl Into<String>) -> SchemaResult<Self> {
        let src = src.into();
        let loc = Loc::root();
        match schema.evaluated() {
            Some(class) if class.is_expression(&src) => Ok(Self::at(schema, src, &loc)),
            Some(_) => Err(SchemaError::validation(
                format!("{src:?} is not an expression of this schema"),
                &loc,
            )),
            None => Err(SchemaError::validation("schema is not evaluated", &loc)),
        }
    }

    pub(crate) fn at(schema: &Schema, src: impl Into<String>, loc: &Loc) -> Self {
        Self {
            schema: schema.clone(),
            src: src.into(),
            loc: loc.clone(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn loc(&self) -> &Loc {
        &self.loc
    }

    /// The evaluator name and body of the source.
    pub fn expression(&self) -> Option<Expression<'_>> {
        self.schema.evaluated()?.check(&self.src)
    }

    /// Resolve the expression and decode the result under the schema.
    ///
    /// The result is decoded with markers disabled, so a string that looks
    /// like an expression is taken as data. A null or absent part of the
    /// result whose schema has an expression default takes its
    /// `default_eval` stand-in, and fails without one. Concrete defaults
    /// filled in during that decode may still hold markers at nested
    /// evaluated positions; those are resolved against the same context.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Evaluation` if the evaluator fails or the
    /// result does not validate. The hint is located at this value and
    /// carries the evaluator message or validation tree.
    pub fn evaluate(&self, context: &Context) -> SchemaResult<Valued> {
        let class = self.schema.evaluated().ok_or_else(|| {
            SchemaError::evaluation(
                format!("cannot evaluate {:?}: schema is not evaluated", self.src),
                &self.loc,
            )
        })?;
        tracing::debug!(src = %self.src, loc = %self.loc, "evaluating deferred value");

        let raw = class.evaluate(&self.src, context).map_err(|e| {
            SchemaError::Evaluation(
                Hint::error(format!("failed to evaluate {:?}", self.src))
                    .with_loc(&self.loc)
                    .with_data(e.to_string()),
            )
        })?;

        let valued = self
            .schema
            .decode_with(Some(&raw), &self.loc, &DecodeOptions::resolved())
            .map_err(|e| match e {
                SchemaError::Validation(hint) => SchemaError::Evaluation(
                    Hint::error(format!("{:?} evaluated to an invalid value", self.src))
                        .with_loc(&self.loc)
                        .with_data(raw.to_string())
                        .with_child(hint),
                ),
                other => other,
            })?;

        if valued.is_resolved() {
            Ok(valued)
        } else {
            valued.evaluate(context)
        }
    }
}

impl PartialEq for Evaluated {
    fn eq(&self, other: &Self) -> bool {
        self.src == other.src && self.schema == other.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prim::{IntPrim, StrPrim};
    use crate::structure::StructSchema;
    use schemata_eval::EvaluatedClass;
    use serde_json::Value;
    use serde_json::json;

    fn evaluated_int() -> Schema {
        IntPrim::new()
            .evaluated(EvaluatedClass::standard())
            .max(100)
            .build()
            .unwrap()
    }

    #[test]
    fn new_checks_schema_and_source() {
        let s = evaluated_int();
        let e = Evaluated::new(&s, "$expr:n").unwrap();
        assert_eq!(e.expression().unwrap().evaluator, "expr");
        assert!(Evaluated::new(&s, "n").is_err());
        let plain = IntPrim::new().build().unwrap();
        assert!(Evaluated::new(&plain, "$expr:n").is_err());
    }

    #[test]
    fn evaluate_validates_result() {
        let e = Evaluated::new(&evaluated_int(), "$expr:n").unwrap();
        let v = e.evaluate(&Context::new().with("n", 5)).unwrap();
        assert_eq!(v, json!(5));

        let err = e.evaluate(&Context::new().with("n", 500)).unwrap_err();
        assert!(err.is_evaluation());
        assert_eq!(err.hint().children.len(), 1);
    }

    #[test]
    fn evaluator_failure_is_an_evaluation_error() {
        let e = Evaluated::new(&evaluated_int(), "$expr:missing").unwrap();
        let err = e.evaluate(&Context::new()).unwrap_err();
        assert!(err.is_evaluation());
        assert!(err.hint().data.as_deref().unwrap().contains("missing"));
    }

    #[test]
    fn result_markers_are_data() {
        let s = StrPrim::new()
            .evaluated(EvaluatedClass::standard())
            .build()
            .unwrap();
        let e = Evaluated::new(&s, "$expr:src").unwrap();
        let v = e
            .evaluate(&Context::new().with("src", "$expr:other"))
            .unwrap();
        assert_eq!(v.as_str(), Some("$expr:other"));
        assert!(!v.is_deferred());
    }

    #[test]
    fn equality_by_source_and_schema() {
        let s = evaluated_int();
        assert_eq!(
            Evaluated::new(&s, "$expr:n").unwrap(),
            Evaluated::new(&s, "$expr:n").unwrap()
        );
        assert_ne!(
            Evaluated::new(&s, "$expr:n").unwrap(),
            Evaluated::new(&evaluated_int(), "$expr:n").unwrap()
        );
    }

    fn int_with_expression_default(stand_in: Option<i64>) -> Schema {
        let b = IntPrim::new()
            .evaluated(EvaluatedClass::standard())
            .default_val("$expr:n");
        let b = match stand_in {
            Some(v) => b.default_eval(v),
            None => b,
        };
        b.build().unwrap()
    }

    #[test]
    fn null_result_takes_default_eval() {
        let s = int_with_expression_default(Some(7));
        let v = s.decode(&json!("$expr:n")).unwrap();
        let out = v.evaluate(&Context::new().with("n", Value::Null)).unwrap();
        assert_eq!(out.as_int(), Some(7));
        assert!(out.is_resolved());
    }

    #[test]
    fn null_result_without_stand_in_is_an_error() {
        let s = int_with_expression_default(None);
        let v = s.decode(&json!("$expr:n")).unwrap();
        let err = v
            .evaluate(&Context::new().with("n", Value::Null))
            .unwrap_err();
        assert!(err.is_evaluation());

        let literal = s.decode(&json!("$expr:null")).unwrap();
        assert!(literal.evaluate(&Context::new()).unwrap_err().is_evaluation());
    }

    #[test]
    fn absent_field_defers_its_expression_default() {
        let s = StructSchema::builder("Job")
            .field("threads", int_with_expression_default(Some(1)))
            .build()
            .unwrap();
        let v = s.decode(&json!({})).unwrap();
        assert!(v.get("threads").unwrap().is_deferred());
        let out = v.evaluate(&Context::new().with("n", 3)).unwrap();
        assert_eq!(out.get("threads").unwrap().as_int(), Some(3));
    }

    #[test]
    fn absent_part_of_result_takes_default_eval() {
        let s = StructSchema::builder("Job")
            .field("threads", int_with_expression_default(Some(1)))
            .evaluated(EvaluatedClass::standard())
            .build()
            .unwrap();
        let v = s.decode(&json!("$expr:cfg")).unwrap();
        let ctx = Context::new().with("cfg", json!({})).with("n", 5);
        let out = v.evaluate(&ctx).unwrap();
        assert_eq!(out.get("threads").unwrap().as_int(), Some(1));
    }
}
