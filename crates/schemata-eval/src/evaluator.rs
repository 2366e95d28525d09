//! # Evaluators
//!
//! An [`Evaluator`] resolves the body of an expression (the text after
//! `<marker><name>:`) against a [`Context`]. Evaluators are stateless and
//! shared behind `Arc`, so they must be `Send + Sync`.

use std::fmt;

use serde_json::Value;

use crate::context::{parse_path, Context};
use crate::error::{EvalError, EvalResult};

/// A named, pure expression sub-evaluator.
pub trait Evaluator: fmt::Debug + Send + Sync {
    /// Name selected by the marker, e.g. `expr` in `$expr:self`.
    fn name(&self) -> &str;

    /// Resolve `body` against `context`.
    fn evaluate(&self, body: &str, context: &Context) -> EvalResult<Value>;
}

/// `expr`: a JSON literal or a dotted-path reference into the context.
///
/// The body is first parsed as a JSON document, so `$expr:{"x": 1}` and
/// `$expr:[1, 2]` are literals. Anything else must be a reference such as
/// `self` or `job.inputs.0`; the referenced value is returned unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExprEvaluator;

impl Evaluator for ExprEvaluator {
    fn name(&self) -> &str {
        "expr"
    }

    fn evaluate(&self, body: &str, context: &Context) -> EvalResult<Value> {
        let body = body.trim();
        if let Ok(literal) = serde_json::from_str::<Value>(body) {
            return Ok(literal);
        }
        parse_path(body).map_err(|e| relabel(e, self.name()))?;
        context.resolve(body).cloned()
    }
}

/// `tmpl`: text with `${path}` references substituted from the context.
///
/// String values are inserted verbatim; any other value is inserted as
/// compact JSON. `$$` produces a literal `$`. The result is always a string.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateEvaluator;

impl Evaluator for TemplateEvaluator {
    fn name(&self) -> &str {
        "tmpl"
    }

    fn evaluate(&self, body: &str, context: &Context) -> EvalResult<Value> {
        let bad = |reason: &str| EvalError::BadExpression {
            evaluator: self.name().to_string(),
            body: body.to_string(),
            reason: reason.to_string(),
        };

        let mut out = String::with_capacity(body.len());
        let mut rest = body;
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            if let Some(tail) = after.strip_prefix('$') {
                out.push('$');
                rest = tail;
            } else if let Some(inner) = after.strip_prefix('{') {
                let end = inner.find('}').ok_or_else(|| bad("unterminated reference"))?;
                let path = &inner[..end];
                parse_path(path).map_err(|e| relabel(e, self.name()))?;
                match context.resolve(path)? {
                    Value::String(s) => out.push_str(s),
                    other => out.push_str(&other.to_string()),
                }
                rest = &inner[end + 1..];
            } else {
                return Err(bad("`$` must be followed by `{` or `$`"));
            }
        }
        out.push_str(rest);
        Ok(Value::String(out))
    }
}

fn relabel(err: EvalError, evaluator: &str) -> EvalError {
    match err {
        EvalError::BadExpression { body, reason, .. } => EvalError::BadExpression {
            evaluator: evaluator.to_string(),
            body,
            reason,
        },
        other => other,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn template_without_references_is_identity(text in "[^$]{0,40}") {
            let out = TemplateEvaluator.evaluate(&text, &Context::new()).unwrap();
            prop_assert_eq!(out, Value::String(text));
        }

        #[test]
        fn escaped_dollars_round_trip(text in "[a-z $]{0,40}") {
            let body = text.replace('$', "$$");
            let out = TemplateEvaluator.evaluate(&body, &Context::new()).unwrap();
            prop_assert_eq!(out, Value::String(text));
        }

        #[test]
        fn expr_returns_bound_values(n in any::<i64>(), name in "v_[a-z0-9_]{0,8}") {
            let ctx = Context::new().with(name.clone(), n);
            prop_assert_eq!(ExprEvaluator.evaluate(&name, &ctx).unwrap(), Value::from(n));
        }
    }
}
