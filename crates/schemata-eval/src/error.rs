//! Evaluation error types.
//!
//! Evaluators report failures without location information; the schema
//! layer attaches the originating `Loc` when it maps these into
//! `SchemaError::Evaluation`.

use thiserror::Error;

/// Errors raised while resolving an expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The marker named an evaluator that is not registered.
    #[error("unknown evaluator {name:?}")]
    UnknownEvaluator { name: String },

    /// The source does not carry the class marker at all.
    #[error("not an expression: {src:?} (expected marker {marker:?})")]
    NotAnExpression { src: String, marker: String },

    /// A referenced name or path is absent from the context.
    #[error("name {path:?} is not defined in the evaluation context")]
    MissingName { path: String },

    /// The expression body could not be interpreted.
    #[error("invalid {evaluator} expression {body:?}: {reason}")]
    BadExpression {
        evaluator: String,
        body: String,
        reason: String,
    },

    /// The evaluator class configuration is inconsistent.
    #[error("invalid evaluator configuration: {0}")]
    Config(String),
}

/// Result type alias for evaluation operations.
pub type EvalResult<T> = Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_name_display() {
        let err = EvalError::MissingName {
            path: "a.b".to_string(),
        };
        assert!(err.to_string().contains("\"a.b\""));
    }

    #[test]
    fn bad_expression_display() {
        let err = EvalError::BadExpression {
            evaluator: "tmpl".to_string(),
            body: "${x".to_string(),
            reason: "unterminated reference".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("tmpl"));
        assert!(msg.contains("unterminated reference"));
    }
}
