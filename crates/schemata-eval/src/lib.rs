//! # schemata-eval — Deferred Evaluation Backends
//!
//! A raw string that starts with an evaluation marker (for example
//! `$expr:self`) is not data: it is an expression to be resolved later
//! against a caller-supplied [`Context`]. This crate owns that seam.
//!
//! - [`Evaluator`] — a named, pure sub-evaluator turning an expression body
//!   and a context into a raw value.
//! - [`EvaluatedClass`] — a marker prefix plus an ordered registry of
//!   evaluators. Schemas reference a class to opt in to evaluation.
//! - [`ExprEvaluator`] (`expr`) — JSON literals and dotted-path references.
//! - [`TemplateEvaluator`] (`tmpl`) — `${path}` interpolation into text.
//!
//! The schema layer re-decodes every result under the attached schema, so
//! evaluators never validate; they only resolve.
//!
//! ## Crate Policy
//!
//! - Depends only on `schemata-core` internally.
//! - Evaluators are pure relative to the provided context: evaluating the
//!   same source against the same context twice yields equal values.

pub mod class;
pub mod context;
pub mod error;
pub mod evaluator;

pub use class::{EvaluatedClass, EvaluatedClassConfig, Expression, DEFAULT_MARKER};
pub use context::Context;
pub use error::{EvalError, EvalResult};
pub use evaluator::{Evaluator, ExprEvaluator, TemplateEvaluator};
