//! # Evaluated Classes
//!
//! An [`EvaluatedClass`] decides which raw strings are expressions and
//! which evaluator resolves them. Expression syntax is
//! `<marker><name>:<body>`, so with the default marker `$` the source
//! `$expr:self` selects the `expr` evaluator with body `self`.
//!
//! Only registered evaluator names form expressions. A string such as
//! `$HOME:x` is ordinary data under a class that has no `HOME` evaluator.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{Evaluator, ExprEvaluator, TemplateEvaluator};

/// Marker used by [`EvaluatedClass::standard`].
pub const DEFAULT_MARKER: &str = "$";

/// A parsed expression source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expression<'a> {
    /// Name of the selected evaluator.
    pub evaluator: &'a str,
    /// Text after `<marker><name>:`.
    pub body: &'a str,
}

/// Serializable description of an evaluated class built from the
/// built-in evaluators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatedClassConfig {
    pub marker: String,
    pub evaluators: Vec<String>,
}

impl Default for EvaluatedClassConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            evaluators: vec!["expr".to_string(), "tmpl".to_string()],
        }
    }
}

/// Marker prefix plus the evaluators it can select.
#[derive(Clone)]
pub struct EvaluatedClass {
    marker: String,
    evaluators: Vec<Arc<dyn Evaluator>>,
}

impl EvaluatedClass {
    /// An empty class with the given marker. Add evaluators with
    /// [`EvaluatedClass::with_evaluator`].
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            evaluators: Vec::new(),
        }
    }

    /// `$` marker with the `expr` and `tmpl` evaluators.
    pub fn standard() -> Self {
        Self::new(DEFAULT_MARKER)
            .with_evaluator(ExprEvaluator)
            .with_evaluator(TemplateEvaluator)
    }

    /// Build a class from configuration, selecting built-in evaluators by
    /// name.
    ///
    /// # Errors
    ///
    /// Returns `EvalError::Config` for an empty marker or a duplicated
    /// evaluator name, and `EvalError::UnknownEvaluator` for a name that
    /// is not built in.
    pub fn from_config(config: &EvaluatedClassConfig) -> EvalResult<Self> {
        if config.marker.is_empty() {
            return Err(EvalError::Config("marker must not be empty".to_string()));
        }
        let mut class = Self::new(config.marker.clone());
        for name in &config.evaluators {
            if class.get(name).is_some() {
                return Err(EvalError::Config(format!("evaluator {name:?} listed twice")));
            }
            class = match name.as_str() {
                "expr" => class.with_evaluator(ExprEvaluator),
                "tmpl" => class.with_evaluator(TemplateEvaluator),
                other => {
                    return Err(EvalError::UnknownEvaluator {
                        name: other.to_string(),
                    })
                }
            };
        }
        Ok(class)
    }

    /// Register `evaluator`, replacing any evaluator with the same name.
    pub fn with_evaluator(mut self, evaluator: impl Evaluator + 'static) -> Self {
        let evaluator: Arc<dyn Evaluator> = Arc::new(evaluator);
        match self
            .evaluators
            .iter()
            .position(|e| e.name() == evaluator.name())
        {
            Some(i) => self.evaluators[i] = evaluator,
            None => self.evaluators.push(evaluator),
        }
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Registered evaluator names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.evaluators.iter().map(|e| e.name())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Evaluator> {
        self.evaluators
            .iter()
            .find(|e| e.name() == name)
            .map(|e| &**e)
    }

    /// Parse `src` as an expression of this class.
    pub fn check<'a>(&self, src: &'a str) -> Option<Expression<'a>> {
        let rest = src.strip_prefix(self.marker.as_str())?;
        let (name, body) = rest.split_once(':')?;
        self.get(name)?;
        Some(Expression {
            evaluator: name,
            body,
        })
    }

    pub fn is_expression(&self, src: &str) -> bool {
        self.check(src).is_some()
    }

    /// Whether a raw value is an expression source of this class.
    pub fn is_expression_value(&self, raw: &Value) -> bool {
        raw.as_str().is_some_and(|s| self.is_expression(s))
    }

    /// Resolve an expression source against `context`.
    ///
    /// # Errors
    ///
    /// Returns `EvalError::NotAnExpression` if `src` lacks the marker,
    /// `EvalError::UnknownEvaluator` if the named evaluator is not
    /// registered, and whatever the evaluator itself reports.
    pub fn evaluate(&self, src: &str, context: &Context) -> EvalResult<Value> {
        let not_expr = || EvalError::NotAnExpression {
            src: src.to_string(),
            marker: self.marker.clone(),
        };
        let rest = src.strip_prefix(self.marker.as_str()).ok_or_else(not_expr)?;
        let (name, body) = rest.split_once(':').ok_or_else(not_expr)?;
        let evaluator = self.get(name).ok_or_else(|| EvalError::UnknownEvaluator {
            name: name.to_string(),
        })?;
        tracing::trace!(evaluator = name, body, "resolving expression");
        evaluator.evaluate(body, context)
    }

    /// Configuration equivalent of this class.
    pub fn config(&self) -> EvaluatedClassConfig {
        EvaluatedClassConfig {
            marker: self.marker.clone(),
            evaluators: self.names().map(str::to_string).collect(),
        }
    }
}

impl Default for EvaluatedClass {
    fn default() -> Self {
        Self::standard()
    }
}

impl PartialEq for EvaluatedClass {
    fn eq(&self, other: &Self) -> bool {
        self.marker == other.marker && self.names().eq(other.names())
    }
}

impl fmt::Debug for EvaluatedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluatedClass")
            .field("marker", &self.marker)
            .field("evaluators", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
