//! # Evaluation Context
//!
//! A [`Context`] is the string-keyed mapping an expression is resolved
//! against. Lookups accept dotted paths: `job.inputs.0` walks mapping keys
//! and sequence indices from a top-level name.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use schemata_core::PathSegment;

use crate::error::{EvalError, EvalResult};

/// Name → value bindings available to expressions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    bindings: Map<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, returning the previous binding if there was one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.bindings.insert(name.into(), value.into())
    }

    /// Builder form of [`Context::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Resolve a dotted path such as `a.b.0`.
    ///
    /// # Errors
    ///
    /// Returns `EvalError::BadExpression` for a malformed path and
    /// `EvalError::MissingName` when any step is absent.
    pub fn resolve(&self, path: &str) -> EvalResult<&Value> {
        let segments = parse_path(path)?;
        self.resolve_segments(&segments)
            .ok_or_else(|| EvalError::MissingName {
                path: path.to_string(),
            })
    }

    /// Resolve pre-split path segments. The first segment must be a key.
    pub fn resolve_segments(&self, segments: &[PathSegment]) -> Option<&Value> {
        let (first, rest) = segments.split_first()?;
        let mut current = match first {
            PathSegment::Key(name) => self.bindings.get(name)?,
            PathSegment::Index(_) => return None,
        };
        for segment in rest {
            current = match (segment, current) {
                (PathSegment::Key(k), Value::Object(map)) => map.get(k)?,
                (PathSegment::Index(i), Value::Array(items)) => items.get(*i)?,
                // A numeric segment may also name a mapping key.
                (PathSegment::Index(i), Value::Object(map)) => map.get(&i.to_string())?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.bindings
    }
}

impl From<Map<String, Value>> for Context {
    fn from(bindings: Map<String, Value>) -> Self {
        Self { bindings }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            bindings: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Split a dotted path into segments. Purely numeric segments after the
/// first become indices; the first segment is always a name.
pub(crate) fn parse_path(path: &str) -> EvalResult<Vec<PathSegment>> {
    let trimmed = path.trim();
    let bad = |reason: &str| EvalError::BadExpression {
        evaluator: "path".to_string(),
        body: path.to_string(),
        reason: reason.to_string(),
    };
    if trimmed.is_empty() {
        return Err(bad("empty reference"));
    }
    let mut segments = Vec::new();
    for (i, part) in trimmed.split('.').enumerate() {
        if part.is_empty() {
            return Err(bad("empty path segment"));
        }
        if i == 0 {
            if !is_identifier(part) {
                return Err(bad("reference must start with a name"));
            }
            segments.push(PathSegment::Key(part.to_string()));
        } else if let Ok(index) = part.parse::<usize>() {
            segments.push(PathSegment::Index(index));
        } else if is_identifier(part) {
            segments.push(PathSegment::Key(part.to_string()));
        } else {
            return Err(bad("path segments must be names or indices"));
        }
    }
    Ok(segments)
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> Context {
        Context::new()
            .with("self", 11)
            .with("job", json!({"inputs": ["a.txt", "b.txt"], "name": "build"}))
    }

    #[test]
    fn resolves_top_level_names() {
        assert_eq!(ctx().resolve("self").unwrap(), &json!(11));
    }

    #[test]
    fn resolves_nested_paths() {
        let c = ctx();
        assert_eq!(c.resolve("job.name").unwrap(), &json!("build"));
        assert_eq!(c.resolve("job.inputs.1").unwrap(), &json!("b.txt"));
    }

    #[test]
    fn missing_names_are_reported() {
        let err = ctx().resolve("job.outputs").unwrap_err();
        assert_eq!(
            err,
            EvalError::MissingName {
                path: "job.outputs".to_string()
            }
        );
        assert!(matches!(ctx().resolve("nope"), Err(EvalError::MissingName { .. })));
        assert!(matches!(ctx().resolve("job.inputs.7"), Err(EvalError::MissingName { .. })));
    }

    #[test]
    fn malformed_paths_are_rejected() {
        for bad in ["", "a..b", "0.a", "a.b-c", " . "] {
            assert!(
                matches!(ctx().resolve(bad), Err(EvalError::BadExpression { .. })),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn collects_from_pairs() {
        let c: Context = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(c.len(), 2);
        assert!(c.contains("b"));
        assert_eq!(c.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn deserializes_from_mapping() {
        let c: Context = serde_json::from_value(json!({"x": [1, 2]})).unwrap();
        assert_eq!(c.resolve("x.0").unwrap(), &json!(1));
    }
}
