//! # Error Types — Schema Error Taxonomy
//!
//! Every schema failure is a [`SchemaError`]. The variant names the class
//! of failure; the payload is always a [`Hint`] tree localising every
//! violation found in a single pass.
//!
//! ## Design
//!
//! - `Definition` errors come from schema construction and indicate a bug
//!   in the declaring code. They propagate immediately.
//! - `Declared` errors mean a named forward reference was never bound, or
//!   was bound twice.
//! - `Validation` errors mean a raw datum was rejected by a schema.
//! - `Evaluation` errors mean a deferred expression could not be resolved,
//!   or resolved to an invalid value.
//!
//! Matching on the enum itself catches any schema failure uniformly.

use thiserror::Error;

use crate::hint::Hint;
use crate::loc::Loc;

/// Any failure raised by a schema operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// The schema itself is internally inconsistent.
    #[error("schema definition error: {0}")]
    Definition(Hint),

    /// A named schema reference could not be resolved or was rebound.
    #[error("schema declaration error: {0}")]
    Declared(Hint),

    /// A raw datum was not accepted by the schema.
    #[error("schema validation error: {0}")]
    Validation(Hint),

    /// A deferred expression failed to resolve to a valid value.
    #[error("schema evaluation error: {0}")]
    Evaluation(Hint),
}

/// Class of a [`SchemaError`], for callers that only need to branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaErrorKind {
    Definition,
    Declared,
    Validation,
    Evaluation,
}

/// Result type alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

impl SchemaError {
    pub fn definition(primary: impl Into<String>) -> Self {
        Self::Definition(Hint::error(primary))
    }

    pub fn declared(primary: impl Into<String>) -> Self {
        Self::Declared(Hint::error(primary))
    }

    pub fn validation(primary: impl Into<String>, loc: &Loc) -> Self {
        Self::Validation(Hint::error(primary).with_loc(loc))
    }

    pub fn evaluation(primary: impl Into<String>, loc: &Loc) -> Self {
        Self::Evaluation(Hint::error(primary).with_loc(loc))
    }

    pub fn kind(&self) -> SchemaErrorKind {
        match self {
            Self::Definition(_) => SchemaErrorKind::Definition,
            Self::Declared(_) => SchemaErrorKind::Declared,
            Self::Validation(_) => SchemaErrorKind::Validation,
            Self::Evaluation(_) => SchemaErrorKind::Evaluation,
        }
    }

    pub fn hint(&self) -> &Hint {
        match self {
            Self::Definition(h) | Self::Declared(h) | Self::Validation(h) | Self::Evaluation(h) => h,
        }
    }

    pub fn into_hint(self) -> Hint {
        match self {
            Self::Definition(h) | Self::Declared(h) | Self::Validation(h) | Self::Evaluation(h) => h,
        }
    }

    /// Location of the root hint, if it has one.
    pub fn loc(&self) -> Option<&Loc> {
        self.hint().loc.as_ref()
    }

    /// Same class, with `hint` wrapped as the only child of a new root.
    pub fn context(self, primary: impl Into<String>) -> Self {
        let kind = self.kind();
        let wrapped = Hint::error(primary).with_child(self.into_hint());
        Self::from_kind(kind, wrapped)
    }

    pub fn from_kind(kind: SchemaErrorKind, hint: Hint) -> Self {
        match kind {
            SchemaErrorKind::Definition => Self::Definition(hint),
            SchemaErrorKind::Declared => Self::Declared(hint),
            SchemaErrorKind::Validation => Self::Validation(hint),
            SchemaErrorKind::Evaluation => Self::Evaluation(hint),
        }
    }

    pub fn is_definition(&self) -> bool {
        self.kind() == SchemaErrorKind::Definition
    }

    pub fn is_declared(&self) -> bool {
        self.kind() == SchemaErrorKind::Declared
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == SchemaErrorKind::Validation
    }

    pub fn is_evaluation(&self) -> bool {
        self.kind() == SchemaErrorKind::Evaluation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let loc = Loc::root();
        assert_eq!(SchemaError::definition("x").kind(), SchemaErrorKind::Definition);
        assert_eq!(SchemaError::declared("x").kind(), SchemaErrorKind::Declared);
        assert!(SchemaError::validation("x", &loc).is_validation());
        assert!(SchemaError::evaluation("x", &loc).is_evaluation());
    }

    #[test]
    fn display_includes_class_and_hint() {
        let err = SchemaError::validation("expected int, found str", &Loc::root().key("x"));
        let msg = err.to_string();
        assert!(msg.starts_with("schema validation error:"));
        assert!(msg.contains("expected int, found str"));
        assert!(msg.contains("/x"));
    }

    #[test]
    fn context_preserves_kind_and_nests() {
        let err = SchemaError::evaluation("missing name `a`", &Loc::root())
            .context("failed to evaluate `$expr:a`");
        assert!(err.is_evaluation());
        assert_eq!(err.hint().primary, "failed to evaluate `$expr:a`");
        assert_eq!(err.hint().children.len(), 1);
        assert_eq!(err.hint().children[0].primary, "missing name `a`");
    }

    #[test]
    fn loc_comes_from_root_hint() {
        let loc = Loc::root().index(2);
        assert_eq!(SchemaError::validation("x", &loc).loc(), Some(&loc));
        assert_eq!(SchemaError::definition("x").loc(), None);
    }
}
