//! # schemata-core — Foundational Types for Schemata
//!
//! This crate is the leaf of the Schemata workspace. It defines the value
//! objects every other crate passes around while decoding, validating, and
//! evaluating schema-described data. It depends on nothing internal.
//!
//! ## Key Types
//!
//! 1. **[`Loc`]** — an opaque, cheaply clonable position inside an external
//!    tree. Child locations share their parent, so producing a location per
//!    decoded node costs one small allocation.
//!
//! 2. **[`Hint`]** — a tree-shaped diagnostic. Errors carry hints as data;
//!    callers decide how to render them.
//!
//! 3. **[`Special`] / [`DefaultVal`]** — the `required`, `optional`, and
//!    `derived` sentinels. They are a separate type from raw data, so they
//!    cannot be confused with user values.
//!
//! 4. **[`SchemaError`]** — the single error taxonomy: definition,
//!    declaration, validation, and evaluation failures.
//!
//! ## External Tree
//!
//! Raw data is a `serde_json::Value`. `Value::Null` stands in for "no
//! value"; a missing mapping key is `Option::None`. The [`tree`] module
//! holds the total predicates that partition raw values by family.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `schemata-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod hint;
pub mod loc;
pub mod sink;
pub mod special;
pub mod tree;

// Re-export primary types for ergonomic imports.
pub use error::{SchemaError, SchemaErrorKind, SchemaResult};
pub use hint::{Hint, Severity};
pub use loc::{Loc, PathSegment};
pub use sink::{CollectSink, HintSink, TracingSink};
pub use special::{is_derived, is_optional, is_required, DefaultVal, Special};
pub use tree::{
    is_bool, is_integer, is_mapping, is_null, is_numeric, is_sequence, is_similar_value_type,
    is_string, type_name,
};
