//! # schemata-schema — Declarative Schemas and Valued Trees
//!
//! Schemas are declared once with builders and are immutable afterwards.
//! Decoding a raw tree (`serde_json::Value`, whether it came from JSON or
//! YAML) under a schema validates it and yields a [`Valued`] tree; encoding
//! the valued gives back the canonical raw form.
//!
//! ## Schema Kinds
//!
//! | Builder | Accepts |
//! |---------|---------|
//! | [`BoolPrim`] | booleans |
//! | [`IntPrim`] | 64-bit integers, optionally bounded |
//! | [`FloatPrim`] | any number, stored as `f64` |
//! | [`StrPrim`] | strings, with pattern, length and normalisation |
//! | [`PassPrim`] | anything, unchanged |
//! | [`SeqPrim`] / [`MapPrim`] | homogeneous sequences and mappings |
//! | [`UnionPrim`] | the first member that accepts the value |
//! | [`StructSchema`] | named fields, optionally tagged |
//! | [`Declared`] | a forward reference to a tagged struct |
//!
//! Every kind shares a default policy (`required`, `optional`, `derived`
//! or a concrete value), an initial value, documentation, and optionally an
//! evaluated class. Scalars also accept a closed `restricted` value set.
//!
//! ## Deferred Values
//!
//! A schema with an [`EvaluatedClass`] defers any string carrying one of
//! the class markers, for example `$expr:threads`. The deferred value is
//! resolved later with [`Valued::evaluate`] against a [`Context`], and the
//! result is validated under the same schema.
//!
//! ## Errors
//!
//! Every operation fails with [`SchemaError`]. Validation errors carry a
//! [`Hint`] tree with one child per failing location, so a single decode
//! reports every problem in the document.
//!
//! ## Crate Policy
//!
//! - Depends on `schemata-core` for errors, hints and locations, and on
//!   `schemata-eval` for expression evaluation.
//! - No `unwrap()` outside tests. Schema construction never panics; an
//!   inconsistent schema is a `SchemaError::Definition`.

pub mod declared;
pub mod decode;
pub mod doc;
pub mod encode;
pub mod evaluated;
pub mod export;
pub mod predicates;
pub mod prim;
pub mod schema;
pub mod structure;
mod union;
pub mod validate;
pub mod valued;

pub use declared::Declared;
pub use decode::DecodeOptions;
pub use encode::EncodeOptions;
pub use evaluated::Evaluated;
pub use export::{to_json_schema, JSON_SCHEMA_DRAFT};
pub use prim::{BoolPrim, FloatPrim, IntPrim, MapPrim, PassPrim, SeqPrim, StrPrim, UnionPrim};
pub use schema::{CharCase, Schema, SchemaFamily};
pub use structure::{StructBuilder, StructDef, StructSchema, DEFAULT_TAG_KEY};
pub use valued::{Entries, StructVal, Val, Valued, ValuedType};

pub use schemata_core::{
    CollectSink, DefaultVal, Hint, HintSink, Loc, PathSegment, SchemaError, SchemaErrorKind,
    SchemaResult, Severity, Special, TracingSink,
};
pub use schemata_eval::{Context, EvaluatedClass, Evaluator};
