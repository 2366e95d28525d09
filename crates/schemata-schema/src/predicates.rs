//! # Predicates
//!
//! Boolean classifiers for schemas, valueds and raw trees. The `dyn Any`
//! forms answer the question for arbitrary values, which is what generic
//! tooling holding heterogeneous objects needs.

use std::any::Any;

use schemata_eval::EvaluatedClass;

use crate::schema::{Schema, SchemaFamily};
use crate::valued::{Valued, ValuedType};

pub use schemata_core::{
    is_bool, is_derived, is_integer, is_mapping, is_null, is_numeric, is_optional, is_required,
    is_sequence, is_similar_value_type, is_string,
};

/// A schema that is neither a struct nor an unbound declaration.
pub fn is_schema_prim(schema: &Schema) -> bool {
    !matches!(schema.family(), SchemaFamily::Struct | SchemaFamily::Declared)
}

pub fn is_schema_struct(schema: &Schema) -> bool {
    schema.family() == SchemaFamily::Struct
}

/// Whether the handle was created from a declaration, bound or not.
pub fn is_schema_declared(schema: &Schema) -> bool {
    schema.declared().is_some()
}

pub fn is_schema(x: &dyn Any) -> bool {
    x.is::<Schema>()
}

pub fn is_valued(x: &dyn Any) -> bool {
    x.is::<Valued>()
}

pub fn is_evaluated_class(x: &dyn Any) -> bool {
    x.is::<EvaluatedClass>()
}

/// A valued decoded under a struct schema.
pub fn is_schema_struct_valued(valued: &Valued) -> bool {
    is_schema_struct(valued.schema())
}

/// A valued holding a pending expression.
pub fn is_evaluated(valued: &Valued) -> bool {
    valued.is_deferred()
}

pub fn is_valued_type(valued: &Valued, ty: ValuedType) -> bool {
    valued.valued_type() == Some(ty)
}
