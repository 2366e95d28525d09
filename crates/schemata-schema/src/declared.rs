//! # Forward Declarations
//!
//! A [`Declared`] names a struct schema before it exists, which is the only
//! way to build a recursive schema. The declaration is bound exactly once
//! by passing it to [`crate::structure::StructBuilder::declared`]; every
//! schema handle taken from it with [`Declared::schema`] resolves to the
//! bound struct from then on.
//!
//! Decoding through a declaration that was never bound is a declaration
//! error, as is binding it a second time.

use std::fmt;
use std::sync::{Arc, OnceLock};

use schemata_core::{SchemaError, SchemaResult};

use crate::schema::{Common, Schema, SchemaKind};
use crate::structure::DEFAULT_TAG_KEY;

struct DeclaredInner {
    tag: String,
    tag_key: String,
    target: OnceLock<Schema>,
}

/// A named, late-bound reference to a tagged struct schema.
#[derive(Clone)]
pub struct Declared(Arc<DeclaredInner>);

impl Declared {
    /// Declare a struct tagged `tag` under the default tag key.
    pub fn new(tag: impl Into<String>) -> Self {
        Self::with_tag_key(tag, DEFAULT_TAG_KEY)
    }

    pub fn with_tag_key(tag: impl Into<String>, tag_key: impl Into<String>) -> Self {
        Self(Arc::new(DeclaredInner {
            tag: tag.into(),
            tag_key: tag_key.into(),
            target: OnceLock::new(),
        }))
    }

    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    pub fn tag_key(&self) -> &str {
        &self.0.tag_key
    }

    /// Whether a struct has been bound to this declaration.
    pub fn is_defined(&self) -> bool {
        self.0.target.get().is_some()
    }

    pub fn target(&self) -> Option<&Schema> {
        self.0.target.get()
    }

    /// A schema handle that resolves to the bound struct.
    pub fn schema(&self) -> Schema {
        Schema::from_parts(SchemaKind::Declared(self.clone()), Common::bare())
    }

    pub(crate) fn bind(&self, schema: &Schema) -> SchemaResult<()> {
        self.0.target.set(schema.clone()).map_err(|_| {
            SchemaError::declared(format!(
                "declared schema `{}` is already defined",
                self.0.tag
            ))
        })?;
        tracing::debug!(tag = %self.0.tag, tag_key = %self.0.tag_key, "bound declared schema");
        Ok(())
    }
}

impl PartialEq for Declared {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Declared {
    // The target is omitted: it may refer back to this declaration.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declared")
            .field("tag", &self.0.tag)
            .field("tag_key", &self.0.tag_key)
            .field("defined", &self.is_defined())
            .finish()
    }
}
