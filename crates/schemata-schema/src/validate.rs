//! # Validation
//!
//! Validation asks whether a raw tree or a valued satisfies a schema
//! without keeping the decoded result. A valued is checked through its raw
//! form, so a value decoded under one schema can be validated against
//! another.

use serde_json::Value;

use schemata_core::{HintSink, SchemaError, SchemaResult};

use crate::schema::Schema;
use crate::valued::Valued;

impl Schema {
    /// Check that `valued` satisfies this schema.
    ///
    /// # Errors
    ///
    /// Returns the same error decoding the valued's raw form would.
    pub fn validate(&self, valued: &Valued) -> SchemaResult<()> {
        if self.admits(valued.schema()) {
            return Ok(());
        }
        self.decode_with(
            Some(&valued.src()),
            valued.loc(),
            &crate::decode::DecodeOptions::default(),
        )
        .map(|_| ())
    }

    /// Check that `raw` satisfies this schema.
    pub fn validate_raw(&self, raw: &Value) -> SchemaResult<()> {
        self.decode(raw).map(|_| ())
    }

    /// Whether `raw` satisfies this schema.
    pub fn is_valid(&self, raw: &Value) -> bool {
        self.validate_raw(raw).is_ok()
    }

    /// Validate `raw`, reporting any failure to `sink` instead of
    /// returning it. Returns whether `raw` was accepted.
    pub fn validate_into(&self, raw: &Value, sink: &dyn HintSink) -> bool {
        match self.validate_raw(raw) {
            Ok(()) => true,
            Err(err) => {
                if !matches!(err, SchemaError::Validation(_)) {
                    tracing::warn!(kind = ?err.kind(), "validation aborted");
                }
                sink.emit(err.hint());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::prim::{FloatPrim, IntPrim, SeqPrim};
    use schemata_core::CollectSink;
    use serde_json::json;

    #[test]
    fn validate_accepts_own_valueds() {
        let s = IntPrim::new().min(0).build().unwrap();
        let v = s.decode(&json!(3)).unwrap();
        assert!(s.validate(&v).is_ok());
    }

    #[test]
    fn validate_checks_foreign_valueds() {
        let f = FloatPrim::new().build().unwrap();
        let positive = IntPrim::new().min(1).build().unwrap();
        assert!(positive.validate(&f.decode(&json!(2)).unwrap()).is_err());
        let v = IntPrim::new().build().unwrap().decode(&json!(0)).unwrap();
        assert!(positive.validate(&v).unwrap_err().is_validation());
    }

    #[test]
    fn validate_into_reports_to_sink() {
        let s = SeqPrim::new(IntPrim::new().build().unwrap()).build().unwrap();
        let sink = CollectSink::new();
        assert!(s.validate_into(&json!([1, 2]), &sink));
        assert!(sink.is_empty());
        assert!(!s.validate_into(&json!([1, "x"]), &sink));
        assert_eq!(sink.len(), 1);
        assert!(!s.is_valid(&json!("x")));
    }
}
