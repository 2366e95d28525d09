//! # Default-Policy Sentinels
//!
//! `required`, `optional`, and `derived` are marker values, not data. They
//! live in their own type so a sentinel can never be decoded from, or
//! compared against, a raw value.
//!
//! | Sentinel | Meaning when the datum is absent |
//! |----------|----------------------------------|
//! | `Required` | validation error |
//! | `Optional` | an absent valued |
//! | `Derived` | the default computed from the struct's field defaults |

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One of the three default-policy markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Special {
    Required,
    Optional,
    Derived,
}

impl fmt::Display for Special {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::Optional => write!(f, "optional"),
            Self::Derived => write!(f, "derived"),
        }
    }
}

/// Declared default of a schema: a sentinel or a concrete raw value.
///
/// The `Value` variant may hold an evaluation expression source when the
/// owning schema is evaluated; the schema layer decides that.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultVal {
    Special(Special),
    Value(Value),
}

impl DefaultVal {
    pub const REQUIRED: Self = Self::Special(Special::Required);
    pub const OPTIONAL: Self = Self::Special(Special::Optional);
    pub const DERIVED: Self = Self::Special(Special::Derived);

    /// The sentinel, if this default is one.
    pub fn special(&self) -> Option<Special> {
        match self {
            Self::Special(s) => Some(*s),
            Self::Value(_) => None,
        }
    }

    /// The concrete raw default, if one was declared.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Special(_) => None,
        }
    }

    /// Whether a datum may be omitted.
    pub fn is_defined(&self) -> bool {
        !is_required(self)
    }
}

impl Default for DefaultVal {
    fn default() -> Self {
        Self::REQUIRED
    }
}

impl fmt::Display for DefaultVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Special(s) => write!(f, "{s}"),
            Self::Value(v) => write!(f, "{v}"),
        }
    }
}

impl From<Special> for DefaultVal {
    fn from(s: Special) -> Self {
        Self::Special(s)
    }
}

impl From<Value> for DefaultVal {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<bool> for DefaultVal {
    fn from(v: bool) -> Self {
        Self::Value(Value::Bool(v))
    }
}

impl From<i32> for DefaultVal {
    fn from(v: i32) -> Self {
        Self::Value(Value::from(v))
    }
}

impl From<i64> for DefaultVal {
    fn from(v: i64) -> Self {
        Self::Value(Value::from(v))
    }
}

impl From<f64> for DefaultVal {
    fn from(v: f64) -> Self {
        Self::Value(Value::from(v))
    }
}

impl From<&str> for DefaultVal {
    fn from(v: &str) -> Self {
        Self::Value(Value::String(v.to_string()))
    }
}

impl From<String> for DefaultVal {
    fn from(v: String) -> Self {
        Self::Value(Value::String(v))
    }
}

pub fn is_required(default: &DefaultVal) -> bool {
    default.special() == Some(Special::Required)
}

pub fn is_optional(default: &DefaultVal) -> bool {
    default.special() == Some(Special::Optional)
}

pub fn is_derived(default: &DefaultVal) -> bool {
    default.special() == Some(Special::Derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_is_required() {
        assert!(is_required(&DefaultVal::default()));
        assert!(!DefaultVal::default().is_defined());
    }

    #[test]
    fn predicates_partition_sentinels() {
        let all = [DefaultVal::REQUIRED, DefaultVal::OPTIONAL, DefaultVal::DERIVED];
        for d in &all {
            let hits = [is_required(d), is_optional(d), is_derived(d)]
                .iter()
                .filter(|b| **b)
                .count();
            assert_eq!(hits, 1, "{d} matched {hits} predicates");
        }
    }

    #[test]
    fn concrete_values_are_not_sentinels() {
        let d = DefaultVal::from(3);
        assert!(!is_required(&d) && !is_optional(&d) && !is_derived(&d));
        assert_eq!(d.value(), Some(&json!(3)));
        assert_eq!(d.special(), None);
        assert!(d.is_defined());
    }

    #[test]
    fn sentinel_display_and_serde() {
        assert_eq!(Special::Optional.to_string(), "optional");
        assert_eq!(serde_json::to_value(Special::Derived).unwrap(), json!("derived"));
        let parsed: Special = serde_json::from_value(json!("required")).unwrap();
        assert_eq!(parsed, Special::Required);
    }

    #[test]
    fn null_string_is_data_not_sentinel() {
        let d = DefaultVal::from("optional");
        assert!(!is_optional(&d));
    }
}
