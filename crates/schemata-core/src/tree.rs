//! Raw-tree predicates.
//!
//! Each predicate is total over `serde_json::Value` and returns a plain
//! boolean. The scalar predicates partition the tree: a boolean is never
//! numeric, and an integer is numeric but never a boolean.

use serde_json::Value;

pub fn is_null(v: &Value) -> bool {
    v.is_null()
}

pub fn is_bool(v: &Value) -> bool {
    v.is_boolean()
}

/// Integer or floating point number. Booleans are excluded.
pub fn is_numeric(v: &Value) -> bool {
    v.is_number()
}

/// A number with no fractional representation (`1` but not `1.0`).
pub fn is_integer(v: &Value) -> bool {
    v.is_i64() || v.is_u64()
}

pub fn is_string(v: &Value) -> bool {
    v.is_string()
}

pub fn is_sequence(v: &Value) -> bool {
    v.is_array()
}

pub fn is_mapping(v: &Value) -> bool {
    v.is_object()
}

/// Whether two raw values belong to the same family. All numbers are
/// similar to each other.
pub fn is_similar_value_type(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// Short family name used in diagnostics.
pub fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "seq",
        Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bool_is_not_numeric() {
        assert!(is_bool(&json!(true)));
        assert!(!is_numeric(&json!(true)));
        assert!(!is_integer(&json!(false)));
    }

    #[test]
    fn integers_and_floats_are_numeric() {
        assert!(is_numeric(&json!(1)));
        assert!(is_numeric(&json!(1.5)));
        assert!(is_integer(&json!(-3)));
        assert!(!is_integer(&json!(2.0)));
    }

    #[test]
    fn containers() {
        assert!(is_sequence(&json!([1, 2])));
        assert!(is_mapping(&json!({"a": 1})));
        assert!(!is_mapping(&json!([])));
        assert!(is_string(&json!("x")));
        assert!(is_null(&Value::Null));
    }

    #[test]
    fn similarity() {
        assert!(is_similar_value_type(&json!(1), &json!(2.5)));
        assert!(!is_similar_value_type(&json!(1), &json!(true)));
        assert!(is_similar_value_type(&json!({}), &json!({"a": 1})));
        assert!(!is_similar_value_type(&json!([]), &json!({})));
    }

    #[test]
    fn type_names() {
        assert_eq!(type_name(&json!(1)), "int");
        assert_eq!(type_name(&json!(1.0)), "float");
        assert_eq!(type_name(&json!("s")), "str");
        assert_eq!(type_name(&json!(null)), "null");
    }
}
