//! Loose scalar rules applied to dynamically typed request values.

use serde_json::Value;

const TRUTHY: [&str; 4] = ["1", "true", "on", "yes"];

/// Scalar string form of a value. Lists and maps have none.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some(String::new()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if n.is_f64() => f.to_string(),
            _ => n.to_string(),
        }),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// `1`, `"true"`, `"on"`, `"yes"` (any case, surrounding whitespace ignored) are true.
pub fn as_bool(value: &Value) -> bool {
    if let Value::Bool(b) = value {
        return *b;
    }

    scalar_string(value)
        .map(|s| s.trim().to_lowercase())
        .is_some_and(|s| TRUTHY.contains(&s.as_str()))
}

pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
