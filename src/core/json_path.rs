//! Dotted-path lookup into a JSON payload.
use serde_json::Value;

/// Resolve `customer.address.city` style paths. Numeric segments index arrays.
/// A key that exists verbatim (dots included) wins over path traversal.
pub fn lookup<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    if let Some(value) = payload.as_object().and_then(|map| map.get(path)) {
        return Some(value);
    }

    path.split('.').try_fold(payload, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Type name of a JSON value as reported in mismatch errors. Integers past
/// `i64::MAX` only fit a double and report as one.
pub fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() => "integer",
        Value::Number(_) => "double",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
