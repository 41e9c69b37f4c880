//! Attribute lookup and value comparison used by example matchers.

use serde_json::{Number, Value};

/// Follows `path` through nested objects.
pub(super) fn get_path<'a>(document: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = document;
    for part in path {
        current = current.get(part.as_str())?;
    }
    Some(current)
}

/// Compares two JSON values for equality.
///
/// Numbers compare by value regardless of their integer/float representation.
pub(super) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => false,
    }
}

/// Exact for integers, `==` once either side is a float.
#[allow(clippy::float_cmp)]
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    if a.is_f64() || b.is_f64() {
        return a.as_f64().zip(b.as_f64()).is_some_and(|(a, b)| a == b);
    }
    false
}
