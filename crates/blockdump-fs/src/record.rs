//! Canonical stored-record shape: a JSON object that carries its own height.

use serde_json::{Map, Value};

pub const HEIGHT_FIELD: &str = "height";
pub const DATA_FIELD: &str = "data";

/// Turn any JSON value into an object keyed by `field`.
///
/// Objects get `field` injected when absent and are otherwise kept as-is.
/// Anything else is wrapped as `{field: height, "data": value}`.
pub fn annotate(height: u64, value: Value, field: &str) -> Map<String, Value> {
    match value {
        Value::Object(mut map) => {
            map.entry(field.to_string()).or_insert_with(|| Value::from(height));
            map
        }
        other => {
            let mut map = Map::with_capacity(2);
            map.insert(field.to_string(), Value::from(height));
            map.insert(DATA_FIELD.to_string(), other);
            map
        }
    }
}

/// Read a declared height, accepting integers and integer strings.
pub fn declared_height(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
