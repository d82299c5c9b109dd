use blockdump_fs::record::{HEIGHT_FIELD, annotate, declared_height};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Response body as returned by the API, before normalisation.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Object(Map<String, Value>),
    Other(Value),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Payload::Object(map),
            other => Payload::Other(other),
        }
    }
}

/// A block in its stored shape: an object that names its own height.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    height: u64,
    body:   Map<String, Value>,
}

impl Record {
    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }
}

/// Validate `payload` against the requested height and bring it into stored shape.
///
/// A declared height must match exactly; it is never rewritten.
pub fn normalize(height: u64, payload: Payload) -> Result<Record, ValidationError> {
    let value = match payload {
        Payload::Object(map) => {
            if let Some(found) = map.get(HEIGHT_FIELD)
                && declared_height(found) != Some(height)
            {
                return Err(ValidationError::HeightMismatch {
                    expected: height,
                    found:    found.clone(),
                });
            }
            Value::Object(map)
        }
        Payload::Other(value) => value,
    };
    Ok(Record {
        height,
        body: annotate(height, value, HEIGHT_FIELD),
    })
}
