//! Serde-backed codec.
//!
//! Records are serialized to a JSON object and its members become properties.
//! Blobs have no JSON form and decode as base64 text.

use std::marker::PhantomData;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value as JsonValue};

use crate::entity::{Fields, Value};
use crate::store::{Result, StoreError};

use super::Codec;

/// Codec for any type implementing `Serialize` and `Deserialize`.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Fields> {
        match serde_json::to_value(value).map_err(|e| StoreError::Codec(e.to_string()))? {
            JsonValue::Object(object) => Ok(object
                .into_iter()
                .map(|(name, json)| (name, value_from_json(json)))
                .collect()),
            other => Err(StoreError::Codec(format!(
                "record must serialize to an object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    fn decode(&self, fields: Fields) -> Result<T> {
        let object: Map<String, JsonValue> = fields
            .into_iter()
            .map(|(name, value)| (name, value_to_json(value)))
            .collect();
        serde_json::from_value(JsonValue::Object(object))
            .map_err(|e| StoreError::Codec(e.to_string()))
    }
}

/// Converts a JSON value into a property value.
///
/// Integers outside the `i64` range become doubles.
pub fn value_from_json(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => Value::String(s),
        JsonValue::Array(items) => Value::Array(items.into_iter().map(value_from_json).collect()),
        JsonValue::Object(object) => Value::Map(
            object
                .into_iter()
                .map(|(name, json)| (name, value_from_json(json)))
                .collect(),
        ),
    }
}

/// Converts a property value into JSON.
///
/// Non-finite doubles become `null`.
pub fn value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::Integer(i) => JsonValue::Number(i.into()),
        Value::Double(d) => Number::from_f64(d)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::String(s) => JsonValue::String(s),
        Value::Blob(bytes) => JsonValue::String(STANDARD.encode(bytes)),
        Value::Array(items) => JsonValue::Array(items.into_iter().map(value_to_json).collect()),
        Value::Map(fields) => JsonValue::Object(
            fields
                .into_iter()
                .map(|(name, value)| (name, value_to_json(value)))
                .collect(),
        ),
    }
}

fn json_type_name(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
