//! Query cursors.
//!
//! A cursor is the `LastEvaluatedKey` of a query page, serialized as a JSON
//! object of its string attributes and encoded as base64.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{Map, Value as JsonValue};

use storekit_core::store::{Result, StoreError};

use super::keys::{PARTITION_KEY, SORT_KEY};

pub fn encode_cursor(last_evaluated_key: &HashMap<String, AttributeValue>) -> Result<String> {
    let object = last_evaluated_key
        .iter()
        .map(|(name, attribute)| match attribute {
            AttributeValue::S(value) => Ok((name.clone(), JsonValue::String(value.clone()))),
            other => Err(StoreError::InvalidData(format!(
                "unexpected key attribute {name}: {other:?}"
            ))),
        })
        .collect::<Result<Map<String, JsonValue>>>()?;

    let json = serde_json::to_vec(&JsonValue::Object(object))
        .map_err(|e| StoreError::InvalidData(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

pub fn decode_cursor(cursor: &str) -> Result<HashMap<String, AttributeValue>> {
    let invalid = || StoreError::InvalidArgument(format!("invalid cursor: {cursor}"));

    let bytes = URL_SAFE_NO_PAD.decode(cursor).map_err(|_| invalid())?;
    let object: Map<String, JsonValue> = serde_json::from_slice(&bytes).map_err(|_| invalid())?;

    let key: HashMap<String, AttributeValue> = object
        .into_iter()
        .map(|(name, value)| match value {
            JsonValue::String(s) => Ok((name, AttributeValue::S(s))),
            _ => Err(invalid()),
        })
        .collect::<Result<_>>()?;

    if !key.contains_key(PARTITION_KEY) || !key.contains_key(SORT_KEY) {
        return Err(invalid());
    }
    Ok(key)
}
