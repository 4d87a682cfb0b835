//! DynamoDB key layout.
//!
//! Every kind shares one table: the partition key holds the kind and the sort
//! key holds the key name. Id counters live in their own partition.
//! All functions are sync and have no side effects.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use storekit_core::entity::NativeKey;
use storekit_core::store::{Result, StoreError};

// ============================================================================
// Attribute names
// ============================================================================

pub const PARTITION_KEY: &str = "PK";
pub const SORT_KEY: &str = "SK";

/// Map attribute holding the properties excluded from indexes.
pub const UNINDEXED_ATTRIBUTE: &str = "__unindexed__";

/// Partition holding one id counter item per kind.
pub const COUNTER_PARTITION: &str = "__counter__";
pub const COUNTER_ATTRIBUTE: &str = "next_id";

/// Whether `name` is managed by the store and cannot be used as a property.
pub fn is_reserved(name: &str) -> bool {
    name == PARTITION_KEY || name == SORT_KEY || name == UNINDEXED_ATTRIBUTE
}

pub fn check_kind(kind: &str) -> Result<()> {
    if kind == COUNTER_PARTITION {
        return Err(StoreError::InvalidArgument(format!(
            "kind {COUNTER_PARTITION} is reserved"
        )));
    }
    Ok(())
}

// ============================================================================
// Keys
// ============================================================================

/// Primary key of the item storing `key`.
pub fn entity_key(key: &NativeKey) -> Result<HashMap<String, AttributeValue>> {
    check_kind(&key.kind)?;
    let name = key.name.as_ref().ok_or_else(|| {
        StoreError::InvalidArgument(format!("incomplete key for kind {}", key.kind))
    })?;
    Ok(HashMap::from([
        (PARTITION_KEY.to_string(), AttributeValue::S(key.kind.clone())),
        (SORT_KEY.to_string(), AttributeValue::S(name.clone())),
    ]))
}

/// Primary key of the id counter for `kind`.
pub fn counter_key(kind: &str) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (
            PARTITION_KEY.to_string(),
            AttributeValue::S(COUNTER_PARTITION.to_string()),
        ),
        (SORT_KEY.to_string(), AttributeValue::S(kind.to_string())),
    ])
}

/// Reads the native key back from an item's primary key attributes.
pub fn native_key(item: &HashMap<String, AttributeValue>) -> Result<NativeKey> {
    Ok(NativeKey::new(
        key_string(item, PARTITION_KEY)?,
        key_string(item, SORT_KEY)?,
    ))
}

fn key_string(item: &HashMap<String, AttributeValue>, attribute: &str) -> Result<String> {
    match item.get(attribute) {
        Some(AttributeValue::S(value)) => Ok(value.clone()),
        Some(_) => Err(StoreError::InvalidData(format!(
            "{attribute} is not a string"
        ))),
        None => Err(StoreError::InvalidData(format!("item missing {attribute}"))),
    }
}
