//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB items and entities.
//! These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;

use storekit_core::entity::{Entity, EntityWrite, Fields, Value};
use storekit_core::store::{Result, StoreError};

use super::keys::{self, PARTITION_KEY, SORT_KEY, UNINDEXED_ATTRIBUTE};

pub type Item = HashMap<String, AttributeValue>;

// ============================================================================
// Values
// ============================================================================

/// Convert a property value to an attribute value.
///
/// Doubles are written with a fractional part so they read back as doubles.
pub fn value_to_attribute(value: &Value) -> Result<AttributeValue> {
    Ok(match value {
        Value::Null => AttributeValue::Null(true),
        Value::Boolean(b) => AttributeValue::Bool(*b),
        Value::Integer(i) => AttributeValue::N(i.to_string()),
        Value::Double(d) if d.is_finite() => AttributeValue::N(format!("{d:?}")),
        Value::Double(d) => {
            return Err(StoreError::InvalidArgument(format!(
                "cannot store non-finite number {d}"
            )))
        }
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Blob(bytes) => AttributeValue::B(Blob::new(bytes.clone())),
        Value::Array(items) => AttributeValue::L(
            items
                .iter()
                .map(value_to_attribute)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Map(fields) => AttributeValue::M(fields_to_attributes(fields)?),
    })
}

/// Convert an attribute value to a property value.
pub fn attribute_to_value(attribute: &AttributeValue) -> Result<Value> {
    Ok(match attribute {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Boolean(*b),
        AttributeValue::N(n) => parse_number(n)?,
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::B(blob) => Value::Blob(blob.as_ref().to_vec()),
        AttributeValue::L(items) => Value::Array(
            items
                .iter()
                .map(attribute_to_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        AttributeValue::M(map) => Value::Map(attributes_to_fields(map)?),
        AttributeValue::Ss(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(items) => Value::Array(
            items
                .iter()
                .map(|n| parse_number(n))
                .collect::<Result<Vec<_>>>()?,
        ),
        AttributeValue::Bs(items) => Value::Array(
            items
                .iter()
                .map(|blob| Value::Blob(blob.as_ref().to_vec()))
                .collect(),
        ),
        other => {
            return Err(StoreError::InvalidData(format!(
                "unsupported attribute value: {other:?}"
            )))
        }
    })
}

fn parse_number(n: &str) -> Result<Value> {
    if let Ok(i) = n.parse::<i64>() {
        return Ok(Value::Integer(i));
    }
    n.parse::<f64>()
        .map(Value::Double)
        .map_err(|_| StoreError::InvalidData(format!("invalid number: {n}")))
}

fn fields_to_attributes(fields: &Fields) -> Result<Item> {
    fields
        .iter()
        .map(|(name, value)| Ok((name.clone(), value_to_attribute(value)?)))
        .collect()
}

fn attributes_to_fields(map: &Item) -> Result<Fields> {
    map.iter()
        .map(|(name, attribute)| Ok((name.clone(), attribute_to_value(attribute)?)))
        .collect()
}

// ============================================================================
// Entities
// ============================================================================

/// Convert an entity write to a DynamoDB item.
///
/// Properties listed in `exclude_from_indexes` are nested under
/// `__unindexed__`, out of reach of filter expressions.
pub fn entity_to_item(write: &EntityWrite) -> Result<Item> {
    let mut item = keys::entity_key(write.key())?;
    let mut unindexed = Item::new();

    for (name, value) in &write.entity.data {
        if keys::is_reserved(name) {
            return Err(StoreError::InvalidArgument(format!(
                "property name {name} is reserved"
            )));
        }
        let attribute = value_to_attribute(value)?;
        if write.exclude_from_indexes.iter().any(|field| field == name) {
            unindexed.insert(name.clone(), attribute);
        } else {
            item.insert(name.clone(), attribute);
        }
    }

    if !unindexed.is_empty() {
        item.insert(
            UNINDEXED_ATTRIBUTE.to_string(),
            AttributeValue::M(unindexed),
        );
    }
    Ok(item)
}

/// Convert a DynamoDB item to an entity.
pub fn item_to_entity(item: &Item) -> Result<Entity> {
    let key = keys::native_key(item)?;
    let mut data = Fields::new();

    for (name, attribute) in item {
        match name.as_str() {
            PARTITION_KEY | SORT_KEY => {}
            UNINDEXED_ATTRIBUTE => match attribute {
                AttributeValue::M(map) => data.extend(attributes_to_fields(map)?),
                _ => {
                    return Err(StoreError::InvalidData(format!(
                        "{UNINDEXED_ATTRIBUTE} is not a map"
                    )))
                }
            },
            _ => {
                data.insert(name.clone(), attribute_to_value(attribute)?);
            }
        }
    }

    Ok(Entity::new(key, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use storekit_core::entity::{NativeKey, SaveMethod};

    fn write(exclude_from_indexes: Vec<String>) -> EntityWrite {
        let mut data = Fields::new();
        data.insert("title".to_string(), Value::from("Write docs"));
        data.insert("priority".to_string(), Value::Integer(3));
        data.insert("notes".to_string(), Value::from("long text"));
        EntityWrite {
            entity: Entity::new(NativeKey::new("Task", "AQ=="), data),
            exclude_from_indexes,
            method: SaveMethod::Upsert,
        }
    }

    #[test]
    fn test_numbers_keep_their_type() {
        let integer = value_to_attribute(&Value::Integer(2)).unwrap();
        let double = value_to_attribute(&Value::Double(2.0)).unwrap();

        assert_eq!(integer, AttributeValue::N("2".to_string()));
        assert_eq!(double, AttributeValue::N("2.0".to_string()));
        assert_eq!(attribute_to_value(&integer).unwrap(), Value::Integer(2));
        assert_eq!(attribute_to_value(&double).unwrap(), Value::Double(2.0));
    }

    #[test]
    fn test_non_finite_double_is_rejected() {
        let result = value_to_attribute(&Value::Double(f64::INFINITY));
        assert!(matches!(result, Err(StoreError::InvalidArgument(_))));
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let result = attribute_to_value(&AttributeValue::N("abc".to_string()));
        assert_eq!(
            result,
            Err(StoreError::InvalidData("invalid number: abc".to_string()))
        );
    }

    #[test]
    fn test_nested_values_convert() {
        let mut inner = Fields::new();
        inner.insert("blob".to_string(), Value::Blob(vec![1, 2]));
        inner.insert("none".to_string(), Value::Null);
        let value = Value::Array(vec![Value::Boolean(true), Value::Map(inner)]);

        let attribute = value_to_attribute(&value).unwrap();

        assert_eq!(attribute_to_value(&attribute).unwrap(), value);
    }

    #[test]
    fn test_string_sets_become_arrays() {
        let attribute = AttributeValue::Ss(vec!["a".to_string(), "b".to_string()]);

        assert_eq!(
            attribute_to_value(&attribute).unwrap(),
            Value::Array(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn test_entity_to_item_nests_unindexed_properties() {
        let item = entity_to_item(&write(vec!["notes".to_string()])).unwrap();

        assert_eq!(item.get("PK"), Some(&AttributeValue::S("Task".to_string())));
        assert_eq!(item.get("SK"), Some(&AttributeValue::S("AQ==".to_string())));
        assert_eq!(
            item.get("title"),
            Some(&AttributeValue::S("Write docs".to_string()))
        );
        assert!(!item.contains_key("notes"));
        let Some(AttributeValue::M(unindexed)) = item.get("__unindexed__") else {
            panic!("expected unindexed map in {item:?}");
        };
        assert_eq!(
            unindexed.get("notes"),
            Some(&AttributeValue::S("long text".to_string()))
        );
    }

    #[test]
    fn test_entity_to_item_without_exclusions_has_no_unindexed_map() {
        let item = entity_to_item(&write(Vec::new())).unwrap();
        assert!(!item.contains_key("__unindexed__"));
    }

    #[test]
    fn test_reserved_property_is_rejected() {
        let mut reserved = write(Vec::new());
        reserved
            .entity
            .data
            .insert("PK".to_string(), Value::from("x"));

        assert_eq!(
            entity_to_item(&reserved),
            Err(StoreError::InvalidArgument(
                "property name PK is reserved".to_string()
            ))
        );
    }

    #[test]
    fn test_item_to_entity_restores_entity() {
        let original = write(vec!["notes".to_string()]);

        let entity = item_to_entity(&entity_to_item(&original).unwrap()).unwrap();

        assert_eq!(entity, original.entity);
    }
}
