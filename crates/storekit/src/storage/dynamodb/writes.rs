//! Buffered writes and their `TransactWriteItems` form.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::{Delete, Put, TransactWriteItem};

use storekit_core::entity::{EntityWrite, NativeKey, SaveMethod};
use storekit_core::store::Result;

use super::conversions::{entity_to_item, Item};
use super::error::map_build_error;
use super::keys::{self, PARTITION_KEY};

/// One item of a `TransactWriteItems` request.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    Put {
        key: NativeKey,
        method: SaveMethod,
        item: Item,
    },
    Delete {
        key: NativeKey,
        item_key: Item,
    },
}

impl PendingWrite {
    pub fn save(write: &EntityWrite) -> Result<Self> {
        Ok(PendingWrite::Put {
            key: write.key().clone(),
            method: write.method,
            item: entity_to_item(write)?,
        })
    }

    pub fn delete(key: NativeKey) -> Result<Self> {
        let item_key = keys::entity_key(&key)?;
        Ok(PendingWrite::Delete { key, item_key })
    }

    pub fn key(&self) -> &NativeKey {
        match self {
            PendingWrite::Put { key, .. } | PendingWrite::Delete { key, .. } => key,
        }
    }

    /// Existence check guarding the write, if any.
    pub fn condition(&self) -> Option<&'static str> {
        match self {
            PendingWrite::Put {
                method: SaveMethod::Insert,
                ..
            } => Some("attribute_not_exists(#pk)"),
            PendingWrite::Put {
                method: SaveMethod::Update,
                ..
            } => Some("attribute_exists(#pk)"),
            _ => None,
        }
    }

    pub fn to_transact_item(&self, table_name: &str) -> Result<TransactWriteItem> {
        let names = self
            .condition()
            .map(|_| HashMap::from([("#pk".to_string(), PARTITION_KEY.to_string())]));

        let transact_item = match self {
            PendingWrite::Put { item, .. } => TransactWriteItem::builder()
                .put(
                    Put::builder()
                        .table_name(table_name)
                        .set_item(Some(item.clone()))
                        .set_condition_expression(self.condition().map(str::to_string))
                        .set_expression_attribute_names(names)
                        .build()
                        .map_err(map_build_error)?,
                )
                .build(),
            PendingWrite::Delete { item_key, .. } => TransactWriteItem::builder()
                .delete(
                    Delete::builder()
                        .table_name(table_name)
                        .set_key(Some(item_key.clone()))
                        .build()
                        .map_err(map_build_error)?,
                )
                .build(),
        };
        Ok(transact_item)
    }
}
