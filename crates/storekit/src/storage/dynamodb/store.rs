//! DynamoDB store implementation.
//!
//! Implements the store traits from `storekit_core::store` on a single table.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes, ReturnValue};
use aws_sdk_dynamodb::Client;

use storekit_core::entity::{Entity, EntityWrite, NativeKey};
use storekit_core::store::{
    Backend, MoreResults, Query, QueryInfo, QueryResponse, Result, StoreError, StoreRequest,
};

use crate::config::Config;

use super::conversions::item_to_entity;
use super::cursor::{decode_cursor, encode_cursor};
use super::error::{
    map_batch_get_item_error, map_build_error, map_query_error, map_transact_write_items_error,
    map_update_item_error,
};
use super::expressions::build_query_expression;
use super::keys::{self, COUNTER_ATTRIBUTE};
use super::transaction::DynamoDbTransaction;
use super::writes::PendingWrite;

/// DynamoDB store backend.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl DynamoDbStore {
    /// Creates a store over `table_name` using the given DynamoDB client.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Creates a store from configuration.
    ///
    /// Uses the AWS SDK default credential chain with the configured region
    /// and, when set, a custom endpoint such as a local DynamoDB.
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()));

        if let Some(endpoint) = &config.aws_endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config), &config.dynamodb_table_name)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub(super) fn client(&self) -> &Client {
        &self.client
    }

    /// Sends `writes` as one all-or-nothing `TransactWriteItems` request.
    pub(super) async fn execute_writes(
        &self,
        writes: &[PendingWrite],
        client_request_token: Option<String>,
    ) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }

        let items = writes
            .iter()
            .map(|write| write.to_transact_item(&self.table_name))
            .collect::<Result<Vec<_>>>()?;

        self.client
            .transact_write_items()
            .set_transact_items(Some(items))
            .set_client_request_token(client_request_token)
            .send()
            .await
            .map_err(|e| map_transact_write_items_error(e, writes))?;

        Ok(())
    }
}

/// Removes repeated keys, keeping the first occurrence.
pub(super) fn unique_keys(keys: Vec<NativeKey>) -> Vec<NativeKey> {
    let mut unique = Vec::with_capacity(keys.len());
    for key in keys {
        if !unique.contains(&key) {
            unique.push(key);
        }
    }
    unique
}

/// Orders fetched entities like the requested keys.
pub(super) fn in_key_order(keys: &[NativeKey], entities: Vec<Entity>) -> Vec<Entity> {
    let mut by_key: HashMap<NativeKey, Entity> = entities
        .into_iter()
        .map(|entity| (entity.key.clone(), entity))
        .collect();
    keys.iter().filter_map(|key| by_key.remove(key)).collect()
}

/// Ids handed out by an `ADD` of `count` that moved the counter to `next_id`.
fn allocated_range(next_id: i64, count: usize) -> Result<Vec<i64>> {
    let count = i64::try_from(count)
        .map_err(|_| StoreError::InvalidArgument(format!("cannot allocate {count} ids")))?;
    Ok((next_id - count + 1..=next_id).collect())
}

#[async_trait]
impl StoreRequest for DynamoDbStore {
    async fn allocate_ids(&self, kind: &str, count: usize) -> Result<Vec<i64>> {
        keys::check_kind(kind)?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(keys::counter_key(kind)))
            .update_expression("ADD #next :count")
            .expression_attribute_names("#next", COUNTER_ATTRIBUTE)
            .expression_attribute_values(":count", AttributeValue::N(count.to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(map_update_item_error)?;

        let next_id = match result
            .attributes
            .as_ref()
            .and_then(|attributes| attributes.get(COUNTER_ATTRIBUTE))
        {
            Some(AttributeValue::N(n)) => n
                .parse::<i64>()
                .map_err(|_| StoreError::InvalidData(format!("invalid id counter: {n}")))?,
            _ => {
                return Err(StoreError::InvalidData(format!(
                    "id counter for {kind} missing from response"
                )))
            }
        };

        allocated_range(next_id, count)
    }

    async fn get(&self, keys: Vec<NativeKey>) -> Result<Vec<Entity>> {
        let keys = unique_keys(keys);
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let request = KeysAndAttributes::builder()
            .set_keys(Some(
                keys.iter()
                    .map(keys::entity_key)
                    .collect::<Result<Vec<_>>>()?,
            ))
            .consistent_read(true)
            .build()
            .map_err(map_build_error)?;

        let result = self
            .client
            .batch_get_item()
            .request_items(&self.table_name, request)
            .send()
            .await
            .map_err(map_batch_get_item_error)?;

        let unprocessed = result
            .unprocessed_keys
            .as_ref()
            .and_then(|unprocessed| unprocessed.get(&self.table_name))
            .map_or(0, |request| request.keys().len());
        if unprocessed > 0 {
            tracing::warn!(table = %self.table_name, unprocessed, "BatchGetItem left keys unprocessed");
            return Err(StoreError::QueryFailed(format!(
                "{unprocessed} keys were not processed, please retry"
            )));
        }

        let entities = result
            .responses
            .and_then(|mut responses| responses.remove(&self.table_name))
            .unwrap_or_default()
            .iter()
            .map(item_to_entity)
            .collect::<Result<Vec<_>>>()?;

        Ok(in_key_order(&keys, entities))
    }

    async fn delete(&self, keys: Vec<NativeKey>) -> Result<()> {
        let writes = keys
            .into_iter()
            .map(PendingWrite::delete)
            .collect::<Result<Vec<_>>>()?;
        self.execute_writes(&writes, None).await
    }

    async fn save(&self, writes: Vec<EntityWrite>) -> Result<()> {
        let writes = writes
            .iter()
            .map(PendingWrite::save)
            .collect::<Result<Vec<_>>>()?;
        self.execute_writes(&writes, None).await
    }

    async fn run_query(&self, query: Query) -> Result<QueryResponse> {
        let expression = build_query_expression(&query)?;
        let start_key = query.start_cursor().map(decode_cursor).transpose()?;
        let limit = match query.limit_value() {
            Some(0) => {
                return Err(StoreError::InvalidArgument(
                    "query limit must be at least 1".to_string(),
                ))
            }
            Some(limit) => Some(i32::try_from(limit).unwrap_or(i32::MAX)),
            None => None,
        };

        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression(expression.key_condition)
            .set_filter_expression(expression.filter)
            .set_expression_attribute_names(Some(expression.names))
            .set_expression_attribute_values(Some(expression.values))
            .scan_index_forward(expression.scan_forward)
            .set_limit(limit)
            .set_exclusive_start_key(start_key)
            .consistent_read(true)
            .send()
            .await
            .map_err(map_query_error)?;

        let entities = result
            .items
            .unwrap_or_default()
            .iter()
            .map(item_to_entity)
            .collect::<Result<Vec<_>>>()?;

        let info = match &result.last_evaluated_key {
            Some(last_key) => QueryInfo {
                end_cursor: Some(encode_cursor(last_key)?),
                more_results: if limit.is_some() {
                    MoreResults::MoreResultsAfterLimit
                } else {
                    MoreResults::NotFinished
                },
            },
            None => QueryInfo {
                end_cursor: None,
                more_results: MoreResults::NoMoreResults,
            },
        };

        Ok(QueryResponse { entities, info })
    }
}

#[async_trait]
impl Backend for DynamoDbStore {
    type Transaction = DynamoDbTransaction;

    async fn begin_transaction(&self) -> Result<DynamoDbTransaction> {
        Ok(DynamoDbTransaction::new(self.clone()))
    }
}
