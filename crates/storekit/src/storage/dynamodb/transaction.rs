use async_trait::async_trait;
use aws_sdk_dynamodb::types::{Get, TransactGetItem};
use tokio::sync::Mutex;
use uuid::Uuid;

use storekit_core::entity::{Entity, EntityWrite, NativeKey};
use storekit_core::store::{Query, QueryResponse, Result, StoreRequest, TransactionRequest};

use super::conversions::item_to_entity;
use super::error::{map_build_error, map_transact_get_items_error};
use super::keys;
use super::store::{in_key_order, unique_keys, DynamoDbStore};
use super::writes::PendingWrite;

/// Transaction over a [`DynamoDbStore`].
///
/// Reads are served by `TransactGetItems`, which returns a consistent
/// snapshot of the requested items. Writes are buffered and sent in a single
/// `TransactWriteItems` call on commit, using the transaction id as the
/// idempotency token. Queries read committed data directly.
pub struct DynamoDbTransaction {
    store: DynamoDbStore,
    id: String,
    writes: Mutex<Vec<PendingWrite>>,
}

impl DynamoDbTransaction {
    pub(super) fn new(store: DynamoDbStore) -> Self {
        Self {
            store,
            id: Uuid::new_v4().to_string(),
            writes: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StoreRequest for DynamoDbTransaction {
    async fn allocate_ids(&self, kind: &str, count: usize) -> Result<Vec<i64>> {
        self.store.allocate_ids(kind, count).await
    }

    async fn get(&self, keys: Vec<NativeKey>) -> Result<Vec<Entity>> {
        let keys = unique_keys(keys);
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let items = keys
            .iter()
            .map(|key| -> Result<TransactGetItem> {
                let get = Get::builder()
                    .table_name(self.store.table_name())
                    .set_key(Some(keys::entity_key(key)?))
                    .build()
                    .map_err(map_build_error)?;
                Ok(TransactGetItem::builder().get(get).build())
            })
            .collect::<Result<Vec<_>>>()?;

        let result = self
            .store
            .client()
            .transact_get_items()
            .set_transact_items(Some(items))
            .send()
            .await
            .map_err(map_transact_get_items_error)?;

        let entities = result
            .responses
            .unwrap_or_default()
            .iter()
            .filter_map(|response| response.item.as_ref())
            .map(item_to_entity)
            .collect::<Result<Vec<_>>>()?;

        Ok(in_key_order(&keys, entities))
    }

    async fn delete(&self, keys: Vec<NativeKey>) -> Result<()> {
        let deletes = keys
            .into_iter()
            .map(PendingWrite::delete)
            .collect::<Result<Vec<_>>>()?;
        self.writes.lock().await.extend(deletes);
        Ok(())
    }

    async fn save(&self, writes: Vec<EntityWrite>) -> Result<()> {
        let puts = writes
            .iter()
            .map(PendingWrite::save)
            .collect::<Result<Vec<_>>>()?;
        self.writes.lock().await.extend(puts);
        Ok(())
    }

    async fn run_query(&self, query: Query) -> Result<QueryResponse> {
        self.store.run_query(query).await
    }
}

#[async_trait]
impl TransactionRequest for DynamoDbTransaction {
    fn id(&self) -> &str {
        &self.id
    }

    async fn commit(self) -> Result<()> {
        let writes = self.writes.into_inner();
        tracing::debug!(transaction = %self.id, count = writes.len(), "Sending transaction writes");
        self.store.execute_writes(&writes, Some(self.id)).await
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
