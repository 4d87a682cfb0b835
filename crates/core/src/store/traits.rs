use async_trait::async_trait;

use crate::entity::{Entity, EntityWrite, NativeKey};

use super::{Query, QueryResponse, Result};

/// Request surface shared by a plain store connection and an active transaction.
#[async_trait]
pub trait StoreRequest: Send + Sync {
    /// Reserves `count` fresh numeric ids for a kind.
    async fn allocate_ids(&self, kind: &str, count: usize) -> Result<Vec<i64>>;

    /// Fetches entities by key. Missing keys are omitted from the result.
    async fn get(&self, keys: Vec<NativeKey>) -> Result<Vec<Entity>>;

    /// Deletes entities by key. Missing keys are ignored.
    async fn delete(&self, keys: Vec<NativeKey>) -> Result<()>;

    /// Writes a batch of entities; the batch lands entirely or not at all.
    async fn save(&self, writes: Vec<EntityWrite>) -> Result<()>;

    /// Runs a query and returns one batch of results.
    async fn run_query(&self, query: Query) -> Result<QueryResponse>;
}

/// An active transaction. Committing or rolling back consumes it.
#[async_trait]
pub trait TransactionRequest: StoreRequest {
    /// Identifier of the transaction, used in logs.
    fn id(&self) -> &str;

    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

/// A store connection that can start transactions.
#[async_trait]
pub trait Backend: StoreRequest {
    type Transaction: TransactionRequest;

    async fn begin_transaction(&self) -> Result<Self::Transaction>;
}
