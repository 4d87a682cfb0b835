use storekit_core::entity::SaveMethod;
use storekit_core::model::{ModelDescriptor, QueryDescriptor};
use storekit_core::store::{Backend, Result, TransactionRequest};

use crate::operations::{self, QueryResult};
use crate::transaction::DatastoreTransaction;

/// Typed client over a store [`Backend`].
///
/// Every operation issues exactly one store request and returns store errors
/// unchanged.
#[derive(Debug, Clone)]
pub struct DatastoreClient<B: Backend> {
    backend: B,
}

impl<B: Backend> DatastoreClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Begins a store transaction.
    pub async fn start_transaction(&self) -> Result<DatastoreTransaction<B::Transaction>> {
        let transaction = self.backend.begin_transaction().await?;
        tracing::debug!(transaction = %transaction.id(), "Started transaction");
        Ok(DatastoreTransaction::new(transaction))
    }

    /// Sets the identity field of each value to a freshly allocated id,
    /// in input order.
    pub async fn allocate_keys<T>(
        &self,
        values: &mut [T],
        descriptor: &ModelDescriptor<T>,
    ) -> Result<()> {
        operations::allocate_keys(&self.backend, values, descriptor).await
    }

    /// Fetches the records with the given identities. Missing identities are
    /// skipped.
    pub async fn get<T, K: AsRef<str>>(
        &self,
        keys: &[K],
        descriptor: &ModelDescriptor<T>,
    ) -> Result<Vec<T>> {
        operations::get_values_by_keys(&self.backend, keys, descriptor).await
    }

    pub async fn delete<T, K: AsRef<str>>(
        &self,
        keys: &[K],
        descriptor: &ModelDescriptor<T>,
    ) -> Result<()> {
        operations::delete_by_keys(&self.backend, keys, descriptor).await
    }

    /// Writes every value in one atomic batch.
    pub async fn save<T>(
        &self,
        values: &[T],
        descriptor: &ModelDescriptor<T>,
        method: SaveMethod,
    ) -> Result<()> {
        operations::save_values(&self.backend, values, descriptor, method).await
    }

    pub async fn query<T>(
        &self,
        query: &QueryDescriptor,
        descriptor: &ModelDescriptor<T>,
    ) -> Result<QueryResult<T>> {
        operations::query_values(&self.backend, query, descriptor).await
    }
}

#[cfg(feature = "inmemory")]
impl DatastoreClient<crate::storage::InMemoryStore> {
    /// Client over a fresh in-memory store configured from the environment.
    pub fn in_memory() -> Self {
        let config = crate::Config::from_env();
        Self::new(crate::storage::InMemoryStore::from_config(&config))
    }
}

#[cfg(feature = "dynamodb")]
impl DatastoreClient<crate::storage::DynamoDbStore> {
    /// Client over the DynamoDB table configured from the environment.
    pub async fn from_env() -> Result<Self> {
        let config = crate::Config::from_env();
        Ok(Self::new(
            crate::storage::DynamoDbStore::from_config(&config).await,
        ))
    }
}
