use storekit_core::entity::SaveMethod;
use storekit_core::model::{ModelDescriptor, QueryDescriptor};
use storekit_core::store::{Result, TransactionRequest};

use crate::operations::{self, QueryResult};

/// Typed operations scoped to one store transaction.
///
/// Reads observe the transaction's snapshot. Writes are buffered and only
/// become visible once [`commit`](Self::commit) succeeds; dropping the handle
/// without committing discards them.
pub struct DatastoreTransaction<X: TransactionRequest> {
    transaction: X,
}

impl<X: TransactionRequest> DatastoreTransaction<X> {
    pub(crate) fn new(transaction: X) -> Self {
        Self { transaction }
    }

    /// Store-assigned transaction id.
    pub fn id(&self) -> &str {
        self.transaction.id()
    }

    /// Sets the identity field of each value to a freshly allocated id.
    pub async fn allocate_keys<T>(
        &self,
        values: &mut [T],
        descriptor: &ModelDescriptor<T>,
    ) -> Result<()> {
        operations::allocate_keys(&self.transaction, values, descriptor).await
    }

    pub async fn get<T, K: AsRef<str>>(
        &self,
        keys: &[K],
        descriptor: &ModelDescriptor<T>,
    ) -> Result<Vec<T>> {
        operations::get_values_by_keys(&self.transaction, keys, descriptor).await
    }

    pub async fn delete<T, K: AsRef<str>>(
        &self,
        keys: &[K],
        descriptor: &ModelDescriptor<T>,
    ) -> Result<()> {
        operations::delete_by_keys(&self.transaction, keys, descriptor).await
    }

    pub async fn save<T>(
        &self,
        values: &[T],
        descriptor: &ModelDescriptor<T>,
        method: SaveMethod,
    ) -> Result<()> {
        operations::save_values(&self.transaction, values, descriptor, method).await
    }

    pub async fn query<T>(
        &self,
        query: &QueryDescriptor,
        descriptor: &ModelDescriptor<T>,
    ) -> Result<QueryResult<T>> {
        operations::query_values(&self.transaction, query, descriptor).await
    }

    /// Applies every buffered write atomically.
    pub async fn commit(self) -> Result<()> {
        let id = self.transaction.id().to_string();
        self.transaction.commit().await?;
        tracing::info!(transaction = %id, "Committed transaction");
        Ok(())
    }

    /// Discards every buffered write.
    pub async fn rollback(self) -> Result<()> {
        let id = self.transaction.id().to_string();
        self.transaction.rollback().await?;
        tracing::info!(transaction = %id, "Rolled back transaction");
        Ok(())
    }
}
