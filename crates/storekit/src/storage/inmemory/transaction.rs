use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use storekit_core::entity::{Entity, EntityWrite, NativeKey};
use storekit_core::store::{Query, QueryResponse, Result, StoreRequest, TransactionRequest};

use super::query;
use super::store::{InMemoryStore, Mutation};

/// Optimistic transaction over an [`InMemoryStore`].
///
/// Reads see committed state and remember the version of every entity they
/// return (or its absence). Writes are buffered until commit, which fails
/// with `Aborted` if any remembered entity changed in the meantime.
pub struct InMemoryTransaction {
    store: InMemoryStore,
    id: String,
    reads: Mutex<HashMap<NativeKey, Option<u64>>>,
    mutations: Mutex<Vec<Mutation>>,
}

impl InMemoryTransaction {
    pub(super) fn new(store: InMemoryStore) -> Self {
        Self {
            store,
            id: Uuid::new_v4().to_string(),
            reads: Mutex::new(HashMap::new()),
            mutations: Mutex::new(Vec::new()),
        }
    }

    async fn record_reads<'a>(
        &self,
        observed: impl IntoIterator<Item = (&'a NativeKey, Option<u64>)>,
    ) {
        let mut reads = self.reads.lock().await;
        for (key, version) in observed {
            reads.entry(key.clone()).or_insert(version);
        }
    }

    async fn buffer(&self, writes: impl IntoIterator<Item = Mutation>) {
        self.mutations.lock().await.extend(writes);
    }
}

#[async_trait]
impl StoreRequest for InMemoryTransaction {
    async fn allocate_ids(&self, kind: &str, count: usize) -> Result<Vec<i64>> {
        self.store.allocate_ids(kind, count).await
    }

    async fn get(&self, keys: Vec<NativeKey>) -> Result<Vec<Entity>> {
        self.store.check_batch("get", keys.len())?;
        let (entities, observed) = {
            let state = self.store.read_state().await;
            let observed: Vec<_> = keys.iter().map(|key| state.version_of(key)).collect();
            (state.lookup(&keys), observed)
        };
        self.record_reads(keys.iter().zip(observed)).await;
        Ok(entities)
    }

    async fn delete(&self, keys: Vec<NativeKey>) -> Result<()> {
        self.store.check_batch("delete", keys.len())?;
        self.buffer(keys.into_iter().map(Mutation::Delete)).await;
        Ok(())
    }

    async fn save(&self, writes: Vec<EntityWrite>) -> Result<()> {
        self.store.check_batch("save", writes.len())?;
        self.buffer(writes.into_iter().map(Mutation::Save)).await;
        Ok(())
    }

    async fn run_query(&self, query: Query) -> Result<QueryResponse> {
        let (response, observed) = {
            let state = self.store.read_state().await;
            let response = query::execute(&state, &query)?;
            let observed: Vec<_> = response
                .entities
                .iter()
                .map(|entity| state.version_of(&entity.key))
                .collect();
            (response, observed)
        };
        self.record_reads(
            response
                .entities
                .iter()
                .map(|entity| &entity.key)
                .zip(observed),
        )
        .await;
        Ok(response)
    }
}

#[async_trait]
impl TransactionRequest for InMemoryTransaction {
    fn id(&self) -> &str {
        &self.id
    }

    async fn commit(self) -> Result<()> {
        let reads = self.reads.into_inner();
        let mutations = self.mutations.into_inner();
        self.store.commit_mutations(&reads, mutations).await
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storekit_core::entity::{Fields, SaveMethod, Value};
    use storekit_core::store::{Backend, StoreError};

    fn write(name: &str, title: &str, method: SaveMethod) -> EntityWrite {
        let mut data = Fields::new();
        data.insert("title".to_string(), Value::from(title));
        EntityWrite {
            entity: Entity::new(NativeKey::new("Task", name), data),
            exclude_from_indexes: Vec::new(),
            method,
        }
    }

    fn key(name: &str) -> NativeKey {
        NativeKey::new("Task", name)
    }

    #[tokio::test]
    async fn test_writes_are_invisible_until_commit() {
        let store = InMemoryStore::new();
        let tx = store.begin_transaction().await.unwrap();

        tx.save(vec![write("a", "draft", SaveMethod::Insert)])
            .await
            .unwrap();
        assert!(store.get(vec![key("a")]).await.unwrap().is_empty());
        assert!(tx.get(vec![key("a")]).await.unwrap().is_empty());

        tx.commit().await.unwrap();
        assert_eq!(store.get(vec![key("a")]).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_buffered_delete_applies_on_commit() {
        let store = InMemoryStore::new();
        store
            .save(vec![
                write("a", "v1", SaveMethod::Insert),
                write("b", "v1", SaveMethod::Insert),
            ])
            .await
            .unwrap();

        let tx = store.begin_transaction().await.unwrap();
        tx.delete(vec![key("a")]).await.unwrap();
        assert_eq!(store.count("Task").await, 2);

        tx.commit().await.unwrap();
        assert!(store.get(vec![key("a")]).await.unwrap().is_empty());
        assert_eq!(store.count("Task").await, 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = InMemoryStore::new();
        let tx = store.begin_transaction().await.unwrap();

        tx.save(vec![write("a", "draft", SaveMethod::Insert)])
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.count("Task").await, 0);
    }

    #[tokio::test]
    async fn test_conflicting_write_aborts_commit() {
        let store = InMemoryStore::new();
        store
            .save(vec![write("a", "v1", SaveMethod::Insert)])
            .await
            .unwrap();

        let tx = store.begin_transaction().await.unwrap();
        tx.get(vec![key("a")]).await.unwrap();
        store
            .save(vec![write("a", "v2", SaveMethod::Update)])
            .await
            .unwrap();
        tx.save(vec![write("a", "v3", SaveMethod::Update)])
            .await
            .unwrap();

        let result = tx.commit().await;

        assert!(matches!(result, Err(StoreError::Aborted(_))));
        let stored = store.get(vec![key("a")]).await.unwrap();
        assert_eq!(stored[0].data.get("title"), Some(&Value::from("v2")));
    }

    #[tokio::test]
    async fn test_read_of_missing_key_conflicts_with_later_insert() {
        let store = InMemoryStore::new();
        let tx = store.begin_transaction().await.unwrap();
        tx.get(vec![key("a")]).await.unwrap();

        store
            .save(vec![write("a", "other", SaveMethod::Insert)])
            .await
            .unwrap();
        tx.save(vec![write("a", "mine", SaveMethod::Upsert)])
            .await
            .unwrap();

        assert!(matches!(tx.commit().await, Err(StoreError::Aborted(_))));
    }

    #[tokio::test]
    async fn test_query_reads_are_tracked() {
        let store = InMemoryStore::new();
        store
            .save(vec![write("a", "v1", SaveMethod::Insert)])
            .await
            .unwrap();

        let tx = store.begin_transaction().await.unwrap();
        let response = tx.run_query(Query::new("Task")).await.unwrap();
        assert_eq!(response.entities.len(), 1);

        store.delete(vec![key("a")]).await.unwrap();

        assert!(matches!(tx.commit().await, Err(StoreError::Aborted(_))));
    }

    #[tokio::test]
    async fn test_commit_checks_write_preconditions() {
        let store = InMemoryStore::new();
        let tx = store.begin_transaction().await.unwrap();
        tx.save(vec![write("a", "mine", SaveMethod::Update)])
            .await
            .unwrap();

        let result = tx.commit().await;

        assert_eq!(
            result,
            Err(StoreError::NotFound {
                kind: "Task".to_string(),
                name: "a".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_transactions_have_distinct_ids() {
        let store = InMemoryStore::new();
        let first = store.begin_transaction().await.unwrap();
        let second = store.begin_transaction().await.unwrap();

        assert_ne!(first.id(), second.id());
    }
}
