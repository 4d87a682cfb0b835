//! In-memory store implementation.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use storekit_core::entity::{Entity, EntityWrite, Fields, NativeKey, SaveMethod};
use storekit_core::store::{Backend, Query, QueryResponse, Result, StoreError, StoreRequest};

use crate::config::Config;

use super::query;
use super::transaction::InMemoryTransaction;

const DEFAULT_FIRST_ID: i64 = 1;
const DEFAULT_MAX_BATCH_SIZE: usize = 500;

/// A committed entity and the store version that last wrote it.
#[derive(Debug, Clone)]
pub(super) struct StoredEntity {
    pub(super) data: Fields,
    pub(super) unindexed: BTreeSet<String>,
    pub(super) version: u64,
}

impl StoredEntity {
    pub(super) fn to_entity(&self, key: &NativeKey) -> Entity {
        Entity::new(key.clone(), self.data.clone())
    }
}

/// A write waiting to be applied.
#[derive(Debug, Clone)]
pub(super) enum Mutation {
    Save(EntityWrite),
    Delete(NativeKey),
}

impl Mutation {
    fn key(&self) -> &NativeKey {
        match self {
            Mutation::Save(write) => write.key(),
            Mutation::Delete(key) => key,
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct State {
    pub(super) entities: BTreeMap<NativeKey, StoredEntity>,
    next_ids: HashMap<String, i64>,
    version: u64,
}

impl State {
    fn allocate(&mut self, kind: &str, count: usize, first_id: i64) -> Result<Vec<i64>> {
        let start = *self.next_ids.get(kind).unwrap_or(&first_id);
        let end = i64::try_from(count)
            .ok()
            .and_then(|count| start.checked_add(count))
            .ok_or_else(|| {
                StoreError::InvalidArgument(format!("id space exhausted for kind {kind}"))
            })?;
        self.next_ids.insert(kind.to_string(), end);
        Ok((start..end).collect())
    }

    pub(super) fn lookup(&self, keys: &[NativeKey]) -> Vec<Entity> {
        keys.iter()
            .filter_map(|key| self.entities.get(key).map(|stored| stored.to_entity(key)))
            .collect()
    }

    pub(super) fn version_of(&self, key: &NativeKey) -> Option<u64> {
        self.entities.get(key).map(|stored| stored.version)
    }

    /// Validates every mutation against the current state, then applies them
    /// all under a single new version. Nothing is written if any check fails.
    pub(super) fn apply(&mut self, mutations: Vec<Mutation>) -> Result<()> {
        let mut present: HashMap<&NativeKey, bool> = HashMap::new();
        for mutation in &mutations {
            let key = mutation.key();
            let name = key.name.as_deref().ok_or_else(|| {
                StoreError::InvalidArgument(format!("incomplete key for kind {}", key.kind))
            })?;
            let exists = present
                .get(key)
                .copied()
                .unwrap_or_else(|| self.entities.contains_key(key));

            if let Mutation::Save(write) = mutation {
                match write.method {
                    SaveMethod::Insert if exists => {
                        return Err(StoreError::AlreadyExists {
                            kind: key.kind.clone(),
                            name: name.to_string(),
                        })
                    }
                    SaveMethod::Update if !exists => {
                        return Err(StoreError::NotFound {
                            kind: key.kind.clone(),
                            name: name.to_string(),
                        })
                    }
                    _ => {}
                }
            }
            present.insert(key, matches!(mutation, Mutation::Save(_)));
        }

        self.version += 1;
        let version = self.version;
        for mutation in mutations {
            match mutation {
                Mutation::Save(write) => {
                    let EntityWrite {
                        entity,
                        exclude_from_indexes,
                        ..
                    } = write;
                    self.entities.insert(
                        entity.key,
                        StoredEntity {
                            data: entity.data,
                            unindexed: exclude_from_indexes.into_iter().collect(),
                            version,
                        },
                    );
                }
                Mutation::Delete(key) => {
                    self.entities.remove(&key);
                }
            }
        }
        Ok(())
    }
}

/// In-memory store backend.
///
/// Clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    first_id: i64,
    max_batch_size: usize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store allocating ids from 1 with a batch limit of 500.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            first_id: DEFAULT_FIRST_ID,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_first_id(config.first_id)
            .with_max_batch_size(config.max_batch_size)
    }

    /// Sets the first id allocated for each kind.
    pub fn with_first_id(mut self, first_id: i64) -> Self {
        self.first_id = first_id;
        self
    }

    /// Sets the largest number of keys or writes a single request may carry.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Number of committed entities of `kind`.
    pub async fn count(&self, kind: &str) -> usize {
        let state = self.state.read().await;
        state.entities.keys().filter(|key| key.kind == kind).count()
    }

    pub(super) fn check_batch(&self, operation: &str, size: usize) -> Result<()> {
        if size > self.max_batch_size {
            tracing::warn!(
                operation,
                size,
                max_batch_size = self.max_batch_size,
                "Rejected oversized batch"
            );
            return Err(StoreError::InvalidArgument(format!(
                "{operation} batch of {size} exceeds the limit of {}",
                self.max_batch_size
            )));
        }
        Ok(())
    }

    pub(super) async fn read_state(&self) -> tokio::sync::RwLockReadGuard<'_, State> {
        self.state.read().await
    }

    /// Applies `mutations` if every entity in `reads` still has the recorded
    /// version.
    pub(super) async fn commit_mutations(
        &self,
        reads: &HashMap<NativeKey, Option<u64>>,
        mutations: Vec<Mutation>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(key) = reads
            .iter()
            .find_map(|(key, version)| (state.version_of(key) != *version).then_some(key))
        {
            return Err(StoreError::Aborted(format!(
                "{key} was modified by another writer"
            )));
        }
        state.apply(mutations)
    }
}

#[async_trait]
impl StoreRequest for InMemoryStore {
    async fn allocate_ids(&self, kind: &str, count: usize) -> Result<Vec<i64>> {
        self.check_batch("allocate", count)?;
        let mut state = self.state.write().await;
        state.allocate(kind, count, self.first_id)
    }

    async fn get(&self, keys: Vec<NativeKey>) -> Result<Vec<Entity>> {
        self.check_batch("get", keys.len())?;
        let state = self.state.read().await;
        Ok(state.lookup(&keys))
    }

    async fn delete(&self, keys: Vec<NativeKey>) -> Result<()> {
        self.check_batch("delete", keys.len())?;
        let mut state = self.state.write().await;
        state.apply(keys.into_iter().map(Mutation::Delete).collect())
    }

    async fn save(&self, writes: Vec<EntityWrite>) -> Result<()> {
        self.check_batch("save", writes.len())?;
        let mut state = self.state.write().await;
        state.apply(writes.into_iter().map(Mutation::Save).collect())
    }

    async fn run_query(&self, query: Query) -> Result<QueryResponse> {
        let state = self.state.read().await;
        query::execute(&state, &query)
    }
}

#[async_trait]
impl Backend for InMemoryStore {
    type Transaction = InMemoryTransaction;

    async fn begin_transaction(&self) -> Result<InMemoryTransaction> {
        Ok(InMemoryTransaction::new(self.clone()))
    }
}
