//! Test fixtures shared by the crate's unit tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use storekit_core::entity::{Entity, EntityWrite, NativeKey};
use storekit_core::model::ModelDescriptor;
use storekit_core::store::{
    MoreResults, Query, QueryInfo, QueryResponse, Result, StoreError, StoreRequest,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub priority: i64,
    pub done: bool,
    #[serde(default)]
    pub notes: String,
}

pub fn task(title: &str) -> Task {
    Task {
        id: None,
        title: title.to_string(),
        priority: 1,
        done: false,
        notes: String::new(),
    }
}

pub fn tasks_descriptor() -> ModelDescriptor<Task> {
    ModelDescriptor::new("Task", "id").with_excluded_indexes(["notes"])
}

/// A request the [`RecordingStore`] received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AllocateIds { kind: String, count: usize },
    Get(Vec<NativeKey>),
    Delete(Vec<NativeKey>),
    Save(Vec<EntityWrite>),
    RunQuery(Query),
}

/// Store fake that records every request and answers with canned data.
#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<Call>>,
    ids: Vec<i64>,
    entities: Vec<Entity>,
    query_response: Option<QueryResponse>,
    error: Option<StoreError>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(mut self, ids: Vec<i64>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_entities(mut self, entities: Vec<Entity>) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_query_response(mut self, response: QueryResponse) -> Self {
        self.query_response = Some(response);
        self
    }

    pub fn failing_with(mut self, error: StoreError) -> Self {
        self.error = Some(error);
        self
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().await.push(call);
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StoreRequest for RecordingStore {
    async fn allocate_ids(&self, kind: &str, count: usize) -> Result<Vec<i64>> {
        self.record(Call::AllocateIds {
            kind: kind.to_string(),
            count,
        })
        .await?;
        Ok(self.ids.iter().copied().take(count).collect())
    }

    async fn get(&self, keys: Vec<NativeKey>) -> Result<Vec<Entity>> {
        self.record(Call::Get(keys)).await?;
        Ok(self.entities.clone())
    }

    async fn delete(&self, keys: Vec<NativeKey>) -> Result<()> {
        self.record(Call::Delete(keys)).await
    }

    async fn save(&self, writes: Vec<EntityWrite>) -> Result<()> {
        self.record(Call::Save(writes)).await
    }

    async fn run_query(&self, query: Query) -> Result<QueryResponse> {
        self.record(Call::RunQuery(query)).await?;
        Ok(self.query_response.clone().unwrap_or(QueryResponse {
            entities: Vec::new(),
            info: QueryInfo {
                end_cursor: None,
                more_results: MoreResults::NoMoreResults,
            },
        }))
    }
}
