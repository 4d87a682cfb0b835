//! storekit - typed records over a managed document store.
//!
//! A [`DatastoreClient`] wraps a store [`Backend`] and translates typed
//! operations (allocate keys, get, delete, save, query) into store requests,
//! using a [`ModelDescriptor`] to map each record type to a kind. The same
//! operations are available on a [`DatastoreTransaction`].
//!
//! # Feature Flags
//!
//! - `inmemory` (default): in-process store, useful for tests
//! - `dynamodb`: AWS DynamoDB store using `aws-sdk-dynamodb`
//!
//! # Example
//!
//! ```rust,ignore
//! use storekit::{DatastoreClient, ModelDescriptor, SaveMethod};
//!
//! let client = DatastoreClient::in_memory();
//! let tasks = ModelDescriptor::<Task>::new("Task", "id");
//!
//! let mut batch = vec![Task::new("Write docs")];
//! client.allocate_keys(&mut batch, &tasks).await?;
//! client.save(&batch, &tasks, SaveMethod::Insert).await?;
//! ```

mod client;
mod config;
mod operations;
pub mod storage;
mod transaction;

pub use client::DatastoreClient;
pub use config::Config;
pub use operations::{build_query, QueryResult};
pub use transaction::DatastoreTransaction;

pub use storekit_core::codec::{Codec, JsonCodec};
pub use storekit_core::entity::{
    decode_id, encode_id, Entity, EntityWrite, Fields, NativeKey, SaveMethod, Value, KEY_PROPERTY,
};
pub use storekit_core::model::{Filter, ModelDescriptor, Operator, Order, QueryDescriptor};
pub use storekit_core::store::{
    Backend, MoreResults, Query, QueryClause, QueryInfo, QueryResponse, Result, StoreError,
    StoreRequest, TransactionRequest,
};

#[cfg(test)]
pub(crate) mod testing;
