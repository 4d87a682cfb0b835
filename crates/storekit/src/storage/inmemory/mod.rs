//! In-memory store backend.
//!
//! Entities live in a `BTreeMap` keyed by [`NativeKey`](storekit_core::entity::NativeKey)
//! behind an `Arc<RwLock<_>>`. Every committed write bumps a global version,
//! which transactions use to detect conflicting writers. Data is not
//! persisted and is lost when the last handle is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use storekit::storage::inmemory::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! let client = storekit::DatastoreClient::new(store);
//! ```

mod query;
mod store;
mod transaction;

pub use store::InMemoryStore;
pub use transaction::InMemoryTransaction;
