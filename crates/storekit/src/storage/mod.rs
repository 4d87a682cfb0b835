//! Store backend implementations.
//!
//! This module provides concrete implementations of the store traits defined
//! in `storekit_core::store`. Backends are selected at compile time via
//! feature flags and can be enabled together.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): in-process store using `tokio::sync::RwLock`
//! - `dynamodb`: AWS DynamoDB store using `aws-sdk-dynamodb`
//!
//! # Examples
//!
//! Build with the in-memory store only (default):
//! ```bash
//! cargo build -p storekit
//! ```
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p storekit --features dynamodb
//! ```

#[cfg(not(any(feature = "inmemory", feature = "dynamodb")))]
compile_error!(
    "No store backend selected. Enable 'inmemory' or 'dynamodb' feature. \
    Example: cargo build -p storekit --features dynamodb"
);

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub use inmemory::{InMemoryStore, InMemoryTransaction};

#[cfg(feature = "dynamodb")]
pub use dynamodb::{DynamoDbStore, DynamoDbTransaction};
