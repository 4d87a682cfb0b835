//! DynamoDB store backend.
//!
//! All kinds share one table whose primary key is `PK` (kind) and `SK`
//! (key name). Batched writes go through `TransactWriteItems`, so a batch
//! lands completely or not at all.
//!
//! Queries run on the kind's partition. Only key order is available;
//! ordering by any other property is rejected.

mod conversions;
mod cursor;
mod error;
mod expressions;
mod keys;
mod store;
mod transaction;
mod writes;

pub use store::DynamoDbStore;
pub use transaction::DynamoDbTransaction;
