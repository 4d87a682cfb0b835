use thiserror::Error;

/// Errors reported by a store backend.
///
/// The client layer returns these unchanged; it never wraps or retries them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: String, name: String },
    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: String, name: String },
    #[error("Transaction aborted: {0}")]
    Aborted(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Codec error: {0}")]
    Codec(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
