mod error;
mod query;
mod traits;

pub use error::{Result, StoreError};
pub use query::{MoreResults, Query, QueryClause, QueryInfo, QueryResponse};
pub use traits::{Backend, StoreRequest, TransactionRequest};
