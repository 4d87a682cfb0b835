//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError` from `storekit_core::store`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{BuildError, SdkError};
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::transact_get_items::TransactGetItemsError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;

use storekit_core::entity::SaveMethod;
use storekit_core::store::StoreError;

use super::writes::PendingWrite;

/// Requests that never reached DynamoDB.
fn transport_error<E, R>(err: &SdkError<E, R>) -> Option<StoreError> {
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => Some(
            StoreError::ConnectionFailed("DynamoDB request could not be sent".to_string()),
        ),
        _ => None,
    }
}

/// Map an UpdateItem SDK error (id allocation) to StoreError.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
) -> StoreError {
    if let Some(error) = transport_error(&err) {
        return error;
    }
    match err.into_service_error() {
        UpdateItemError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        UpdateItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        UpdateItemError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        UpdateItemError::TransactionConflictException(_) => {
            StoreError::Aborted("Id counter is part of an ongoing transaction".to_string())
        }
        UpdateItemError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("UpdateItem failed: {:?}", err)),
    }
}

/// Map a BatchGetItem SDK error to StoreError.
pub fn map_batch_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchGetItemError, R>,
) -> StoreError {
    if let Some(error) = transport_error(&err) {
        return error;
    }
    match err.into_service_error() {
        BatchGetItemError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        BatchGetItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        BatchGetItemError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        BatchGetItemError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("BatchGetItem failed: {:?}", err)),
    }
}

/// Map a TransactGetItems SDK error to StoreError.
pub fn map_transact_get_items_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<TransactGetItemsError, R>,
) -> StoreError {
    if let Some(error) = transport_error(&err) {
        return error;
    }
    match err.into_service_error() {
        TransactGetItemsError::TransactionCanceledException(_) => {
            StoreError::Aborted("Read conflicts with an ongoing write".to_string())
        }
        TransactGetItemsError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        TransactGetItemsError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        TransactGetItemsError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        TransactGetItemsError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("TransactGetItems failed: {:?}", err)),
    }
}

/// Map a TransactWriteItems SDK error to StoreError.
///
/// `writes` are the items of the failed request, in request order.
pub fn map_transact_write_items_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<TransactWriteItemsError, R>,
    writes: &[PendingWrite],
) -> StoreError {
    if let Some(error) = transport_error(&err) {
        return error;
    }
    match err.into_service_error() {
        TransactWriteItemsError::TransactionCanceledException(canceled) => {
            let codes: Vec<Option<&str>> = canceled
                .cancellation_reasons()
                .iter()
                .map(|reason| reason.code())
                .collect();
            cancellation_error(&codes, writes)
        }
        TransactWriteItemsError::TransactionInProgressException(_) => {
            StoreError::Aborted("Transaction already in progress".to_string())
        }
        TransactWriteItemsError::IdempotentParameterMismatchException(_) => {
            StoreError::InvalidArgument("Transaction token reused for another request".to_string())
        }
        TransactWriteItemsError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        TransactWriteItemsError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        TransactWriteItemsError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        TransactWriteItemsError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("TransactWriteItems failed: {:?}", err)),
    }
}

/// Picks the error for a canceled write transaction from its per-item
/// cancellation codes.
///
/// The first failed condition check wins; otherwise the whole batch is
/// reported as aborted.
pub fn cancellation_error(codes: &[Option<&str>], writes: &[PendingWrite]) -> StoreError {
    for (code, write) in codes.iter().zip(writes) {
        if *code != Some("ConditionalCheckFailed") {
            continue;
        }
        let key = write.key();
        let kind = key.kind.clone();
        let name = key.name.clone().unwrap_or_default();
        return match write {
            PendingWrite::Put {
                method: SaveMethod::Insert,
                ..
            } => StoreError::AlreadyExists { kind, name },
            PendingWrite::Put {
                method: SaveMethod::Update,
                ..
            } => StoreError::NotFound { kind, name },
            _ => StoreError::Aborted(format!("Condition check failed for {key}")),
        };
    }

    let reasons: Vec<&str> = codes
        .iter()
        .flatten()
        .copied()
        .filter(|code| *code != "None")
        .collect();
    StoreError::Aborted(format!("Transaction canceled: {}", reasons.join(", ")))
}

/// Map a request builder error to StoreError.
pub fn map_build_error(err: BuildError) -> StoreError {
    StoreError::InvalidArgument(err.to_string())
}

/// Map a Query SDK error to StoreError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(err: SdkError<QueryError, R>) -> StoreError {
    if let Some(error) = transport_error(&err) {
        return error;
    }
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        QueryError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        QueryError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        QueryError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("Query failed: {:?}", err)),
    }
}
