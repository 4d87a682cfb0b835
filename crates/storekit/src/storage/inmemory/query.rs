//! Query evaluation over committed entities.
//!
//! Pure functions over [`State`]: select the kind, apply filters, sort by the
//! requested orderings (key order otherwise), then page with an offset cursor.

use std::cmp::Ordering;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use storekit_core::entity::{NativeKey, Value, KEY_PROPERTY};
use storekit_core::model::Operator;
use storekit_core::store::{MoreResults, Query, QueryInfo, QueryResponse, Result, StoreError};

use super::store::{State, StoredEntity};

type Row<'a> = (&'a NativeKey, &'a StoredEntity);

pub(super) fn execute(state: &State, query: &Query) -> Result<QueryResponse> {
    let offset = match query.start_cursor() {
        Some(cursor) => decode_cursor(cursor)?,
        None => 0,
    };

    let mut rows: Vec<Row<'_>> = state
        .entities
        .iter()
        .filter(|(key, _)| key.kind == query.kind())
        .filter(|(key, stored)| {
            query
                .filters()
                .all(|(field, operator, value)| filter_matches(key, stored, field, operator, value))
        })
        .collect();

    let orders: Vec<(&str, bool)> = query.orders().collect();
    if !orders.is_empty() {
        rows.retain(|(key, stored)| {
            orders
                .iter()
                .all(|(field, _)| property(key, stored, field).is_some())
        });
        rows.sort_by(|a, b| compare_rows(a, b, &orders));
    }

    let total = rows.len();
    let start = offset.min(total);
    let end = match query.limit_value() {
        Some(limit) => start.saturating_add(limit as usize).min(total),
        None => total,
    };

    let entities = rows[start..end]
        .iter()
        .map(|(key, stored)| stored.to_entity(key))
        .collect();
    let more_results = if end < total {
        MoreResults::MoreResultsAfterLimit
    } else {
        MoreResults::NoMoreResults
    };

    Ok(QueryResponse {
        entities,
        info: QueryInfo {
            end_cursor: Some(encode_cursor(end)),
            more_results,
        },
    })
}

/// Indexed value of `field`, or the key name for `__key__`.
fn property(key: &NativeKey, stored: &StoredEntity, field: &str) -> Option<Value> {
    if field == KEY_PROPERTY {
        return key.name.clone().map(Value::String);
    }
    if stored.unindexed.contains(field) {
        return None;
    }
    stored.data.get(field).cloned()
}

fn filter_matches(
    key: &NativeKey,
    stored: &StoredEntity,
    field: &str,
    operator: Operator,
    expected: &Value,
) -> bool {
    let accepts = |candidate: &Value| {
        candidate.is_comparable_with(expected) && operator.accepts(candidate.compare(expected))
    };
    match property(key, stored, field) {
        Some(Value::Array(items)) => items.iter().any(accepts),
        Some(value) => accepts(&value),
        None => false,
    }
}

fn compare_rows(a: &Row<'_>, b: &Row<'_>, orders: &[(&str, bool)]) -> Ordering {
    for (field, descending) in orders {
        let left = property(a.0, a.1, field);
        let right = property(b.0, b.1, field);
        let ordering = match (left, right) {
            (Some(left), Some(right)) => left.compare(&right),
            _ => Ordering::Equal,
        };
        let ordering = if *descending {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.0.cmp(b.0)
}

fn encode_cursor(offset: usize) -> String {
    STANDARD.encode((offset as u64).to_be_bytes())
}

fn decode_cursor(cursor: &str) -> Result<usize> {
    let invalid = || StoreError::InvalidArgument(format!("invalid cursor: {cursor}"));
    let bytes: [u8; 8] = STANDARD
        .decode(cursor)
        .map_err(|_| invalid())?
        .try_into()
        .map_err(|_| invalid())?;
    usize::try_from(u64::from_be_bytes(bytes)).map_err(|_| invalid())
}
