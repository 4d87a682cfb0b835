//! Translation between typed records and store requests.
//!
//! These functions are shared by [`DatastoreClient`](crate::DatastoreClient)
//! and [`DatastoreTransaction`](crate::DatastoreTransaction); they only differ
//! in the request surface they are handed. Store errors are returned as-is.
//!
//! The identity field never travels as entity data: saves strip it and move
//! it into the key, reads put the key's name back before decoding.

use storekit_core::entity::{
    encode_id, Entity, EntityWrite, NativeKey, SaveMethod, Value, KEY_PROPERTY,
};
use storekit_core::model::{ModelDescriptor, QueryDescriptor};
use storekit_core::store::{Query, Result, StoreError, StoreRequest};

/// One page of typed query results.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    pub values: Vec<T>,
    /// Cursor to resume from; `None` once the store reports no more results.
    pub cursor: Option<String>,
}

/// Assigns fresh store ids to `values`, in order.
pub(crate) async fn allocate_keys<R, T>(
    request: &R,
    values: &mut [T],
    descriptor: &ModelDescriptor<T>,
) -> Result<()>
where
    R: StoreRequest + ?Sized,
{
    if values.is_empty() {
        return Ok(());
    }

    let ids = request.allocate_ids(&descriptor.name, values.len()).await?;
    tracing::debug!(kind = %descriptor.name, count = ids.len(), "Allocated ids");
    if ids.len() != values.len() {
        return Err(StoreError::InvalidData(format!(
            "requested {} ids for {}, store returned {}",
            values.len(),
            descriptor.name,
            ids.len()
        )));
    }

    // Records are only replaced once every one of them has been re-encoded.
    let identified = values
        .iter()
        .zip(ids)
        .map(|(value, id)| {
            let mut fields = descriptor.value_codec.encode(value)?;
            fields.insert(descriptor.key.clone(), Value::String(encode_id(id)));
            descriptor.value_codec.decode(fields)
        })
        .collect::<Result<Vec<T>>>()?;

    for (value, replacement) in values.iter_mut().zip(identified) {
        *value = replacement;
    }
    Ok(())
}

pub(crate) async fn get_values_by_keys<R, T, K>(
    request: &R,
    keys: &[K],
    descriptor: &ModelDescriptor<T>,
) -> Result<Vec<T>>
where
    R: StoreRequest + ?Sized,
    K: AsRef<str>,
{
    let entities = request.get(native_keys(keys, descriptor)).await?;
    tracing::debug!(
        kind = %descriptor.name,
        requested = keys.len(),
        found = entities.len(),
        "Fetched entities"
    );

    entities
        .into_iter()
        .map(|entity| decode_entity(entity, descriptor))
        .collect()
}

pub(crate) async fn delete_by_keys<R, T, K>(
    request: &R,
    keys: &[K],
    descriptor: &ModelDescriptor<T>,
) -> Result<()>
where
    R: StoreRequest + ?Sized,
    K: AsRef<str>,
{
    request.delete(native_keys(keys, descriptor)).await?;
    tracing::debug!(kind = %descriptor.name, count = keys.len(), "Deleted entities");
    Ok(())
}

pub(crate) async fn save_values<R, T>(
    request: &R,
    values: &[T],
    descriptor: &ModelDescriptor<T>,
    method: SaveMethod,
) -> Result<()>
where
    R: StoreRequest + ?Sized,
{
    let writes = values
        .iter()
        .map(|value| encode_entity(value, descriptor, method))
        .collect::<Result<Vec<_>>>()?;

    request.save(writes).await?;
    tracing::debug!(kind = %descriptor.name, count = values.len(), %method, "Saved entities");
    Ok(())
}

pub(crate) async fn query_values<R, T>(
    request: &R,
    query: &QueryDescriptor,
    descriptor: &ModelDescriptor<T>,
) -> Result<QueryResult<T>>
where
    R: StoreRequest + ?Sized,
{
    let response = request
        .run_query(build_query(query, descriptor))
        .await?;
    tracing::debug!(
        kind = %descriptor.name,
        count = response.entities.len(),
        more_results = ?response.info.more_results,
        "Ran query"
    );

    let values = response
        .entities
        .into_iter()
        .map(|entity| decode_entity(entity, descriptor))
        .collect::<Result<Vec<_>>>()?;

    Ok(QueryResult {
        values,
        cursor: response.info.continuation(),
    })
}

/// Builds the native query for a descriptor.
///
/// Clauses are applied as: start cursor, limit, every ordering, every filter.
/// The model's identity field only exists as the key name, so clauses on it
/// are sent as `__key__` clauses.
pub fn build_query<T>(query: &QueryDescriptor, descriptor: &ModelDescriptor<T>) -> Query {
    let field = |name: &str| {
        if name == descriptor.key {
            KEY_PROPERTY.to_string()
        } else {
            name.to_string()
        }
    };

    let mut native = Query::new(descriptor.name.clone());
    if let Some(cursor) = &query.start_cursor {
        native = native.start(cursor.clone());
    }
    if let Some(limit) = query.limit {
        native = native.limit(limit);
    }
    for ordering in &query.orderings {
        native = native.order(field(&ordering.field_name), ordering.descending);
    }
    for filter in &query.filters {
        native = native.filter(
            field(&filter.field_name),
            filter.operator,
            filter.field_value.clone(),
        );
    }
    native
}

fn native_keys<T, K: AsRef<str>>(keys: &[K], descriptor: &ModelDescriptor<T>) -> Vec<NativeKey> {
    keys.iter()
        .map(|key| descriptor.native_key(key.as_ref()))
        .collect()
}

/// Encodes a record, moving its identity field into the key.
///
/// An absent or null identity yields an incomplete key; rejecting it is up
/// to the store.
fn encode_entity<T>(
    value: &T,
    descriptor: &ModelDescriptor<T>,
    method: SaveMethod,
) -> Result<EntityWrite> {
    let mut data = descriptor.value_codec.encode(value)?;
    let name = match data.remove(&descriptor.key) {
        Some(Value::String(name)) => Some(name),
        Some(Value::Null) | None => None,
        Some(other) => {
            return Err(StoreError::InvalidArgument(format!(
                "identity field '{}' of {} must be a string, got {}",
                descriptor.key,
                descriptor.name,
                other.type_name()
            )))
        }
    };

    Ok(EntityWrite {
        entity: Entity {
            key: NativeKey {
                kind: descriptor.name.clone(),
                name,
            },
            data,
        },
        exclude_from_indexes: descriptor.excluded_indexes.clone(),
        method,
    })
}

/// Decodes an entity, restoring the identity field from its key.
fn decode_entity<T>(entity: Entity, descriptor: &ModelDescriptor<T>) -> Result<T> {
    let Entity { key, mut data } = entity;
    if let Some(name) = key.name {
        data.insert(descriptor.key.clone(), Value::String(name));
    }
    descriptor.value_codec.decode(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{task, tasks_descriptor, Call, RecordingStore, Task};
    use storekit_core::entity::Fields;
    use storekit_core::model::Operator;
    use storekit_core::store::{MoreResults, QueryClause, QueryInfo, QueryResponse};

    fn entity(name: &str, title: &str) -> Entity {
        let mut data = Fields::new();
        data.insert("title".to_string(), Value::from(title));
        data.insert("priority".to_string(), Value::Integer(1));
        data.insert("done".to_string(), Value::Boolean(false));
        Entity::new(NativeKey::new("Task", name), data)
    }

    // ==================== Key allocation ====================

    #[tokio::test]
    async fn test_allocate_keys_assigns_encoded_ids_in_order() {
        let store = RecordingStore::new().with_ids(vec![1, 256, 5_629_499_534_213_120]);
        let descriptor = tasks_descriptor();
        let mut values = vec![task("a"), task("b"), task("c")];

        allocate_keys(&store, &mut values, &descriptor).await.unwrap();

        let ids: Vec<_> = values.iter().map(|t| t.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["AQ==", "AQA=", "FAAAAAAAAA=="]);
        let titles: Vec<_> = values.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(
            store.calls().await,
            vec![Call::AllocateIds {
                kind: "Task".to_string(),
                count: 3
            }]
        );
    }

    #[tokio::test]
    async fn test_allocate_keys_with_no_values_skips_request() {
        let store = RecordingStore::new();
        let mut values: Vec<Task> = Vec::new();

        allocate_keys(&store, &mut values, &tasks_descriptor())
            .await
            .unwrap();

        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_allocate_keys_propagates_store_error() {
        let error = StoreError::ConnectionFailed("unreachable".to_string());
        let store = RecordingStore::new().failing_with(error.clone());
        let mut values = vec![task("a")];

        let result = allocate_keys(&store, &mut values, &tasks_descriptor()).await;

        assert_eq!(result, Err(error));
        assert_eq!(values[0].id, None);
    }

    #[tokio::test]
    async fn test_allocate_keys_rejects_short_id_batch() {
        let store = RecordingStore::new().with_ids(vec![7]);
        let mut values = vec![task("a"), task("b")];

        let result = allocate_keys(&store, &mut values, &tasks_descriptor()).await;

        assert!(matches!(result, Err(StoreError::InvalidData(_))));
        assert!(values.iter().all(|t| t.id.is_none()));
    }

    // ==================== Get / delete ====================

    #[tokio::test]
    async fn test_get_builds_keys_and_restores_identity() {
        let store = RecordingStore::new().with_entities(vec![entity("k2", "second")]);

        let values = get_values_by_keys(&store, &["k1", "k2"], &tasks_descriptor())
            .await
            .unwrap();

        assert_eq!(values.len(), 1);
        assert_eq!(values[0].id.as_deref(), Some("k2"));
        assert_eq!(values[0].title, "second");
        assert_eq!(
            store.calls().await,
            vec![Call::Get(vec![
                NativeKey::new("Task", "k1"),
                NativeKey::new("Task", "k2")
            ])]
        );
    }

    #[tokio::test]
    async fn test_delete_builds_keys_for_kind() {
        let store = RecordingStore::new();
        let keys = vec!["a".to_string(), "b".to_string()];

        delete_by_keys(&store, &keys, &tasks_descriptor())
            .await
            .unwrap();

        assert_eq!(
            store.calls().await,
            vec![Call::Delete(vec![
                NativeKey::new("Task", "a"),
                NativeKey::new("Task", "b")
            ])]
        );
    }

    // ==================== Save ====================

    #[tokio::test]
    async fn test_save_strips_identity_into_key() {
        let store = RecordingStore::new();
        let descriptor = tasks_descriptor();
        let mut value = task("write");
        value.id = Some("abc".to_string());

        save_values(&store, &[value], &descriptor, SaveMethod::Upsert)
            .await
            .unwrap();

        let calls = store.calls().await;
        let Call::Save(writes) = &calls[0] else {
            panic!("expected a save call, got {calls:?}");
        };
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].entity.key, NativeKey::new("Task", "abc"));
        assert!(!writes[0].entity.data.contains_key("id"));
        assert_eq!(
            writes[0].entity.data.get("title"),
            Some(&Value::from("write"))
        );
        assert_eq!(writes[0].exclude_from_indexes, vec!["notes".to_string()]);
        assert_eq!(writes[0].method, SaveMethod::Upsert);
    }

    #[tokio::test]
    async fn test_save_without_identity_sends_incomplete_key() {
        let store = RecordingStore::new();

        save_values(&store, &[task("new")], &tasks_descriptor(), SaveMethod::Insert)
            .await
            .unwrap();

        let calls = store.calls().await;
        let Call::Save(writes) = &calls[0] else {
            panic!("expected a save call, got {calls:?}");
        };
        assert_eq!(writes[0].entity.key, NativeKey::incomplete("Task"));
    }

    #[tokio::test]
    async fn test_save_issues_one_batched_request() {
        let store = RecordingStore::new();
        let values = vec![task("a"), task("b"), task("c")];

        save_values(&store, &values, &tasks_descriptor(), SaveMethod::Upsert)
            .await
            .unwrap();

        let calls = store.calls().await;
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], Call::Save(writes) if writes.len() == 3));
    }

    // ==================== Query ====================

    #[test]
    fn test_build_query_applies_orderings_then_filters_in_sequence() {
        let descriptor = QueryDescriptor::new()
            .with_start_cursor("c1")
            .with_limit(5)
            .filter("done", Operator::Equal, false)
            .filter("priority", Operator::GreaterThanOrEqual, 2i64)
            .order("priority", true)
            .order("title", false);

        let query = build_query(&descriptor, &tasks_descriptor());

        assert_eq!(query.kind(), "Task");
        assert_eq!(
            query.clauses(),
            &[
                QueryClause::Start("c1".to_string()),
                QueryClause::Limit(5),
                QueryClause::Order {
                    field: "priority".to_string(),
                    descending: true
                },
                QueryClause::Order {
                    field: "title".to_string(),
                    descending: false
                },
                QueryClause::Filter {
                    field: "done".to_string(),
                    operator: Operator::Equal,
                    value: Value::Boolean(false)
                },
                QueryClause::Filter {
                    field: "priority".to_string(),
                    operator: Operator::GreaterThanOrEqual,
                    value: Value::Integer(2)
                },
            ]
        );
    }

    #[test]
    fn test_build_query_skips_absent_cursor_and_limit() {
        let query = build_query(&QueryDescriptor::new(), &tasks_descriptor());
        assert!(query.clauses().is_empty());
    }

    #[test]
    fn test_build_query_maps_identity_field_to_key() {
        let descriptor = QueryDescriptor::new()
            .filter("id", Operator::Equal, "AQ==")
            .order("id", true);

        let query = build_query(&descriptor, &tasks_descriptor());

        assert_eq!(
            query.clauses(),
            &[
                QueryClause::Order {
                    field: KEY_PROPERTY.to_string(),
                    descending: true
                },
                QueryClause::Filter {
                    field: KEY_PROPERTY.to_string(),
                    operator: Operator::Equal,
                    value: Value::from("AQ==")
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_query_sends_clauses_to_store_in_sequence() {
        let store = RecordingStore::new();
        let descriptor = QueryDescriptor::new()
            .filter("b", Operator::LessThan, 1i64)
            .filter("a", Operator::Equal, "x")
            .order("z", false)
            .order("y", true);

        query_values(&store, &descriptor, &tasks_descriptor())
            .await
            .unwrap();

        let calls = store.calls().await;
        let Call::RunQuery(query) = &calls[0] else {
            panic!("expected a query call, got {calls:?}");
        };
        let applied: Vec<String> = query
            .clauses()
            .iter()
            .map(|clause| match clause {
                QueryClause::Order { field, .. } => format!("order:{field}"),
                QueryClause::Filter { field, .. } => format!("filter:{field}"),
                other => format!("{other:?}"),
            })
            .collect();
        assert_eq!(applied, vec!["order:z", "order:y", "filter:b", "filter:a"]);
    }

    #[tokio::test]
    async fn test_query_omits_cursor_when_exhausted() {
        let store = RecordingStore::new().with_query_response(QueryResponse {
            entities: vec![entity("k1", "only")],
            info: QueryInfo {
                end_cursor: Some("end".to_string()),
                more_results: MoreResults::NoMoreResults,
            },
        });

        let result = query_values(&store, &QueryDescriptor::new(), &tasks_descriptor())
            .await
            .unwrap();

        assert_eq!(result.values.len(), 1);
        assert_eq!(result.values[0].id.as_deref(), Some("k1"));
        assert_eq!(result.cursor, None);
    }

    #[tokio::test]
    async fn test_query_returns_cursor_when_more_results() {
        let store = RecordingStore::new().with_query_response(QueryResponse {
            entities: vec![entity("k1", "first")],
            info: QueryInfo {
                end_cursor: Some("next-page".to_string()),
                more_results: MoreResults::MoreResultsAfterLimit,
            },
        });

        let result = query_values(
            &store,
            &QueryDescriptor::new().with_limit(1),
            &tasks_descriptor(),
        )
        .await
        .unwrap();

        assert_eq!(result.cursor.as_deref(), Some("next-page"));
    }

    #[tokio::test]
    async fn test_query_propagates_store_error() {
        let error = StoreError::QueryFailed("no matching index".to_string());
        let store = RecordingStore::new().failing_with(error.clone());

        let result = query_values(&store, &QueryDescriptor::new(), &tasks_descriptor()).await;

        assert_eq!(result, Err(error));
    }
}
