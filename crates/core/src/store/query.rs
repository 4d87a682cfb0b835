//! The store-native query and its response.

use crate::entity::{Entity, Value};
use crate::model::Operator;

/// One clause of a native query, kept in the order it was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryClause {
    Start(String),
    Limit(u32),
    Order {
        field: String,
        descending: bool,
    },
    Filter {
        field: String,
        operator: Operator,
        value: Value,
    },
}

/// A query against one kind, built by chaining clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    kind: String,
    clauses: Vec<QueryClause>,
}

impl Query {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            clauses: Vec::new(),
        }
    }

    /// Resumes the query from a cursor.
    pub fn start(mut self, cursor: impl Into<String>) -> Self {
        self.clauses.push(QueryClause::Start(cursor.into()));
        self
    }

    /// Caps the number of returned entities.
    pub fn limit(mut self, limit: u32) -> Self {
        self.clauses.push(QueryClause::Limit(limit));
        self
    }

    pub fn order(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.clauses.push(QueryClause::Order {
            field: field.into(),
            descending,
        });
        self
    }

    pub fn filter(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.clauses.push(QueryClause::Filter {
            field: field.into(),
            operator,
            value: value.into(),
        });
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// All clauses in application order.
    pub fn clauses(&self) -> &[QueryClause] {
        &self.clauses
    }

    /// The most recently applied start cursor.
    pub fn start_cursor(&self) -> Option<&str> {
        self.clauses.iter().rev().find_map(|clause| match clause {
            QueryClause::Start(cursor) => Some(cursor.as_str()),
            _ => None,
        })
    }

    /// The most recently applied limit.
    pub fn limit_value(&self) -> Option<u32> {
        self.clauses.iter().rev().find_map(|clause| match clause {
            QueryClause::Limit(limit) => Some(*limit),
            _ => None,
        })
    }

    /// Orderings as `(field, descending)`, primary ordering first.
    pub fn orders(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.clauses.iter().filter_map(|clause| match clause {
            QueryClause::Order { field, descending } => Some((field.as_str(), *descending)),
            _ => None,
        })
    }

    pub fn filters(&self) -> impl Iterator<Item = (&str, Operator, &Value)> + '_ {
        self.clauses.iter().filter_map(|clause| match clause {
            QueryClause::Filter {
                field,
                operator,
                value,
            } => Some((field.as_str(), *operator, value)),
            _ => None,
        })
    }
}

/// Whether a query has results past the returned batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoreResults {
    NotFinished,
    MoreResultsAfterLimit,
    MoreResultsAfterCursor,
    NoMoreResults,
}

/// Pagination state reported with a query batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryInfo {
    pub end_cursor: Option<String>,
    pub more_results: MoreResults,
}

impl QueryInfo {
    /// Returns the cursor to resume from, or `None` once the results are exhausted.
    pub fn continuation(self) -> Option<String> {
        match self.more_results {
            MoreResults::NoMoreResults => None,
            _ => self.end_cursor,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub entities: Vec<Entity>,
    pub info: QueryInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clauses_keep_application_order() {
        let query = Query::new("Task")
            .limit(10)
            .order("priority", true)
            .filter("done", Operator::Equal, false)
            .order("title", false);

        assert_eq!(
            query.clauses(),
            &[
                QueryClause::Limit(10),
                QueryClause::Order {
                    field: "priority".to_string(),
                    descending: true
                },
                QueryClause::Filter {
                    field: "done".to_string(),
                    operator: Operator::Equal,
                    value: Value::Boolean(false)
                },
                QueryClause::Order {
                    field: "title".to_string(),
                    descending: false
                },
            ]
        );
        let orders: Vec<_> = query.orders().collect();
        assert_eq!(orders, vec![("priority", true), ("title", false)]);
    }

    #[test]
    fn test_start_cursor_and_limit_accessors() {
        let query = Query::new("Task").start("abc").limit(5);
        assert_eq!(query.kind(), "Task");
        assert_eq!(query.start_cursor(), Some("abc"));
        assert_eq!(query.limit_value(), Some(5));

        let bare = Query::new("Task");
        assert_eq!(bare.start_cursor(), None);
        assert_eq!(bare.limit_value(), None);
    }

    #[test]
    fn test_continuation_is_dropped_when_exhausted() {
        let done = QueryInfo {
            end_cursor: Some("end".to_string()),
            more_results: MoreResults::NoMoreResults,
        };
        assert_eq!(done.continuation(), None);

        let more = QueryInfo {
            end_cursor: Some("end".to_string()),
            more_results: MoreResults::MoreResultsAfterLimit,
        };
        assert_eq!(more.continuation(), Some("end".to_string()));
    }
}
