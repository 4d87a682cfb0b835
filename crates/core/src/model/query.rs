use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::entity::Value;

/// Comparison operator of a query filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThanOrEqual => ">=",
        }
    }

    /// Returns true if `property.compare(operand)` satisfies the operator.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Equal => ordering == Ordering::Equal,
            Operator::LessThan => ordering == Ordering::Less,
            Operator::GreaterThan => ordering == Ordering::Greater,
            Operator::LessThanOrEqual => ordering != Ordering::Greater,
            Operator::GreaterThanOrEqual => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Operator::Equal),
            "<" => Ok(Operator::LessThan),
            ">" => Ok(Operator::GreaterThan),
            "<=" => Ok(Operator::LessThanOrEqual),
            ">=" => Ok(Operator::GreaterThanOrEqual),
            other => Err(format!("unknown operator '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field_name: String,
    pub operator: Operator,
    pub field_value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field_name: String,
    pub descending: bool,
}

/// Describes a query over one kind.
///
/// Filters and orderings are applied in the order they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDescriptor {
    pub start_cursor: Option<String>,
    pub limit: Option<u32>,
    pub filters: Vec<Filter>,
    pub orderings: Vec<Order>,
}

impl QueryDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resumes from a cursor returned by a previous query.
    pub fn with_start_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.start_cursor = Some(cursor.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filter(
        mut self,
        field_name: impl Into<String>,
        operator: Operator,
        field_value: impl Into<Value>,
    ) -> Self {
        self.filters.push(Filter {
            field_name: field_name.into(),
            operator,
            field_value: field_value.into(),
        });
        self
    }

    pub fn order(mut self, field_name: impl Into<String>, descending: bool) -> Self {
        self.orderings.push(Order {
            field_name: field_name.into(),
            descending,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_round_trips_through_text() {
        for op in [
            Operator::Equal,
            Operator::LessThan,
            Operator::GreaterThan,
            Operator::LessThanOrEqual,
            Operator::GreaterThanOrEqual,
        ] {
            assert_eq!(op.as_str().parse::<Operator>(), Ok(op));
        }
        assert!("!=".parse::<Operator>().is_err());
    }

    #[test]
    fn test_operator_accepts() {
        assert!(Operator::Equal.accepts(Ordering::Equal));
        assert!(!Operator::Equal.accepts(Ordering::Less));
        assert!(Operator::LessThanOrEqual.accepts(Ordering::Equal));
        assert!(Operator::LessThanOrEqual.accepts(Ordering::Less));
        assert!(!Operator::LessThanOrEqual.accepts(Ordering::Greater));
        assert!(Operator::GreaterThan.accepts(Ordering::Greater));
        assert!(!Operator::GreaterThanOrEqual.accepts(Ordering::Less));
    }

    #[test]
    fn test_builder_preserves_order() {
        let query = QueryDescriptor::new()
            .with_limit(20)
            .filter("done", Operator::Equal, false)
            .filter("priority", Operator::GreaterThan, 2i64)
            .order("priority", true)
            .order("title", false);

        assert_eq!(query.limit, Some(20));
        assert_eq!(query.start_cursor, None);
        let fields: Vec<&str> = query.filters.iter().map(|f| f.field_name.as_str()).collect();
        assert_eq!(fields, vec!["done", "priority"]);
        assert_eq!(query.orderings[0].field_name, "priority");
        assert!(query.orderings[0].descending);
        assert_eq!(query.orderings[1].field_name, "title");
    }
}
