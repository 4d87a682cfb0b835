//! Query expression building.
//!
//! Translates a native [`Query`] into the key condition, filter expression
//! and placeholders of a DynamoDB `Query` request. Property names and values
//! always go through placeholders, so any property name is accepted.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use storekit_core::entity::{Value, KEY_PROPERTY};
use storekit_core::model::Operator;
use storekit_core::store::{Query, Result, StoreError};

use super::conversions::value_to_attribute;
use super::keys::{self, PARTITION_KEY, SORT_KEY};

/// The expression parts of a DynamoDB `Query` request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryExpression {
    pub key_condition: String,
    pub filter: Option<String>,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
    /// `false` when results are ordered by descending key.
    pub scan_forward: bool,
}

pub fn build_query_expression(query: &Query) -> Result<QueryExpression> {
    keys::check_kind(query.kind())?;

    let mut names = HashMap::from([("#pk".to_string(), PARTITION_KEY.to_string())]);
    let mut values = HashMap::from([(
        ":pk".to_string(),
        AttributeValue::S(query.kind().to_string()),
    )]);
    let mut key_condition = "#pk = :pk".to_string();
    let mut conditions = Vec::new();

    for (index, (field, operator, value)) in query.filters().enumerate() {
        if field == KEY_PROPERTY {
            if names.contains_key("#sk") {
                return Err(StoreError::InvalidArgument(format!(
                    "at most one filter on {KEY_PROPERTY} is supported"
                )));
            }
            let Value::String(name) = value else {
                return Err(StoreError::InvalidArgument(format!(
                    "filter on {KEY_PROPERTY} needs a string, got {}",
                    value.type_name()
                )));
            };
            names.insert("#sk".to_string(), SORT_KEY.to_string());
            values.insert(":sk".to_string(), AttributeValue::S(name.clone()));
            key_condition.push_str(&format!(" AND #sk {} :sk", comparator(operator)));
            continue;
        }

        if keys::is_reserved(field) {
            return Err(StoreError::InvalidArgument(format!(
                "property name {field} is reserved"
            )));
        }
        let name = format!("#f{index}");
        let placeholder = format!(":v{index}");
        conditions.push(format!("{name} {} {placeholder}", comparator(operator)));
        names.insert(name, field.to_string());
        values.insert(placeholder, value_to_attribute(value)?);
    }

    let mut scan_forward = true;
    for (position, (field, descending)) in query.orders().enumerate() {
        if field != KEY_PROPERTY || position > 0 {
            return Err(StoreError::InvalidArgument(format!(
                "ordering on {field} requires an index; only {KEY_PROPERTY} ordering is supported"
            )));
        }
        scan_forward = !descending;
    }

    Ok(QueryExpression {
        key_condition,
        filter: (!conditions.is_empty()).then(|| conditions.join(" AND ")),
        names,
        values,
        scan_forward,
    })
}

fn comparator(operator: Operator) -> &'static str {
    match operator {
        Operator::Equal => "=",
        Operator::LessThan => "<",
        Operator::GreaterThan => ">",
        Operator::LessThanOrEqual => "<=",
        Operator::GreaterThanOrEqual => ">=",
    }
}
