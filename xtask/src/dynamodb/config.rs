//! Table configuration types (Functional Core - pure data).

/// Table schema configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: KeyAttribute,
    pub billing_mode: BillingMode,
}

/// A key attribute definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

/// DynamoDB attribute types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
}

/// Billing mode for the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingMode {
    PayPerRequest,
}

impl TableConfig {
    pub fn with_table_name(mut self, name: &str) -> Self {
        self.table_name = name.to_string();
        self
    }

    /// Key attribute names in `(partition, sort)` order.
    pub fn key_names(&self) -> (&str, &str) {
        (&self.partition_key.name, &self.sort_key.name)
    }
}

/// Returns the table layout the storekit DynamoDB backend expects: the kind
/// as partition key and the key name as sort key.
pub fn storekit_table_config() -> TableConfig {
    TableConfig {
        table_name: "storekit".to_string(),
        partition_key: KeyAttribute {
            name: "PK".to_string(),
            attribute_type: AttributeType::String,
        },
        sort_key: KeyAttribute {
            name: "SK".to_string(),
            attribute_type: AttributeType::String,
        },
        billing_mode: BillingMode::PayPerRequest,
    }
}
