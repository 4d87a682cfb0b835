use std::env;

/// Store configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// DynamoDB table holding every kind (default: "storekit")
    pub dynamodb_table_name: String,
    /// Custom DynamoDB endpoint, e.g. a local DynamoDB (default: none)
    pub aws_endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1")
    pub aws_region: String,
    /// Largest batch the in-memory store accepts (default: 500)
    pub max_batch_size: usize,
    /// First id the in-memory store allocates for each kind (default: 1)
    pub first_id: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DYNAMODB_TABLE_NAME` - DynamoDB table name (default: "storekit")
    /// - `AWS_ENDPOINT_URL` - Custom DynamoDB endpoint (default: none)
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    /// - `STOREKIT_MAX_BATCH_SIZE` - In-memory batch limit (default: 500)
    /// - `STOREKIT_FIRST_ID` - In-memory first allocated id (default: 1)
    pub fn from_env() -> Self {
        Self {
            dynamodb_table_name: env::var("DYNAMODB_TABLE_NAME")
                .unwrap_or_else(|_| "storekit".to_string()),
            aws_endpoint_url: env::var("AWS_ENDPOINT_URL").ok(),
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            max_batch_size: env::var("STOREKIT_MAX_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),
            first_id: env::var("STOREKIT_FIRST_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
