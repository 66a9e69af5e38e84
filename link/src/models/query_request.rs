use serde::{Deserialize, Serialize};

use super::references::DatasetReference;

/// Request payload for `POST projects/{project}/queries`.
///
/// # Examples
///
/// ```rust
/// use bq_link::models::{DatasetReference, QueryRequest};
///
/// let request = QueryRequest::new("SELECT word FROM shakespeare")
///     .with_default_dataset(DatasetReference::new("my-project", "samples"))
///     .with_max_results(100);
/// assert_eq!(request.max_results, Some(100));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub kind: String,

    /// SQL text
    pub query: String,

    /// Upper bound on rows returned inline with the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    /// Dataset used for unqualified table names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_dataset: Option<DatasetReference>,

    /// How long the service may hold the request waiting for completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Omitted means the service default dialect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_legacy_sql: Option<bool>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            kind: "bigquery#queryRequest".to_string(),
            query: query.into(),
            max_results: None,
            default_dataset: None,
            timeout_ms: None,
            use_legacy_sql: None,
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_default_dataset(mut self, dataset: DatasetReference) -> Self {
        self.default_dataset = Some(dataset);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_legacy_sql(mut self, use_legacy_sql: Option<bool>) -> Self {
        self.use_legacy_sql = use_legacy_sql;
        self
    }
}
