use serde::{Deserialize, Serialize};

use super::references::{DatasetReference, TableReference};
use crate::error::{BqLinkError, Result};

/// One query execution request.
///
/// A spec is cloned into the pager when execution starts, so later edits to
/// the caller's copy never affect a running query.
///
/// # Example
///
/// ```rust
/// use bq_link::QuerySpec;
///
/// let spec = QuerySpec::new("my-project", "analytics", "SELECT * FROM events")
///     .with_page_size(250)
///     .with_large_results("events_tmp");
/// assert!(spec.validate().is_ok());
/// assert!(spec.uses_large_result_path());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Project billed for the query and owning its jobs
    pub project_id: String,

    /// Default dataset for unqualified table names. Also hosts the temp table.
    #[serde(default)]
    pub dataset_id: String,

    /// SQL text, passed through unchanged
    pub query: String,

    /// Rows per page. `None` uses [`ClientOptions::default_page_size`](super::ClientOptions).
    #[serde(default)]
    pub page_size: Option<u32>,

    /// Route the query through a destination table so results above the
    /// inline response limit can be read back.
    #[serde(default)]
    pub allow_large_results: bool,

    /// Destination table name for the large-result path
    #[serde(default)]
    pub temp_table: Option<String>,

    /// `None` uses the client-wide dialect
    #[serde(default)]
    pub use_legacy_sql: Option<bool>,
}

impl QuerySpec {
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            query: query.into(),
            page_size: None,
            allow_large_results: false,
            temp_table: None,
            use_legacy_sql: None,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Enable the large-result path, writing into `temp_table`.
    pub fn with_large_results(mut self, temp_table: impl Into<String>) -> Self {
        self.allow_large_results = true;
        self.temp_table = Some(temp_table.into());
        self
    }

    pub fn with_allow_large_results(mut self, allow: bool) -> Self {
        self.allow_large_results = allow;
        self
    }

    pub fn with_temp_table(mut self, temp_table: impl Into<String>) -> Self {
        self.temp_table = Some(temp_table.into());
        self
    }

    pub fn with_legacy_sql(mut self, use_legacy_sql: bool) -> Self {
        self.use_legacy_sql = Some(use_legacy_sql);
        self
    }

    /// Check the spec before any backend call is made.
    pub fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(BqLinkError::ConfigurationError("project_id is required".into()));
        }
        if self.query.trim().is_empty() {
            return Err(BqLinkError::ConfigurationError("query is empty".into()));
        }
        if self.page_size == Some(0) {
            return Err(BqLinkError::ConfigurationError("page_size must be positive".into()));
        }
        if self.allow_large_results {
            match self.temp_table.as_deref() {
                Some(t) if !t.trim().is_empty() => {},
                _ => {
                    return Err(BqLinkError::ConfigurationError(
                        "allow_large_results requires a temp_table".into(),
                    ));
                },
            }
            if self.dataset_id.trim().is_empty() {
                return Err(BqLinkError::ConfigurationError(
                    "allow_large_results requires a dataset_id for the temp table".into(),
                ));
            }
        }
        Ok(())
    }

    /// True when the query should be run as a job writing to `temp_table`.
    pub fn uses_large_result_path(&self) -> bool {
        self.allow_large_results && self.temp_table.is_some()
    }

    /// The default dataset, if one was named.
    pub fn default_dataset(&self) -> Option<DatasetReference> {
        if self.dataset_id.is_empty() {
            None
        } else {
            Some(DatasetReference::new(&self.project_id, &self.dataset_id))
        }
    }

    /// Destination of the large-result path.
    pub fn temp_table_reference(&self) -> Option<TableReference> {
        self.temp_table
            .as_ref()
            .map(|t| TableReference::new(&self.project_id, &self.dataset_id, t))
    }
}
