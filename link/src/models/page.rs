use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::references::JobReference;
use crate::error::BqLinkError;

/// One result row, cells aligned with the page headers.
pub type Row = Vec<JsonValue>;

/// A formatted page of results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Column names in schema order
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    /// Cursor for the following page, if any
    pub page_token: Option<String>,
    pub job_complete: bool,
    pub job_reference: Option<JobReference>,
    /// Total rows in the whole result, as reported by the backend
    pub total_rows: Option<u64>,
}

impl Page {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Every row of a query, gathered into memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// A unit delivered on a [`QueryStream`](crate::QueryStream).
///
/// `headers` is set on the first event and again whenever the column set
/// changes. An event carrying `error` is always the last one.
#[derive(Debug, Clone)]
pub struct StreamEvent {
    pub headers: Option<Vec<String>>,
    pub rows: Vec<Row>,
    pub error: Option<BqLinkError>,
}

impl StreamEvent {
    pub(crate) fn rows(headers: Option<Vec<String>>, rows: Vec<Row>) -> Self {
        Self {
            headers,
            rows,
            error: None,
        }
    }

    pub(crate) fn failed(error: BqLinkError) -> Self {
        Self {
            headers: None,
            rows: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
