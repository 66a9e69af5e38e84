use serde::{Deserialize, Serialize};

use super::error_proto::ErrorProto;
use super::references::JobReference;
use super::table_row::TableRow;
use super::table_schema::TableSchema;
use super::utils::u64_string;

/// Response of `POST projects/{project}/queries`.
///
/// When the query finishes within the request, `job_complete` is true and
/// the first page of rows is inline. Otherwise only the job reference is
/// meaningful and results must be fetched with
/// [`JobResultsResponse`](super::JobResultsResponse) calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<JobReference>,

    /// Total rows of the complete result set (not just this page)
    #[serde(default, with = "u64_string", skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<TableRow>,

    #[serde(default)]
    pub job_complete: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorProto>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_hit: Option<bool>,
}
