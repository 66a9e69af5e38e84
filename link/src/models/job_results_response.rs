use serde::{Deserialize, Serialize};

use super::error_proto::ErrorProto;
use super::references::JobReference;
use super::table_row::TableRow;
use super::table_schema::TableSchema;
use super::utils::u64_string;

/// Response of `GET projects/{project}/queries/{jobId}`.
///
/// Same tabular payload as [`QueryResponse`](super::QueryResponse), plus the
/// etag of the result set. Some completion replies carry rows without a
/// schema; callers keep the headers they already have in that case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResultsResponse {
    #[serde(default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<JobReference>,

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
