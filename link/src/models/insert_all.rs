use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::error_proto::ErrorProto;
use crate::error::InsertErrorDetail;

/// Request payload for `tables/{table}/insertAll`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllRequest {
    pub kind: String,
    pub rows: Vec<InsertAllRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_invalid_rows: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_unknown_values: Option<bool>,
}

impl InsertAllRequest {
    /// Request carrying exactly one row.
    pub fn single(row: Map<String, JsonValue>) -> Self {
        Self {
            kind: "bigquery#tableDataInsertAllRequest".to_string(),
            rows: vec![InsertAllRow {
                insert_id: None,
                json: row,
            }],
            skip_invalid_rows: None,
            ignore_unknown_values: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllRow {
    /// Best-effort de-duplication key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<String>,
    pub json: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllResponse {
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insert_errors: Vec<RowInsertErrors>,
}

impl InsertAllResponse {
    /// Flatten every per-row error into one list, one entry per failed field.
    pub fn error_details(&self) -> Vec<InsertErrorDetail> {
        let mut details = Vec::new();
        for row in &self.insert_errors {
            for error in &row.errors {
                details.push(InsertErrorDetail {
                    row_index: row.index,
                    location: error.location.clone().filter(|l| !l.is_empty()),
                    reason: error.reason.clone().filter(|r| !r.is_empty()),
                    message: error.message.clone(),
                });
            }
        }
        details
    }
}

/// Errors for one rejected row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowInsertErrors {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}
