use serde::{Deserialize, Serialize};

use super::references::TableReference;
use super::table_schema::TableSchema;
use super::utils::u64_string;

/// Table metadata returned by `GET .../tables/{table}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub table_reference: TableReference,

    #[serde(default)]
    pub schema: TableSchema,

    #[serde(default, with = "u64_string", skip_serializing_if = "Option::is_none")]
    pub num_rows: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
