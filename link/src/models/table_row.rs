use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One raw row as returned by the service: `{"f": [{"v": ...}, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub f: Vec<TableCell>,
}

impl TableRow {
    pub fn new(values: Vec<JsonValue>) -> Self {
        Self {
            f: values.into_iter().map(|v| TableCell { v }).collect(),
        }
    }
}

/// One raw cell. Scalars arrive as strings, `NULL` as JSON null, nested
/// records as `{"f": [...]}` and repeated fields as arrays of cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub v: JsonValue,
}
