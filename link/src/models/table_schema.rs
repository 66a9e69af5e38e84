use serde::{Deserialize, Serialize};

/// Column layout of a result set or table.
///
/// # Example (JSON representation)
///
/// ```json
/// {"fields": [{"name": "id", "type": "INTEGER"}, {"name": "name", "type": "STRING"}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<TableFieldSchema>,
}

impl TableSchema {
    pub fn new(fields: Vec<TableFieldSchema>) -> Self {
        Self { fields }
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A single column of a [`TableSchema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFieldSchema {
    /// Column name
    pub name: String,

    /// Warehouse type name (`STRING`, `INTEGER`, `RECORD`, ...)
    #[serde(rename = "type", default)]
    pub field_type: String,

    /// `NULLABLE`, `REQUIRED` or `REPEATED`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Nested columns for `RECORD` fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<TableFieldSchema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TableFieldSchema {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            mode: None,
            fields: Vec::new(),
            description: None,
        }
    }
}
