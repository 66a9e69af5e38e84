use serde::{Deserialize, Serialize};

/// Error details attached to failed jobs, rows and HTTP error bodies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorProto {
    /// Short error code, e.g. `invalidQuery`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Where the error occurred (a field name for insert errors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Human-readable error message
    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<String>,
}

/// Envelope of a non-2xx response: `{"error": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}
