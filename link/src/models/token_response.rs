use serde::{Deserialize, Serialize};

/// OAuth 2.0 token endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for subsequent API calls
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
}
