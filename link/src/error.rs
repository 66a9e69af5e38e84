//! Error types for bq-link.
//!
//! Every failure surfaced by the client is a [`BqLinkError`]. The type is
//! `Clone` so that a streaming producer can hand the same error to the
//! consumer inside a [`StreamEvent`](crate::StreamEvent).

use std::fmt;

/// Result type for bq-link operations
pub type Result<T> = std::result::Result<T, BqLinkError>;

/// Errors that can occur while talking to the warehouse.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BqLinkError {
    /// Key material could not be read or the token exchange was rejected.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The service rejected a query, job or page request.
    #[error("Backend error ({status_code}): {message}")]
    BackendError { status_code: u16, message: String },

    /// One or more rows of a streaming insert were rejected.
    #[error("Insert failed: {}", InsertErrorList(.0))]
    InsertError(Vec<InsertErrorDetail>),

    /// A page could not be shaped into rows (row limit beyond the data).
    #[error("Format error: {0}")]
    FormatError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout: {0}")]
    TimeoutError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The operation was cancelled before it finished.
    #[error("Operation cancelled")]
    Cancelled,
}

impl BqLinkError {
    /// Build a backend error with a status code of 0 (no HTTP status available).
    pub fn backend(message: impl Into<String>) -> Self {
        Self::BackendError {
            status_code: 0,
            message: message.into(),
        }
    }

    /// True for errors raised while obtaining credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::AuthenticationError(_))
    }
}

/// A single field failure reported by a streaming insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertErrorDetail {
    /// Index of the rejected row within the request
    pub row_index: u32,
    /// Field (or location) that failed, when the service names one
    pub location: Option<String>,
    /// Short machine-readable reason, e.g. `invalid`
    pub reason: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl fmt::Display for InsertErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}", self.row_index)?;
        if let Some(location) = &self.location {
            write!(f, " field '{}'", location)?;
        }
        if let Some(reason) = &self.reason {
            write!(f, " [{}]", reason)?;
        }
        write!(f, ": {}", self.message)
    }
}

struct InsertErrorList<'a>(&'a [InsertErrorDetail]);

impl fmt::Display for InsertErrorList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "no details reported");
        }
        for (i, detail) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", detail)?;
        }
        Ok(())
    }
}

impl From<reqwest::Error> for BqLinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BqLinkError::TimeoutError(err.to_string())
        } else if err.is_decode() {
            BqLinkError::SerializationError(err.to_string())
        } else {
            BqLinkError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BqLinkError {
    fn from(err: serde_json::Error) -> Self {
        BqLinkError::SerializationError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for BqLinkError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                BqLinkError::AuthenticationError(format!("Invalid private key: {}", err))
            },
            _ => BqLinkError::AuthenticationError(format!("Failed to sign assertion: {}", err)),
        }
    }
}

// Key material is the only thing the client reads from disk.
impl From<std::io::Error> for BqLinkError {
    fn from(err: std::io::Error) -> Self {
        BqLinkError::AuthenticationError(format!("Failed to read key material: {}", err))
    }
}
