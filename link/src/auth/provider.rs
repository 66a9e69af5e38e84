//! Token sources.
//!
//! ## Custom providers
//!
//! Implement [`CredentialProvider`] to obtain tokens from anywhere else (a
//! metadata server, a secret manager, an interactive login). It is called
//! whenever the session has no token or the cached one is about to expire.
//!
//! ```rust,no_run
//! use bq_link::auth::{AccessToken, CredentialProvider};
//!
//! struct VaultTokens;
//!
//! #[async_trait::async_trait]
//! impl CredentialProvider for VaultTokens {
//!     async fn fetch_token(&self) -> bq_link::Result<AccessToken> {
//!         Ok(AccessToken::new("ya29.fresh-token", None))
//!     }
//! }
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// A bearer token and the instant it stops being accepted.
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    /// `None` means the token never expires (pre-issued tokens)
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// True if the token expires within `margin` from now.
    pub fn is_expired(&self, margin: Duration) -> bool {
        match self.expires_at {
            None => false,
            Some(expires_at) => {
                let margin =
                    chrono::Duration::from_std(margin).unwrap_or_else(|_| chrono::Duration::zero());
                Utc::now() + margin >= expires_at
            },
        }
    }

    /// Attach `Authorization: Bearer <token>` to an HTTP request.
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(&self.token)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Exchanges key material for an [`AccessToken`].
#[async_trait::async_trait]
pub trait CredentialProvider: Send + Sync + 'static {
    /// Return a freshly issued token.
    async fn fetch_token(&self) -> Result<AccessToken>;
}

/// A reference-counted [`CredentialProvider`].
pub type ArcCredentialProvider = Arc<dyn CredentialProvider>;

/// Hands out one pre-issued token, e.g. from `gcloud auth print-access-token`.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token, None),
        }
    }

    /// A pre-issued token with a known expiry.
    pub fn with_expiry(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: AccessToken::new(token, Some(expires_at)),
        }
    }
}

#[async_trait::async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn fetch_token(&self) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}
