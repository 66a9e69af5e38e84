//! Service-account credentials exchanged through the OAuth 2.0 JWT-bearer
//! grant (RFC 7523).
//!
//! The provider signs a short-lived RS256 assertion with the account's
//! private key and posts it to the token endpoint. Key files are read on
//! every exchange, so a rotated key is picked up at the next refresh and a
//! missing file surfaces as [`BqLinkError::AuthenticationError`] rather
//! than at construction time.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::provider::{AccessToken, CredentialProvider};
use crate::error::{BqLinkError, Result};
use crate::models::TokenResponse;

/// OAuth token endpoint used when the key does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Scope granting query and insert access.
pub const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertion lifetime; the token endpoint rejects anything above one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Fallback token lifetime when the endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Upper bound on a reported `expires_in`; larger values are clamped.
const MAX_TOKEN_LIFETIME_SECS: u64 = 86_400;

/// The fields of a service-account JSON key the client needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ServiceAccountKey {
    /// Parse a downloaded JSON key.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| BqLinkError::AuthenticationError(format!("Invalid service account key: {}", e)))
    }

    /// A key made of a bare PEM private key and the account email.
    pub fn from_pem(client_email: impl Into<String>, private_key_pem: impl Into<String>) -> Self {
        Self {
            client_email: client_email.into(),
            private_key: private_key_pem.into(),
            private_key_id: None,
            token_uri: None,
            project_id: None,
        }
    }
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Clone)]
enum KeySource {
    /// JSON key file, read at each exchange
    KeyFile(PathBuf),
    /// PEM private key file plus the account email
    PemFile { path: PathBuf, client_email: String },
    Loaded(ServiceAccountKey),
}

/// [`CredentialProvider`] for service accounts.
#[derive(Debug, Clone)]
pub struct ServiceAccountProvider {
    source: KeySource,
    scopes: Vec<String>,
    token_uri: Option<String>,
    http: reqwest::Client,
}

impl ServiceAccountProvider {
    fn with_source(source: KeySource) -> Self {
        Self {
            source,
            scopes: vec![BIGQUERY_SCOPE.to_string()],
            token_uri: None,
            http: reqwest::Client::new(),
        }
    }

    /// Use a JSON key file, e.g. the path in `GOOGLE_APPLICATION_CREDENTIALS`.
    pub fn from_key_file(path: impl Into<PathBuf>) -> Self {
        Self::with_source(KeySource::KeyFile(path.into()))
    }

    /// Use a PEM private key file together with the account email.
    pub fn from_pem_file(path: impl Into<PathBuf>, client_email: impl Into<String>) -> Self {
        Self::with_source(KeySource::PemFile {
            path: path.into(),
            client_email: client_email.into(),
        })
    }

    /// Use an already parsed key.
    pub fn from_key(key: ServiceAccountKey) -> Self {
        Self::with_source(KeySource::Loaded(key))
    }

    /// Override the token endpoint (also overrides the key's `token_uri`).
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = Some(token_uri.into());
        self
    }

    /// Replace the requested scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Share an HTTP client (and its connection pool) with the provider.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    async fn load_key(&self) -> Result<ServiceAccountKey> {
        match &self.source {
            KeySource::Loaded(key) => Ok(key.clone()),
            KeySource::KeyFile(path) => {
                debug!("[BQ_AUTH] Reading service account key from {}", path.display());
                let json = tokio::fs::read_to_string(path).await.map_err(|e| {
                    BqLinkError::AuthenticationError(format!(
                        "Failed to read key file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                ServiceAccountKey::from_json(&json)
            },
            KeySource::PemFile { path, client_email } => {
                debug!("[BQ_AUTH] Reading PEM key from {}", path.display());
                let pem = tokio::fs::read_to_string(path).await.map_err(|e| {
                    BqLinkError::AuthenticationError(format!(
                        "Failed to read PEM file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(ServiceAccountKey::from_pem(client_email.clone(), pem))
            },
        }
    }

    fn token_uri_for<'a>(&'a self, key: &'a ServiceAccountKey) -> &'a str {
        self.token_uri
            .as_deref()
            .or(key.token_uri.as_deref())
            .unwrap_or(DEFAULT_TOKEN_URI)
    }
}

/// Sign the JWT-bearer assertion for `key`, issued at `issued_at` (unix seconds).
pub(crate) fn sign_assertion(
    key: &ServiceAccountKey,
    scopes: &[String],
    audience: &str,
    issued_at: i64,
) -> Result<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let claims = AssertionClaims {
        iss: key.client_email.clone(),
        scope: scopes.join(" "),
        aud: audience.to_string(),
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(encode(&header, &claims, &encoding_key)?)
}

fn token_lifetime(expires_in: Option<u64>) -> chrono::Duration {
    let secs = expires_in
        .map(|secs| secs.min(MAX_TOKEN_LIFETIME_SECS) as i64)
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    chrono::Duration::seconds(secs)
}

#[async_trait::async_trait]
impl CredentialProvider for ServiceAccountProvider {
    async fn fetch_token(&self) -> Result<AccessToken> {
        let key = self.load_key().await?;
        let token_uri = self.token_uri_for(&key).to_string();
        let now = Utc::now();
        let assertion = sign_assertion(&key, &self.scopes, &token_uri, now.timestamp())?;

        debug!("[BQ_AUTH] Exchanging assertion for {} at {}", key.client_email, token_uri);

        let response = self
            .http
            .post(&token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BqLinkError::AuthenticationError(format!(
                "Token exchange failed ({}): {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            BqLinkError::AuthenticationError(format!("Invalid token response: {}", e))
        })?;

        let expires_at = now + token_lifetime(token.expires_in);
        debug!("[BQ_AUTH] Token issued, expires at {}", expires_at);

        Ok(AccessToken::new(token.access_token, Some(expires_at)))
    }
}
