//! Cached token plus backend handle, shared by every query of a client.

use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::provider::{AccessToken, ArcCredentialProvider};
use crate::backend::{BackendConnector, QueryBackend};
use crate::error::{BqLinkError, Result};

/// A usable token and the backend it authorizes.
#[derive(Clone)]
pub struct Session {
    pub token: AccessToken,
    pub backend: Arc<dyn QueryBackend>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Lazily established, refreshed-on-expiry credential session.
///
/// The lock is held across the token exchange, so concurrent callers that
/// find the token expired wait for one refresh instead of each running
/// their own.
pub struct CredentialSession {
    provider: ArcCredentialProvider,
    connector: Arc<dyn BackendConnector>,
    refresh_margin: Duration,
    current: Mutex<Option<Session>>,
}

impl CredentialSession {
    pub fn new(
        provider: ArcCredentialProvider,
        connector: Arc<dyn BackendConnector>,
        refresh_margin: Duration,
    ) -> Self {
        Self {
            provider,
            connector,
            refresh_margin,
            current: Mutex::new(None),
        }
    }

    /// Return the cached session, refreshing it first if the token is
    /// missing or expires within the refresh margin.
    pub async fn acquire(&self) -> Result<Session> {
        let mut current = self.current.lock().await;

        if let Some(session) = current.as_ref() {
            if !session.token.is_expired(self.refresh_margin) {
                return Ok(session.clone());
            }
            debug!("[BQ_AUTH] Token expired or near expiry, refreshing");
        } else {
            debug!("[BQ_AUTH] No session yet, exchanging credentials");
        }

        let token = self.provider.fetch_token().await.map_err(as_auth_error)?;
        let backend = self.connector.connect(&token).await.map_err(as_auth_error)?;

        let session = Session { token, backend };
        *current = Some(session.clone());
        Ok(session)
    }

    /// Forget the cached session so the next [`acquire`](Self::acquire)
    /// exchanges credentials again. Called after the backend rejects a token.
    pub async fn invalidate(&self) {
        debug!("[BQ_AUTH] Session invalidated");
        *self.current.lock().await = None;
    }

    /// Pass `result` through, dropping the session first if the backend
    /// rejected its token.
    pub(crate) async fn check<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_auth_error() {
                self.invalidate().await;
            }
        }
        result
    }

    /// True when a non-expired session is cached.
    pub async fn is_active(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| !s.token.is_expired(self.refresh_margin))
    }
}

impl std::fmt::Debug for CredentialSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSession")
            .field("refresh_margin", &self.refresh_margin)
            .finish_non_exhaustive()
    }
}

fn as_auth_error(err: BqLinkError) -> BqLinkError {
    match err {
        BqLinkError::AuthenticationError(_) => err,
        other => BqLinkError::AuthenticationError(other.to_string()),
    }
}
