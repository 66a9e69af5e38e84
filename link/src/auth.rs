//! Credentials for the warehouse API.
//!
//! A [`CredentialProvider`] turns key material into a short-lived bearer
//! [`AccessToken`]. The [`CredentialSession`] caches that token together
//! with a connected backend handle and refreshes both once the token nears
//! expiry.
//!
//! ```rust,no_run
//! use bq_link::auth::{CredentialProvider, ServiceAccountProvider};
//!
//! # async fn run() -> bq_link::Result<()> {
//! let provider = ServiceAccountProvider::from_key_file("/secrets/service-account.json");
//! let token = provider.fetch_token().await?;
//! println!("token valid until {:?}", token.expires_at);
//! # Ok(())
//! # }
//! ```

pub mod provider;
pub mod service_account;
pub mod session;

pub use provider::{AccessToken, ArcCredentialProvider, CredentialProvider, StaticTokenProvider};
pub use service_account::{ServiceAccountKey, ServiceAccountProvider};
pub use session::{CredentialSession, Session};
