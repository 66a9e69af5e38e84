//! # bq-link: warehouse query client
//!
//! A client library for a BigQuery-style data warehouse. It authenticates
//! with service-account credentials and runs SQL queries, returning
//! results buffered, streamed, or one page at a time.
//!
//! ## Features
//!
//! - **Paging**: follows job references and page tokens until every row of
//!   a result has been read, re-polling jobs that are still running
//! - **Streaming**: pages delivered over a bounded channel as they arrive
//! - **Large results**: optional destination-table path for results too
//!   big to return inline
//! - **Credential session**: one cached token per client, refreshed shortly
//!   before it expires
//! - **Configurable Timeouts**: connect/request timeouts, refresh margin
//!   and job poll interval
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bq_link::{BqLinkClient, QuerySpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BqLinkClient::builder()
//!         .key_file("/secrets/service-account.json")
//!         .build()?;
//!
//!     // Buffered
//!     let spec = QuerySpec::new("my-project", "samples", "SELECT word, word_count FROM shakespeare");
//!     let result = client.run_query(spec.clone()).await?;
//!     println!("{:?}: {} rows", result.headers, result.rows.len());
//!
//!     // Streamed
//!     let mut stream = client.stream_query(spec);
//!     while let Some(event) = stream.next().await {
//!         if let Some(err) = event.error {
//!             return Err(err.into());
//!         }
//!         println!("batch of {} rows", event.rows.len());
//!     }
//!
//!     println!("{} rows", client.count("my-project", "samples", "shakespeare").await);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod backend;
pub mod client;
pub mod error;
pub mod formatter;
pub mod models;
pub mod paging;
pub mod query;
pub mod stream;
pub mod timeouts;

// Re-export main types for convenience
pub use auth::{AccessToken, CredentialProvider, CredentialSession, ServiceAccountProvider};
pub use backend::{BackendConnector, QueryBackend, RestConnector};
pub use client::{BqLinkClient, BqLinkClientBuilder};
pub use error::{BqLinkError, InsertErrorDetail, Result};
pub use models::{
    ClientOptions, JobReference, Page, QueryResult, QuerySpec, Row, StreamEvent, TableSchema,
};
pub use paging::Pager;
pub use query::QueryExecutor;
pub use stream::QueryStream;
pub use timeouts::{BqLinkTimeouts, BqLinkTimeoutsBuilder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
