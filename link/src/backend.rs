//! The query service as seen by the client.
//!
//! Every call the pager, executor and insert path make goes through
//! [`QueryBackend`]. A [`BackendConnector`] builds a backend bound to one
//! access token; the [`CredentialSession`](crate::auth::CredentialSession)
//! asks for a new one whenever the token is refreshed.
//!
//! [`RestConnector`] is the HTTP implementation. Tests and alternative
//! transports plug in their own connector through
//! [`BqLinkClientBuilder::connector`](crate::BqLinkClientBuilder::connector).

pub mod rest;

use std::sync::Arc;

use crate::auth::AccessToken;
use crate::error::Result;
use crate::models::{
    InsertAllRequest, InsertAllResponse, Job, JobReference, JobResultsResponse, QueryRequest,
    QueryResponse, Table, TableReference,
};

pub use rest::{RestBackend, RestConnector, DEFAULT_BASE_URL};

/// Operations of the warehouse query service.
#[async_trait::async_trait]
pub trait QueryBackend: Send + Sync + 'static {
    /// Submit a query; the first page is inline if it finished in time.
    async fn submit_query(&self, project_id: &str, request: &QueryRequest)
        -> Result<QueryResponse>;

    /// Fetch one page of a job's results.
    async fn get_job_results(
        &self,
        job: &JobReference,
        page_token: Option<&str>,
        max_results: Option<u32>,
    ) -> Result<JobResultsResponse>;

    /// Create a job (used for queries with a destination table).
    async fn insert_job(&self, project_id: &str, job: &Job) -> Result<Job>;

    /// Stream rows into a table.
    async fn insert_all(
        &self,
        table: &TableReference,
        request: &InsertAllRequest,
    ) -> Result<InsertAllResponse>;

    /// Read table metadata, including its schema.
    async fn get_table(&self, table: &TableReference) -> Result<Table>;
}

/// Builds a [`QueryBackend`] authorized by one token.
#[async_trait::async_trait]
pub trait BackendConnector: Send + Sync + 'static {
    async fn connect(&self, token: &AccessToken) -> Result<Arc<dyn QueryBackend>>;
}
