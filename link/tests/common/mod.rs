//! Shared fixtures for integration tests: a scripted in-memory backend that
//! records every call, plus counting and failing credential providers.

#![allow(dead_code)]

use bq_link::auth::{AccessToken, CredentialProvider};
use bq_link::models::{
    InsertAllRequest, InsertAllResponse, Job, JobReference, JobResultsResponse, QueryRequest,
    QueryResponse, Table, TableFieldSchema, TableReference, TableRow, TableSchema,
};
use bq_link::{
    BackendConnector, BqLinkClient, BqLinkError, BqLinkTimeouts, ClientOptions, QueryBackend,
    Result,
};
use chrono::Utc;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded backend call.
#[derive(Debug, Clone)]
pub enum Call {
    SubmitQuery { project_id: String, request: QueryRequest },
    GetJobResults { job: JobReference, page_token: Option<String>, max_results: Option<u32> },
    InsertJob { project_id: String, job: Job },
    InsertAll { table: TableReference, request: InsertAllRequest },
    GetTable { table: TableReference },
}

/// Backend answering from per-operation queues of scripted responses.
#[derive(Default)]
pub struct MockBackend {
    submit: Mutex<VecDeque<Result<QueryResponse>>>,
    results: Mutex<VecDeque<Result<JobResultsResponse>>>,
    jobs: Mutex<VecDeque<Result<Job>>>,
    inserts: Mutex<VecDeque<Result<InsertAllResponse>>>,
    tables: Mutex<VecDeque<Result<Table>>>,
    calls: Mutex<Vec<Call>>,
}

fn next<T>(queue: &Mutex<VecDeque<Result<T>>>, op: &str) -> Result<T> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(BqLinkError::backend(format!("unscripted {} call", op))))
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_submit(&self, response: Result<QueryResponse>) -> &Self {
        self.submit.lock().unwrap().push_back(response);
        self
    }

    pub fn push_results(&self, response: Result<JobResultsResponse>) -> &Self {
        self.results.lock().unwrap().push_back(response);
        self
    }

    pub fn push_job(&self, job: Result<Job>) -> &Self {
        self.jobs.lock().unwrap().push_back(job);
        self
    }

    pub fn push_insert(&self, response: Result<InsertAllResponse>) -> &Self {
        self.inserts.lock().unwrap().push_back(response);
        self
    }

    pub fn push_table(&self, table: Result<Table>) -> &Self {
        self.tables.lock().unwrap().push_back(table);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Page tokens of every get_job_results call, in order.
    pub fn page_tokens(&self) -> Vec<Option<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::GetJobResults { page_token, .. } => Some(page_token),
                _ => None,
            })
            .collect()
    }

    /// Job ids of every get_job_results call, in order.
    pub fn polled_jobs(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::GetJobResults { job, .. } => Some(job.job_id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl QueryBackend for MockBackend {
    async fn submit_query(&self, project_id: &str, request: &QueryRequest) -> Result<QueryResponse> {
        self.record(Call::SubmitQuery {
            project_id: project_id.to_string(),
            request: request.clone(),
        });
        next(&self.submit, "submit_query")
    }

    async fn get_job_results(
        &self,
        job: &JobReference,
        page_token: Option<&str>,
        max_results: Option<u32>,
    ) -> Result<JobResultsResponse> {
        self.record(Call::GetJobResults {
            job: job.clone(),
            page_token: page_token.map(str::to_string),
            max_results,
        });
        next(&self.results, "get_job_results")
    }

    async fn insert_job(&self, project_id: &str, job: &Job) -> Result<Job> {
        self.record(Call::InsertJob {
            project_id: project_id.to_string(),
            job: job.clone(),
        });
        next(&self.jobs, "insert_job")
    }

    async fn insert_all(
        &self,
        table: &TableReference,
        request: &InsertAllRequest,
    ) -> Result<InsertAllResponse> {
        self.record(Call::InsertAll {
            table: table.clone(),
            request: request.clone(),
        });
        next(&self.inserts, "insert_all")
    }

    async fn get_table(&self, table: &TableReference) -> Result<Table> {
        self.record(Call::GetTable { table: table.clone() });
        next(&self.tables, "get_table")
    }
}

/// Hands out the same mock backend for every token, counting connects.
pub struct MockConnector {
    pub backend: Arc<MockBackend>,
    pub connects: AtomicUsize,
}

#[async_trait::async_trait]
impl BackendConnector for MockConnector {
    async fn connect(&self, _token: &AccessToken) -> Result<Arc<dyn QueryBackend>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.backend.clone())
    }
}

/// Issues numbered tokens living `lifetime` from now.
pub struct CountingProvider {
    pub calls: AtomicUsize,
    pub lifetime: chrono::Duration,
}

impl CountingProvider {
    pub fn long_lived() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            lifetime: chrono::Duration::hours(1),
        })
    }

    /// Tokens that are already inside the refresh margin when issued.
    pub fn short_lived() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            lifetime: chrono::Duration::seconds(1),
        })
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CredentialProvider for CountingProvider {
    async fn fetch_token(&self) -> Result<AccessToken> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AccessToken::new(format!("token-{}", n), Some(Utc::now() + self.lifetime)))
    }
}

/// Always fails the credential exchange.
pub struct FailingProvider;

#[async_trait::async_trait]
impl CredentialProvider for FailingProvider {
    async fn fetch_token(&self) -> Result<AccessToken> {
        Err(BqLinkError::AuthenticationError("key file not found".into()))
    }
}

pub struct TestClient {
    pub client: BqLinkClient,
    pub backend: Arc<MockBackend>,
    pub connector: Arc<MockConnector>,
}

/// Client over `backend` with long-lived tokens and no poll delay.
pub fn client_with(backend: Arc<MockBackend>) -> TestClient {
    client_with_provider(backend, CountingProvider::long_lived(), ClientOptions::default())
}

pub fn client_with_provider(
    backend: Arc<MockBackend>,
    provider: Arc<dyn CredentialProvider>,
    options: ClientOptions,
) -> TestClient {
    let connector = Arc::new(MockConnector {
        backend: backend.clone(),
        connects: AtomicUsize::new(0),
    });
    let timeouts = BqLinkTimeouts::builder()
        .token_refresh_margin(Duration::from_secs(10))
        .job_poll_interval(Duration::ZERO)
        .build();
    let client = BqLinkClient::builder()
        .credential_provider(provider)
        .connector(connector.clone())
        .timeouts(timeouts)
        .options(options)
        .build()
        .expect("client should build");
    TestClient {
        client,
        backend,
        connector,
    }
}

// ==================== Response builders ====================

pub fn schema(columns: &[&str]) -> TableSchema {
    TableSchema::new(
        columns
            .iter()
            .map(|name| TableFieldSchema::new(*name, "STRING"))
            .collect(),
    )
}

pub fn rows(values: &[&[JsonValue]]) -> Vec<TableRow> {
    values.iter().map(|r| TableRow::new(r.to_vec())).collect()
}

pub fn job_ref(job_id: &str) -> JobReference {
    JobReference::new("proj", job_id)
}

/// Complete inline answer to a submitted query.
pub fn complete_query(
    columns: &[&str],
    data: &[&[JsonValue]],
    total_rows: u64,
    job_id: &str,
    page_token: Option<&str>,
) -> QueryResponse {
    QueryResponse {
        kind: "bigquery#queryResponse".into(),
        schema: Some(schema(columns)),
        job_reference: Some(job_ref(job_id)),
        total_rows: Some(total_rows),
        page_token: page_token.map(str::to_string),
        rows: rows(data),
        job_complete: true,
        ..Default::default()
    }
}

/// Submitted query still running when the request returned.
pub fn running_query(job_id: &str) -> QueryResponse {
    QueryResponse {
        job_reference: Some(job_ref(job_id)),
        job_complete: false,
        ..Default::default()
    }
}

/// One complete page of job results.
pub fn results_page(
    columns: Option<&[&str]>,
    data: &[&[JsonValue]],
    total_rows: u64,
    page_token: Option<&str>,
) -> JobResultsResponse {
    JobResultsResponse {
        schema: columns.map(schema),
        total_rows: Some(total_rows),
        page_token: page_token.map(str::to_string),
        rows: rows(data),
        job_complete: true,
        ..Default::default()
    }
}

/// Job results reply for a job that has not finished.
pub fn results_pending() -> JobResultsResponse {
    JobResultsResponse {
        job_complete: false,
        ..Default::default()
    }
}
