//! BigQuery v2 REST transport over `reqwest`.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;

use super::{BackendConnector, QueryBackend};
use crate::auth::AccessToken;
use crate::error::{BqLinkError, Result};
use crate::models::{
    ErrorResponse, InsertAllRequest, InsertAllResponse, Job, JobReference, JobResultsResponse,
    QueryRequest, QueryResponse, Table, TableReference,
};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Creates [`RestBackend`]s that share one HTTP client and its pool.
#[derive(Debug, Clone)]
pub struct RestConnector {
    base_url: String,
    http_client: reqwest::Client,
    max_retries: u32,
}

impl RestConnector {
    pub fn new(base_url: impl Into<String>, http_client: reqwest::Client, max_retries: u32) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
            max_retries,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl BackendConnector for RestConnector {
    async fn connect(&self, token: &AccessToken) -> Result<Arc<dyn QueryBackend>> {
        Ok(Arc::new(RestBackend {
            base_url: self.base_url.clone(),
            http_client: self.http_client.clone(),
            token: token.clone(),
            max_retries: self.max_retries,
        }))
    }
}

/// A REST client bound to one access token.
#[derive(Debug, Clone)]
pub struct RestBackend {
    base_url: String,
    http_client: reqwest::Client,
    token: AccessToken,
    max_retries: u32,
}

impl RestBackend {
    /// Send a request, retrying connect and timeout failures with linear
    /// backoff. `build` is called once per attempt since request builders
    /// with bodies cannot be cloned.
    async fn send<T, F>(&self, operation: &str, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut retries = 0;
        let overall_start = Instant::now();

        loop {
            let request = self.token.apply_to_request(build(&self.http_client));

            let attempt_start = Instant::now();
            debug!(
                "[BQ_HTTP] Sending {} (attempt {}/{})",
                operation,
                retries + 1,
                self.max_retries + 1
            );

            match request.send().await {
                Ok(response) => {
                    let http_duration_ms = attempt_start.elapsed().as_millis();
                    let status = response.status();
                    debug!(
                        "[BQ_HTTP] Response received: op={} status={} duration_ms={}",
                        operation, status, http_duration_ms
                    );

                    if status.is_success() {
                        let body: T = response.json().await?;
                        debug!(
                            "[BQ_HTTP] {} done: total_ms={}",
                            operation,
                            overall_start.elapsed().as_millis()
                        );
                        return Ok(body);
                    }

                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    let message = serde_json::from_str::<ErrorResponse>(&error_text)
                        .map(|e| e.error.message)
                        .ok()
                        .filter(|m| !m.is_empty())
                        .unwrap_or(error_text);

                    warn!(
                        "[BQ_HTTP] Server error: op={} status={} message=\"{}\" duration_ms={}",
                        operation, status, message, http_duration_ms
                    );

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(BqLinkError::AuthenticationError(message));
                    }
                    return Err(BqLinkError::BackendError {
                        status_code: status.as_u16(),
                        message,
                    });
                },
                Err(e) if retries < self.max_retries && Self::is_retriable(&e) => {
                    warn!(
                        "[BQ_HTTP] Retriable error (attempt {}/{}): {} duration_ms={}",
                        retries + 1,
                        self.max_retries + 1,
                        e,
                        attempt_start.elapsed().as_millis()
                    );
                    retries += 1;
                    tokio::time::sleep(tokio::time::Duration::from_millis(100 * retries as u64))
                        .await;
                    continue;
                },
                Err(e) => {
                    warn!(
                        "[BQ_HTTP] Fatal error: op={} {} total_ms={}",
                        operation,
                        e,
                        overall_start.elapsed().as_millis()
                    );
                    return Err(e.into());
                },
            }
        }
    }

    fn is_retriable(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    fn table_url(&self, table: &TableReference) -> String {
        format!(
            "{}/projects/{}/datasets/{}/tables/{}",
            self.base_url, table.project_id, table.dataset_id, table.table_id
        )
    }
}

#[async_trait::async_trait]
impl QueryBackend for RestBackend {
    async fn submit_query(
        &self,
        project_id: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse> {
        let url = format!("{}/projects/{}/queries", self.base_url, project_id);
        self.send("jobs.query", |http| http.post(&url).json(request)).await
    }

    async fn get_job_results(
        &self,
        job: &JobReference,
        page_token: Option<&str>,
        max_results: Option<u32>,
    ) -> Result<JobResultsResponse> {
        let url = format!("{}/projects/{}/queries/{}", self.base_url, job.project_id, job.job_id);

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        if let Some(max) = max_results {
            params.push(("maxResults", max.to_string()));
        }
        if let Some(location) = &job.location {
            params.push(("location", location.clone()));
        }

        self.send("jobs.getQueryResults", |http| http.get(&url).query(&params))
            .await
    }

    async fn insert_job(&self, project_id: &str, job: &Job) -> Result<Job> {
        let url = format!("{}/projects/{}/jobs", self.base_url, project_id);
        self.send("jobs.insert", |http| http.post(&url).json(job)).await
    }

    async fn insert_all(
        &self,
        table: &TableReference,
        request: &InsertAllRequest,
    ) -> Result<InsertAllResponse> {
        let url = format!("{}/insertAll", self.table_url(table));
        self.send("tabledata.insertAll", |http| http.post(&url).json(request))
            .await
    }

    async fn get_table(&self, table: &TableReference) -> Result<Table> {
        let url = self.table_url(table);
        self.send("tables.get", |http| http.get(&url)).await
    }
}
