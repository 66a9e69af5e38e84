//! Main bq-link client with builder pattern.
//!
//! Provides the primary interface for authenticating against the warehouse
//! and running, paging and streaming queries.

use log::{debug, warn};
use serde_json::{Map, Value as JsonValue};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    auth::{
        ArcCredentialProvider, CredentialSession, ServiceAccountKey, ServiceAccountProvider,
        StaticTokenProvider,
    },
    backend::{BackendConnector, RestConnector, DEFAULT_BASE_URL},
    error::{BqLinkError, Result},
    models::{
        ClientOptions, InsertAllRequest, QueryResult, QuerySpec, Row, TableReference,
        TableSchema,
    },
    paging::Pager,
    query::QueryExecutor,
    stream::QueryStream,
    timeouts::BqLinkTimeouts,
};

/// Environment variable naming a service-account JSON key file.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Environment variable overriding the API root (emulators, proxies).
pub const BASE_URL_ENV: &str = "BQ_LINK_BASE_URL";

/// Main bq-link client.
///
/// Cheap to clone; clones share one credential session, so a token
/// refreshed by one query is reused by all of them.
///
/// # Examples
///
/// ```rust,no_run
/// use bq_link::{BqLinkClient, QuerySpec};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = BqLinkClient::builder()
///     .key_file("/secrets/service-account.json")
///     .build()?;
///
/// let spec = QuerySpec::new("my-project", "samples", "SELECT word FROM shakespeare");
/// let result = client.run_query(spec).await?;
/// println!("{:?}: {} rows", result.headers, result.rows.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BqLinkClient {
    session: Arc<CredentialSession>,
    query_executor: QueryExecutor,
    options: ClientOptions,
    timeouts: BqLinkTimeouts,
}

impl BqLinkClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> BqLinkClientBuilder {
        BqLinkClientBuilder::new()
    }

    /// Run a query to completion and return every row.
    pub async fn run_query(&self, spec: QuerySpec) -> Result<QueryResult> {
        self.pager(spec).collect().await
    }

    /// Run a query on a background task, delivering pages as they arrive.
    ///
    /// Must be called from within a tokio runtime.
    pub fn stream_query(&self, spec: QuerySpec) -> QueryStream {
        QueryStream::spawn(self.pager(spec), self.options.stream_channel_capacity)
    }

    /// Page through a query manually with [`Pager::next_page`].
    pub fn pager(&self, spec: QuerySpec) -> Pager {
        Pager::new(
            self.session.clone(),
            spec,
            self.options.clone(),
            self.timeouts.job_poll_interval,
        )
    }

    /// Run a query bounded to `max_results` rows in a single request.
    ///
    /// Fails with [`BqLinkError::TimeoutError`] if the service does not
    /// finish the query within that request.
    pub async fn query(&self, spec: &QuerySpec, max_results: u32) -> Result<Vec<Row>> {
        self.query_executor.query(spec, max_results).await
    }

    /// Row count of a table. Returns 0 if the count cannot be obtained.
    pub async fn count(&self, project_id: &str, dataset_id: &str, table_id: &str) -> i64 {
        self.query_executor
            .count(project_id, dataset_id, table_id)
            .await
    }

    /// Stream one row into a table.
    ///
    /// Rejected fields are reported together in one
    /// [`BqLinkError::InsertError`].
    pub async fn insert_row(
        &self,
        project_id: &str,
        dataset_id: &str,
        table_id: &str,
        row: Map<String, JsonValue>,
    ) -> Result<()> {
        let table = TableReference::new(project_id, dataset_id, table_id);
        let request = InsertAllRequest::single(row);

        debug!("[BQ_QUERY] Inserting row into {}", table);
        let session = self.session.acquire().await?;
        let response = self
            .session
            .check(session.backend.insert_all(&table, &request).await)
            .await?;

        let details = response.error_details();
        if details.is_empty() && response.insert_errors.is_empty() {
            return Ok(());
        }
        warn!(
            "[BQ_QUERY] Insert into {} rejected: {} field errors",
            table,
            details.len()
        );
        Err(BqLinkError::InsertError(details))
    }

    /// Column layout of an existing table.
    pub async fn table_schema(
        &self,
        project_id: &str,
        dataset_id: &str,
        table_id: &str,
    ) -> Result<TableSchema> {
        let table = TableReference::new(project_id, dataset_id, table_id);
        debug!("[BQ_QUERY] Reading schema of {}", table);
        let session = self.session.acquire().await?;
        let metadata = self
            .session
            .check(session.backend.get_table(&table).await)
            .await?;
        Ok(metadata.schema)
    }

    /// Drop the cached token; the next call exchanges credentials again.
    pub async fn invalidate_session(&self) {
        self.session.invalidate().await;
    }

    /// Get the configured timeouts
    pub fn timeouts(&self) -> &BqLinkTimeouts {
        &self.timeouts
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}

impl std::fmt::Debug for BqLinkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BqLinkClient")
            .field("options", &self.options)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

enum Credentials {
    KeyFile(PathBuf),
    Key(ServiceAccountKey),
    PemFile { path: PathBuf, client_email: String },
    Provider(ArcCredentialProvider),
}

/// Builder for configuring [`BqLinkClient`] instances.
pub struct BqLinkClientBuilder {
    base_url: Option<String>,
    credentials: Option<Credentials>,
    token_uri: Option<String>,
    connector: Option<Arc<dyn BackendConnector>>,
    max_retries: u32,
    timeouts: BqLinkTimeouts,
    options: ClientOptions,
}

impl BqLinkClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            credentials: None,
            token_uri: None,
            connector: None,
            max_retries: 3,
            timeouts: BqLinkTimeouts::default(),
            options: ClientOptions::default(),
        }
    }

    /// Pre-populate the builder from the process environment.
    ///
    /// Reads the key file path from `GOOGLE_APPLICATION_CREDENTIALS` and an
    /// optional API root from `BQ_LINK_BASE_URL`. Unset variables leave the
    /// corresponding setting untouched.
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        if let Ok(path) = std::env::var(CREDENTIALS_ENV) {
            if !path.trim().is_empty() {
                builder = builder.key_file(path);
            }
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                builder = builder.base_url(url);
            }
        }
        builder
    }

    /// Set the API root. Default: `https://bigquery.googleapis.com/bigquery/v2`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Authenticate with a service-account JSON key file.
    ///
    /// The file is read when a token is first needed, not here.
    pub fn key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials = Some(Credentials::KeyFile(path.into()));
        self
    }

    /// Authenticate with an already parsed service-account key.
    pub fn service_account_key(mut self, key: ServiceAccountKey) -> Self {
        self.credentials = Some(Credentials::Key(key));
        self
    }

    /// Authenticate with a PEM private key file and the account email.
    pub fn pem_file(mut self, path: impl Into<PathBuf>, client_email: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::PemFile {
            path: path.into(),
            client_email: client_email.into(),
        });
        self
    }

    /// Use a pre-issued bearer token.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::Provider(Arc::new(StaticTokenProvider::new(token))));
        self
    }

    /// Use a custom credential provider.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use bq_link::{BqLinkClient, auth::StaticTokenProvider};
    /// use std::sync::Arc;
    ///
    /// # fn example() -> bq_link::Result<()> {
    /// let client = BqLinkClient::builder()
    ///     .credential_provider(Arc::new(StaticTokenProvider::new("ya29.token")))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn credential_provider(mut self, provider: ArcCredentialProvider) -> Self {
        self.credentials = Some(Credentials::Provider(provider));
        self
    }

    /// Override the OAuth token endpoint used for service-account keys.
    pub fn token_uri(mut self, uri: impl Into<String>) -> Self {
        self.token_uri = Some(uri.into());
        self
    }

    /// Replace the REST transport, e.g. with an in-memory backend in tests.
    pub fn connector(mut self, connector: Arc<dyn BackendConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Set maximum number of retries for requests that failed to connect or timed out
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set comprehensive timeout configuration for all operations
    pub fn timeouts(mut self, timeouts: BqLinkTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the request timeout only.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request_timeout = timeout;
        self
    }

    /// Set client-wide query defaults
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<BqLinkClient> {
        let credentials = self.credentials.ok_or_else(|| {
            BqLinkError::ConfigurationError(format!(
                "no credentials configured (set {} or call key_file/access_token)",
                CREDENTIALS_ENV
            ))
        })?;

        // Keep-alive pooling: paging issues many small requests to one host.
        let http_client = reqwest::Client::builder()
            .timeout(self.timeouts.request_timeout)
            .connect_timeout(self.timeouts.connection_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| BqLinkError::ConfigurationError(e.to_string()))?;

        let service_account = |provider: ServiceAccountProvider| -> ArcCredentialProvider {
            let provider = provider.with_http_client(http_client.clone());
            match &self.token_uri {
                Some(uri) => Arc::new(provider.with_token_uri(uri.clone())),
                None => Arc::new(provider),
            }
        };
        let provider: ArcCredentialProvider = match credentials {
            Credentials::KeyFile(path) => service_account(ServiceAccountProvider::from_key_file(path)),
            Credentials::Key(key) => service_account(ServiceAccountProvider::from_key(key)),
            Credentials::PemFile { path, client_email } => {
                service_account(ServiceAccountProvider::from_pem_file(path, client_email))
            },
            Credentials::Provider(provider) => provider,
        };

        let connector: Arc<dyn BackendConnector> = match self.connector {
            Some(connector) => connector,
            None => {
                let base_url = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
                debug!("[BQ_CLIENT] Using REST backend at {}", base_url);
                Arc::new(RestConnector::new(base_url, http_client.clone(), self.max_retries))
            },
        };

        let session = Arc::new(CredentialSession::new(
            provider,
            connector,
            self.timeouts.token_refresh_margin,
        ));
        let query_executor = QueryExecutor::new(session.clone(), self.options.clone());

        Ok(BqLinkClient {
            session,
            query_executor,
            options: self.options,
            timeouts: self.timeouts,
        })
    }
}
