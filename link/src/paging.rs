//! Page-at-a-time query execution.
//!
//! A [`Pager`] owns one execution. It submits the query (or, on the
//! large-result path, a job writing into a temp table), then follows the
//! job reference and page tokens the service hands back until every row
//! has been delivered:
//!
//! ```text
//!   Submit ──complete, all rows──────────────────────────────▶ Done
//!     │
//!     └──more rows / not complete──▶ Continue(job, token) ──▶ Done
//!                                       ▲      │
//!                                       └──────┘ next page / re-poll
//! ```
//!
//! Fetches are strictly sequential, and the credential session is
//! re-acquired before each one so a token that expires mid-scan is
//! refreshed transparently. Any failure ends the execution; the pager never
//! retries a page on its own.

use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::auth::CredentialSession;
use crate::error::{BqLinkError, Result};
use crate::formatter::format_all;
use crate::models::{ClientOptions, Job, JobReference, Page, QueryResult, QuerySpec};
use crate::query::{build_request, preview};

enum Stage {
    Submit,
    Continue(Cursor),
    Done,
}

/// Where the next continuation fetch starts.
struct Cursor {
    job: Option<JobReference>,
    page_token: Option<String>,
    total_rows: Option<u64>,
}

/// Iterates the pages of one query execution.
///
/// ```rust,no_run
/// # async fn run(client: bq_link::BqLinkClient) -> bq_link::Result<()> {
/// use bq_link::QuerySpec;
///
/// let spec = QuerySpec::new("my-project", "logs", "SELECT * FROM requests").with_page_size(500);
/// let mut pager = client.pager(spec);
/// while let Some(page) = pager.next_page().await? {
///     println!("{} rows", page.rows.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Pager {
    session: Arc<CredentialSession>,
    spec: QuerySpec,
    options: ClientOptions,
    page_size: u32,
    poll_interval: Duration,
    cancel: CancellationToken,
    stage: Stage,
    headers: Vec<String>,
    delivered: u64,
}

impl Pager {
    pub(crate) fn new(
        session: Arc<CredentialSession>,
        spec: QuerySpec,
        options: ClientOptions,
        poll_interval: Duration,
    ) -> Self {
        let page_size = spec.page_size.unwrap_or(options.default_page_size).max(1);
        Self {
            session,
            spec,
            options,
            page_size,
            poll_interval,
            cancel: CancellationToken::new(),
            stage: Stage::Submit,
            headers: Vec::new(),
            delivered: 0,
        }
    }

    /// Token that aborts this execution at its next step.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Replace the cancellation token, e.g. with a child of a shutdown token.
    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Latest known column names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Rows delivered so far.
    pub fn rows_delivered(&self) -> u64 {
        self.delivered
    }

    pub fn is_done(&self) -> bool {
        matches!(self.stage, Stage::Done)
    }

    /// Fetch the next page, or `None` once every row has been delivered.
    ///
    /// After an error the pager is finished and returns `Ok(None)`.
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        match self.advance().await {
            Ok(page) => Ok(page),
            Err(e) => {
                debug!("[BQ_PAGER] Execution failed after {} rows: {}", self.delivered, e);
                self.stage = Stage::Done;
                Err(e)
            },
        }
    }

    /// Drain the pager into one buffered result.
    pub async fn collect(mut self) -> Result<QueryResult> {
        let mut rows = Vec::new();
        while let Some(page) = self.next_page().await? {
            rows.extend(page.rows);
        }
        Ok(QueryResult {
            headers: self.headers,
            rows,
        })
    }

    async fn advance(&mut self) -> Result<Option<Page>> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(BqLinkError::Cancelled);
            }

            match std::mem::replace(&mut self.stage, Stage::Done) {
                Stage::Done => return Ok(None),
                Stage::Submit => {
                    if let Some(page) = self.submit().await? {
                        return Ok(Some(page));
                    }
                },
                Stage::Continue(cursor) => {
                    if let Some(page) = self.continue_job(cursor).await? {
                        return Ok(Some(page));
                    }
                },
            }
        }
    }

    /// Start the execution. Returns the first page when the service answers
    /// it inline; otherwise leaves the pager in `Continue`.
    async fn submit(&mut self) -> Result<Option<Page>> {
        self.spec.validate()?;
        let session = self.session.acquire().await?;

        if self.spec.uses_large_result_path() {
            let destination = self.spec.temp_table_reference().ok_or_else(|| {
                BqLinkError::ConfigurationError("allow_large_results requires a temp_table".into())
            })?;
            debug!(
                "[BQ_PAGER] Inserting large-result job into {}: \"{}\"",
                destination,
                preview(&self.spec.query)
            );

            let job = Job::query_to_table(
                self.spec.query.clone(),
                self.spec.default_dataset(),
                destination,
                Some(self.spec.use_legacy_sql.unwrap_or(self.options.use_legacy_sql)),
            );
            let created = self
                .session
                .check(session.backend.insert_job(&self.spec.project_id, &job).await)
                .await?;

            if let Some(error) = created.status.as_ref().and_then(|s| s.error_result.as_ref()) {
                return Err(BqLinkError::backend(format!("job rejected: {}", error.message)));
            }
            let job_ref = created.job_reference.ok_or_else(|| {
                BqLinkError::backend("inserted job has no job reference")
            })?;

            self.stage = Stage::Continue(Cursor {
                job: Some(job_ref),
                page_token: None,
                total_rows: None,
            });
            return Ok(None);
        }

        debug!(
            "[BQ_PAGER] Submitting query: \"{}\" (page_size={})",
            preview(&self.spec.query),
            self.page_size
        );
        let request = build_request(&self.spec, self.page_size, &self.options);
        let response = self
            .session
            .check(session.backend.submit_query(&self.spec.project_id, &request).await)
            .await?;

        if !response.job_complete {
            debug!("[BQ_PAGER] Query not complete inline, following job");
            self.stage = Stage::Continue(Cursor {
                job: response.job_reference,
                page_token: None,
                total_rows: response.total_rows,
            });
            return Ok(None);
        }

        let page = format_all(&response)?;
        self.deliver(page, None).map(Some)
    }

    /// One continuation step. Returns `None` when the job was not complete
    /// yet and must be polled again.
    async fn continue_job(&mut self, mut cursor: Cursor) -> Result<Option<Page>> {
        let job = cursor.job.clone().ok_or_else(|| {
            BqLinkError::backend("more rows expected but the service returned no job reference")
        })?;

        let session = self.session.acquire().await?;
        debug!(
            "[BQ_PAGER] Fetching page of job {} (token={:?}, delivered={})",
            job, cursor.page_token, self.delivered
        );
        let response = self
            .session
            .check(
                session
                    .backend
                    .get_job_results(&job, cursor.page_token.as_deref(), Some(self.page_size))
                    .await,
            )
            .await?;

        if let Some(new_job) = &response.job_reference {
            cursor.job = Some(new_job.clone());
        }
        if response.total_rows.is_some() {
            cursor.total_rows = response.total_rows;
        }

        if !response.job_complete {
            debug!("[BQ_PAGER] Job {} still running, polling again", job);
            self.stage = Stage::Continue(cursor);
            self.wait_poll_interval().await?;
            return Ok(None);
        }

        let page = format_all(&response)?;
        self.deliver(page, Some(cursor)).map(Some)
    }

    /// Account for a complete page and decide what follows it.
    fn deliver(&mut self, mut page: Page, cursor: Option<Cursor>) -> Result<Page> {
        if page.headers.is_empty() {
            page.headers = self.headers.clone();
        } else if self.headers.is_empty() {
            self.headers = page.headers.clone();
        } else if page.headers != self.headers {
            return Err(BqLinkError::backend(format!(
                "schema changed between pages: {:?} then {:?}",
                self.headers, page.headers
            )));
        }

        let fetched = page.rows.len() as u64;
        self.delivered += fetched;
        let total = page
            .total_rows
            .or_else(|| cursor.as_ref().and_then(|c| c.total_rows))
            .unwrap_or(self.delivered);

        if self.delivered >= total {
            debug!("[BQ_PAGER] All {} rows delivered", self.delivered);
            self.stage = Stage::Done;
            return Ok(page);
        }

        let next_token = match page.page_token.clone() {
            Some(token) => token,
            None if fetched == 0 => {
                return Err(BqLinkError::backend(format!(
                    "empty page without a page token after {} of {} rows",
                    self.delivered, total
                )));
            },
            None => {
                return Err(BqLinkError::backend(format!(
                    "no page token to continue after {} of {} rows",
                    self.delivered, total
                )));
            },
        };

        let job = page
            .job_reference
            .clone()
            .or_else(|| cursor.and_then(|c| c.job));
        self.stage = Stage::Continue(Cursor {
            job,
            page_token: Some(next_token),
            total_rows: Some(total),
        });
        Ok(page)
    }

    async fn wait_poll_interval(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = self.cancel.cancelled() => Err(BqLinkError::Cancelled),
            _ = tokio::time::sleep(self.poll_interval) => Ok(()),
        }
    }
}

impl std::fmt::Debug for Pager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("project_id", &self.spec.project_id)
            .field("page_size", &self.page_size)
            .field("delivered", &self.delivered)
            .field("done", &self.is_done())
            .finish()
    }
}
