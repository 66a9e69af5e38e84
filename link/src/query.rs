//! Single-request query execution.

use log::{debug, warn};
use std::sync::Arc;
use std::time::Instant;

use crate::auth::CredentialSession;
use crate::error::{BqLinkError, Result};
use crate::formatter::format_page;
use crate::models::{parse_i64, ClientOptions, QueryRequest, QuerySpec, Row, TableReference};

/// Runs bounded queries that are answered by one request, with no paging.
#[derive(Clone)]
pub struct QueryExecutor {
    session: Arc<CredentialSession>,
    options: ClientOptions,
}

impl QueryExecutor {
    pub(crate) fn new(session: Arc<CredentialSession>, options: ClientOptions) -> Self {
        Self { session, options }
    }

    /// Run `spec.query` and return at most `max_results` rows.
    ///
    /// Exactly one request is made. If the service does not finish the
    /// query within that request the call fails with
    /// [`BqLinkError::TimeoutError`]; use the pager for long-running work.
    pub async fn query(&self, spec: &QuerySpec, max_results: u32) -> Result<Vec<Row>> {
        spec.validate()?;
        let request = build_request(spec, max_results, &self.options);

        debug!(
            "[BQ_QUERY] Sync query: \"{}\" (max_results={})",
            preview(&spec.query),
            max_results
        );
        let start = Instant::now();

        let session = self.session.acquire().await?;
        let response = self
            .session
            .check(session.backend.submit_query(&spec.project_id, &request).await)
            .await?;

        if !response.job_complete {
            let job = response
                .job_reference
                .as_ref()
                .map(|j| j.to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            return Err(BqLinkError::TimeoutError(format!(
                "query job {} did not complete within the request",
                job
            )));
        }

        let total = response
            .total_rows
            .unwrap_or(response.rows.len() as u64);
        let limit = total.min(max_results as u64) as usize;
        let page = format_page(&response, limit)?;

        debug!(
            "[BQ_QUERY] Sync query done: rows={} total_ms={}",
            page.rows.len(),
            start.elapsed().as_millis()
        );
        Ok(page.rows)
    }

    /// Number of rows in `project.dataset.table`.
    ///
    /// Lossy by contract: any failure (auth, backend, unparsable result) is
    /// logged and reported as 0.
    pub async fn count(&self, project_id: &str, dataset_id: &str, table_id: &str) -> i64 {
        let table = TableReference::new(project_id, dataset_id, table_id);
        match self.try_count(&table).await {
            Ok(n) => n,
            Err(e) => {
                warn!("[BQ_QUERY] Count of {} failed, reporting 0: {}", table, e);
                0
            },
        }
    }

    async fn try_count(&self, table: &TableReference) -> Result<i64> {
        let sql = count_query(table, self.options.use_legacy_sql);
        let spec = QuerySpec::new(&table.project_id, &table.dataset_id, sql);
        let rows = self.query(&spec, 1).await?;

        let cell = rows
            .first()
            .and_then(|row| row.first())
            .ok_or_else(|| BqLinkError::FormatError("count query returned no rows".into()))?;
        parse_i64(cell)
            .ok_or_else(|| BqLinkError::FormatError(format!("count is not an integer: {}", cell)))
    }
}

/// Build the submit request for `spec`, asking for at most `max_results`
/// rows inline.
pub(crate) fn build_request(spec: &QuerySpec, max_results: u32, options: &ClientOptions) -> QueryRequest {
    let mut request = QueryRequest::new(spec.query.clone())
        .with_max_results(max_results)
        .with_legacy_sql(Some(spec.use_legacy_sql.unwrap_or(options.use_legacy_sql)));
    if let Some(dataset) = spec.default_dataset() {
        request = request.with_default_dataset(dataset);
    }
    request
}

fn count_query(table: &TableReference, legacy: bool) -> String {
    if legacy {
        format!(
            "SELECT COUNT(*) FROM [{}:{}.{}]",
            table.project_id, table.dataset_id, table.table_id
        )
    } else {
        format!("SELECT COUNT(*) FROM `{}`", table)
    }
}

/// First 80 characters of a query, on one line, for log output.
pub(crate) fn preview(sql: &str) -> String {
    let one_line = sql.replace('\n', " ");
    match one_line.char_indices().nth(80) {
        Some((idx, _)) => format!("{}...", &one_line[..idx]),
        None => one_line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_query_dialects() {
        let table = TableReference::new("p", "d", "t");
        assert_eq!(count_query(&table, false), "SELECT COUNT(*) FROM `p.d.t`");
        assert_eq!(count_query(&table, true), "SELECT COUNT(*) FROM [p:d.t]");
    }

    #[test]
    fn test_build_request_uses_client_dialect_by_default() {
        let options = ClientOptions::default().with_use_legacy_sql(true);
        let spec = QuerySpec::new("p", "d", "SELECT 1");
        let request = build_request(&spec, 10, &options);
        assert_eq!(request.use_legacy_sql, Some(true));
        assert_eq!(request.max_results, Some(10));
        assert_eq!(request.default_dataset.unwrap().dataset_id, "d");

        let spec = spec.with_legacy_sql(false);
        assert_eq!(build_request(&spec, 10, &options).use_legacy_sql, Some(false));
    }

    #[test]
    fn test_preview_truncates_long_queries() {
        let long = "x".repeat(200);
        assert_eq!(preview(&long).len(), 83);
        assert_eq!(preview("SELECT\n1"), "SELECT 1");
    }
}
