//! The one capability the formatter and pager need from a response.

use super::job_results_response::JobResultsResponse;
use super::query_response::QueryResponse;
use super::references::JobReference;
use super::table_row::TableRow;
use super::table_schema::TableSchema;

/// Read access to a page of tabular results, whichever endpoint produced it.
pub trait TabularResponse: Send + Sync {
    fn schema(&self) -> Option<&TableSchema>;
    fn rows(&self) -> &[TableRow];
    fn total_rows(&self) -> Option<u64>;
    fn job_complete(&self) -> bool;
    fn job_reference(&self) -> Option<&JobReference>;
    fn page_token(&self) -> Option<&str>;
}

macro_rules! impl_tabular_response {
    ($ty:ty) => {
        impl TabularResponse for $ty {
            fn schema(&self) -> Option<&TableSchema> {
                self.schema.as_ref()
            }

            fn rows(&self) -> &[TableRow] {
                &self.rows
            }

            fn total_rows(&self) -> Option<u64> {
                self.total_rows
            }

            fn job_complete(&self) -> bool {
                self.job_complete
            }

            fn job_reference(&self) -> Option<&JobReference> {
                self.job_reference.as_ref()
            }

            fn page_token(&self) -> Option<&str> {
                self.page_token.as_deref().filter(|t| !t.is_empty())
            }
        }
    };
}

impl_tabular_response!(QueryResponse);
impl_tabular_response!(JobResultsResponse);
