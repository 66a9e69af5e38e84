//! Data models for the bq-link client library.
//!
//! Wire structures of the warehouse REST API (query, job-results, jobs,
//! insertAll, tables) plus the client-side shapes handed to callers:
//! [`QuerySpec`], [`Page`], [`QueryResult`] and [`StreamEvent`].

pub mod client_options;
pub mod error_proto;
pub mod insert_all;
pub mod job;
pub mod job_results_response;
pub mod page;
pub mod query_request;
pub mod query_response;
pub mod query_spec;
pub mod references;
pub mod table;
pub mod table_row;
pub mod table_schema;
pub mod tabular_response;
pub mod token_response;
pub mod utils;


pub use client_options::ClientOptions;
pub use error_proto::{ErrorBody, ErrorProto, ErrorResponse};
pub use insert_all::{InsertAllRequest, InsertAllResponse, InsertAllRow, RowInsertErrors};
pub use job::{
    CreateDisposition, Job, JobConfiguration, JobConfigurationQuery, JobStatus,
    WriteDisposition,
};
pub use job_results_response::JobResultsResponse;
pub use page::{Page, QueryResult, Row, StreamEvent};
pub use query_request::QueryRequest;
pub use query_response::QueryResponse;
pub use query_spec::QuerySpec;
pub use references::{DatasetReference, JobReference, TableReference};
pub use table::Table;
pub use table_row::{TableCell, TableRow};
pub use table_schema::{TableFieldSchema, TableSchema};
pub use tabular_response::TabularResponse;
pub use token_response::TokenResponse;
pub use utils::{parse_i64, parse_u64};
