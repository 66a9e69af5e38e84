use serde::{Deserialize, Serialize};

use super::error_proto::ErrorProto;
use super::references::{DatasetReference, JobReference, TableReference};

/// What happens to existing rows in a destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteDisposition {
    /// Overwrite the table
    WriteTruncate,
    WriteAppend,
    WriteEmpty,
}

/// Whether a missing destination table may be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreateDisposition {
    CreateIfNeeded,
    CreateNever,
}

/// A job resource, as sent to and returned from `POST projects/{project}/jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<JobReference>,

    pub configuration: JobConfiguration,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

impl Job {
    /// A query job writing its full result into `destination`, replacing
    /// whatever the table held before.
    pub fn query_to_table(
        query: impl Into<String>,
        default_dataset: Option<DatasetReference>,
        destination: TableReference,
        use_legacy_sql: Option<bool>,
    ) -> Self {
        Self {
            job_reference: None,
            configuration: JobConfiguration {
                query: JobConfigurationQuery {
                    query: query.into(),
                    default_dataset,
                    destination_table: Some(destination),
                    write_disposition: Some(WriteDisposition::WriteTruncate),
                    create_disposition: Some(CreateDisposition::CreateIfNeeded),
                    allow_large_results: Some(true),
                    use_legacy_sql,
                },
            },
            status: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfiguration {
    pub query: JobConfigurationQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfigurationQuery {
    pub query: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_dataset: Option<DatasetReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_table: Option<TableReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_disposition: Option<WriteDisposition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_disposition: Option<CreateDisposition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_large_results: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_legacy_sql: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    /// `PENDING`, `RUNNING` or `DONE`
    #[serde(default)]
    pub state: String,

    /// Set when the job failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_result: Option<ErrorProto>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorProto>,
}
