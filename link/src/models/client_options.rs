use serde::{Deserialize, Serialize};

/// Client-wide defaults applied to every query.
///
/// Per-query settings on [`QuerySpec`](super::QuerySpec) take precedence
/// over these.
///
/// # Example
///
/// ```rust
/// use bq_link::ClientOptions;
///
/// let options = ClientOptions::default()
///     .with_default_page_size(500)
///     .with_stream_channel_capacity(4);
/// assert_eq!(options.default_page_size, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Rows requested per page when the query does not say otherwise
    /// Default: 1000
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Number of undelivered stream events buffered before the producer
    /// waits for the consumer.
    /// Default: 1
    #[serde(default = "default_stream_channel_capacity")]
    pub stream_channel_capacity: usize,

    /// Use the legacy SQL dialect when the query does not say otherwise.
    /// Default: false
    #[serde(default)]
    pub use_legacy_sql: bool,
}

fn default_page_size() -> u32 {
    1000
}

fn default_stream_channel_capacity() -> usize {
    1
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            stream_channel_capacity: default_stream_channel_capacity(),
            use_legacy_sql: false,
        }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size used when a query leaves it unset. Zero is raised to 1.
    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size.max(1);
        self
    }

    /// Set the stream buffer size. Zero is raised to 1 since tokio channels
    /// need room for at least one event.
    pub fn with_stream_channel_capacity(mut self, capacity: usize) -> Self {
        self.stream_channel_capacity = capacity.max(1);
        self
    }

    pub fn with_use_legacy_sql(mut self, enabled: bool) -> Self {
        self.use_legacy_sql = enabled;
        self
    }
}
