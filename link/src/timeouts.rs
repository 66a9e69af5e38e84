//! Timeout configuration for bq-link client operations.
//!
//! Centralizes the timing knobs of the client: HTTP connect/request
//! timeouts for the backend call layer, how early a bearer token is
//! refreshed, and how long the pager waits before re-polling a job that
//! has not completed yet.

use std::time::Duration;

/// Timeout configuration for bq-link client operations.
///
/// # Examples
///
/// ```rust
/// use bq_link::BqLinkTimeouts;
/// use std::time::Duration;
///
/// // Use defaults (recommended for most cases)
/// let timeouts = BqLinkTimeouts::default();
///
/// // Custom timeouts for long-running warehouse jobs
/// let timeouts = BqLinkTimeouts::builder()
///     .request_timeout(Duration::from_secs(300))
///     .job_poll_interval(Duration::from_secs(2))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct BqLinkTimeouts {
    /// Timeout for establishing connections (TCP + TLS handshake).
    /// Default: 10 seconds
    pub connection_timeout: Duration,

    /// Timeout for a whole HTTP request, including reading the response.
    /// Default: 60 seconds
    pub request_timeout: Duration,

    /// A token this close to its expiry is treated as expired and refreshed.
    /// Default: 60 seconds
    pub token_refresh_margin: Duration,

    /// Delay before re-polling a job whose results are not ready yet.
    /// Default: 1 second
    pub job_poll_interval: Duration,
}

impl Default for BqLinkTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            token_refresh_margin: Duration::from_secs(60),
            job_poll_interval: Duration::from_secs(1),
        }
    }
}

impl BqLinkTimeouts {
    /// Create a new builder for custom timeout configuration.
    pub fn builder() -> BqLinkTimeoutsBuilder {
        BqLinkTimeoutsBuilder::new()
    }

    /// Short timeouts for local emulators and tests.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
            token_refresh_margin: Duration::from_secs(10),
            job_poll_interval: Duration::from_millis(50),
        }
    }

    /// Long timeouts for large scans over slow links.
    pub fn relaxed() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(600),
            token_refresh_margin: Duration::from_secs(300),
            job_poll_interval: Duration::from_secs(5),
        }
    }
}

/// Builder for creating custom [`BqLinkTimeouts`] configurations.
#[derive(Debug, Clone)]
pub struct BqLinkTimeoutsBuilder {
    timeouts: BqLinkTimeouts,
}

impl BqLinkTimeoutsBuilder {
    /// Create a new builder with default timeouts.
    pub fn new() -> Self {
        Self {
            timeouts: BqLinkTimeouts::default(),
        }
    }

    /// Set the connection timeout.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    /// Set the connection timeout in seconds.
    pub fn connection_timeout_secs(self, secs: u64) -> Self {
        self.connection_timeout(Duration::from_secs(secs))
    }

    /// Set the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request_timeout = timeout;
        self
    }

    /// Set the per-request timeout in seconds.
    pub fn request_timeout_secs(self, secs: u64) -> Self {
        self.request_timeout(Duration::from_secs(secs))
    }

    /// Set how long before expiry a token gets refreshed.
    pub fn token_refresh_margin(mut self, margin: Duration) -> Self {
        self.timeouts.token_refresh_margin = margin;
        self
    }

    /// Set the job re-poll delay. Zero re-polls immediately.
    pub fn job_poll_interval(mut self, interval: Duration) -> Self {
        self.timeouts.job_poll_interval = interval;
        self
    }

    /// Build the timeout configuration.
    pub fn build(self) -> BqLinkTimeouts {
        self.timeouts
    }
}

impl Default for BqLinkTimeoutsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
