use reqwest::Url;
use std::time::Duration;

use crate::error::{NenDBError, Result};
use crate::retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, RetryPolicy};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 16;

/// Connection settings for a [`Client`](crate::Client).
///
/// Built with the `with_*` methods, then handed to the client, which keeps it
/// read-only for its whole lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    base_url: String,
    timeout: Duration,
    retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    pool_max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the first backoff delay and the cap for later ones.
    pub fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn with_pool_max_idle_per_host(mut self, max_idle: usize) -> Self {
        self.pool_max_idle_per_host = max_idle;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn pool_max_idle_per_host(&self) -> usize {
        self.pool_max_idle_per_host
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, self.base_delay, self.max_delay)
    }

    /// Checks that the base URL is an absolute http(s) URL and the timeout is non-zero.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            NenDBError::validation(format!("invalid base URL '{}': {}", self.base_url, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(NenDBError::validation(format!(
                "unsupported URL scheme '{}' in '{}', expected http or https",
                url.scheme(),
                self.base_url
            )));
        }

        if url.host_str().is_none() {
            return Err(NenDBError::validation(format!(
                "base URL '{}' has no host",
                self.base_url
            )));
        }

        if self.timeout.is_zero() {
            return Err(NenDBError::validation("timeout must be greater than zero"));
        }

        if self.base_delay > self.max_delay {
            return Err(NenDBError::validation(
                "backoff base delay must not exceed the maximum delay",
            ));
        }

        Ok(())
    }
}
