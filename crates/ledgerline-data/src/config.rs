//! Registry client configuration.

use crate::error::{DataError, Result};
use std::fmt;
use std::time::Duration;

/// Companies House public data API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.company-information.service.gov.uk";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default minimum spacing between requests
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default base delay for exponential backoff
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(250);

const USER_AGENT: &str = concat!("ledgerline/", env!("CARGO_PKG_VERSION"));

/// Registry API key.
///
/// Sent as the basic-auth username with an empty password. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building the authorization header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the key is blank.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Configuration injected into [`RegistryClient`](crate::registry::RegistryClient).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Credential attached to every call
    pub api_key: ApiKey,
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Minimum spacing between requests across the whole client
    pub min_interval: Duration,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Base delay, doubled on every retry
    pub retry_backoff: Duration,
    /// User-Agent header value
    pub user_agent: String,
}

impl RegistryConfig {
    /// Configuration with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: ApiKey::new(api_key),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            min_interval: DEFAULT_MIN_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the request timeout.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the minimum interval between requests.
    pub const fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Override the retry policy.
    pub const fn with_retries(mut self, max_retries: u32, retry_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = retry_backoff;
        self
    }

    /// Reject configurations the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_blank() {
            return Err(DataError::Config("registry API key is empty".to_string()));
        }
        if self.base_url.is_empty() {
            return Err(DataError::Config("registry base URL is empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(DataError::Config("request timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Backoff delay before retry number `attempt` (zero based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}
