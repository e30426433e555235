//! Companies House API client with rate limiting and retries.

use super::RegistrySource;
use super::documents::DocumentMetadata;
use super::filings::FilingHistory;
use crate::config::{ApiKey, RegistryConfig};
use crate::error::{DataError, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// Company search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    company_number: Option<String>,
}

/// Rate limiter to space requests out evenly
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now()
                .checked_sub(min_interval)
                .unwrap_or_else(Instant::now),
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// Authenticated Companies House API client
pub struct RegistryClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    base_url: Url,
    api_key: ApiKey,
    max_retries: u32,
    config: RegistryConfig,
}

impl RegistryClient {
    /// Create a client from an explicit configuration.
    ///
    /// # Errors
    /// Returns `DataError::Config` for a blank key or an unparsable base URL.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        config.validate()?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| DataError::Config(format!("invalid base URL {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(DataError::Config(format!(
                "base URL {} cannot carry a path",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| DataError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(config.min_interval))),
            base_url,
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
            config,
        })
    }

    /// The configuration this client was built with.
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DataError::Config("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn company_endpoint(&self, company_id: &str, resource: Option<&str>) -> Result<Url> {
        if company_id.is_empty() {
            return Err(DataError::RegistryNotFound("empty company id".to_string()));
        }
        match resource {
            Some(resource) => self.endpoint(&["company", company_id, resource]),
            None => self.endpoint(&["company", company_id]),
        }
    }

    fn parse_absolute(url: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| DataError::RegistryUnavailable {
            url: url.to_string(),
            status: None,
            reason: format!("invalid URL: {}", e),
        })
    }

    /// Send an authenticated GET, retrying transient failures with backoff.
    async fn send(&self, url: &Url, accept: Option<&str>) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            self.rate_limiter.lock().await.wait().await;

            debug!(url = %url, attempt, "registry request");
            let mut request = self
                .client
                .get(url.clone())
                .basic_auth(self.api_key.expose(), Some(""));
            if let Some(accept) = accept {
                request = request.header(ACCEPT, accept);
            }

            let outcome = match request.send().await {
                Ok(response) => Self::check_status(url, response).await,
                Err(e) => Err(DataError::RegistryUnavailable {
                    url: url.to_string(),
                    status: None,
                    reason: e.to_string(),
                }),
            };

            match outcome {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.config.backoff(attempt);
                    warn!(url = %url, attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying registry request");
                    sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn check_status(url: &Url, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(DataError::RegistryNotFound(url.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(DataError::RegistryUnavailable {
            url: url.to_string(),
            status: Some(status.as_u16()),
            reason: format!("HTTP {}: {}", status, truncate(&body, 200)),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.send(&url, None).await?;
        response
            .json()
            .await
            .map_err(|e| DataError::RegistryUnavailable {
                url: url.to_string(),
                status: None,
                reason: format!("failed to decode response: {}", e),
            })
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl RegistrySource for RegistryClient {
    async fn search_company(&self, name: &str) -> Result<String> {
        let mut url = self.endpoint(&["search", "companies"])?;
        url.query_pairs_mut().append_pair("q", name);

        let search: SearchResponse = self.get_json(url).await?;
        let company_id = search
            .items
            .into_iter()
            .next()
            .and_then(|item| item.company_number)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DataError::RegistryNotFound(format!("no company matches {:?}", name)))?;

        debug!(name, company_id = %company_id, "resolved company");
        Ok(company_id)
    }

    async fn company_profile(&self, company_id: &str) -> Result<Value> {
        self.get_json(self.company_endpoint(company_id, None)?).await
    }

    async fn filing_history(&self, company_id: &str) -> Result<FilingHistory> {
        self.get_json(self.company_endpoint(company_id, Some("filing-history"))?)
            .await
    }

    async fn officers(&self, company_id: &str) -> Result<Value> {
        self.get_json(self.company_endpoint(company_id, Some("officers"))?)
            .await
    }

    async fn persons_with_significant_control(&self, company_id: &str) -> Result<Value> {
        self.get_json(self.company_endpoint(
            company_id,
            Some("persons-with-significant-control"),
        )?)
        .await
    }

    async fn document_metadata(&self, url: &str) -> Result<DocumentMetadata> {
        self.get_json(Self::parse_absolute(url)?).await
    }

    async fn download_document(
        &self,
        url: &str,
        accept: &str,
        destination: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64> {
        let url = Self::parse_absolute(url)?;
        let mut response = self.send(&url, Some(accept)).await?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| DataError::DownloadFailed(format!("{}: {}", url, e)))?
        {
            destination.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        destination.flush().await?;

        debug!(url = %url, bytes = written, "downloaded document");
        Ok(written)
    }
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("base_url", &self.base_url.as_str())
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}
