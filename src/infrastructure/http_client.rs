//! HTTP client for web crawling with rate limiting and error handling
//!
//! Provides a robust HTTP client specifically designed for scraping the
//! release archive with respect for server resources: a shared
//! requests-per-second quota, a cap on in-flight requests, and bounded
//! exponential-backoff retries for transient failures.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client, StatusCode,
    header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT},
};
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::infrastructure::config::{CrawlConfig, SiteConfig};
use crate::infrastructure::fetcher::{FetchError, PageFetcher};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// HTTP client configuration for crawling.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Politeness budget shared by every request of the run.
    pub max_requests_per_second: u32,
    /// Cap on requests in flight at once.
    pub max_concurrent_requests: usize,
    /// Attempts per URL, first try included.
    pub retry_attempts: u32,
}

impl HttpClientConfig {
    /// Assemble the client configuration from the crawl settings.
    pub fn from_crawler_config(site: &SiteConfig, crawl: &CrawlConfig) -> Self {
        Self {
            user_agent: site.user_agent.clone(),
            timeout_seconds: crawl.request_timeout_seconds,
            max_requests_per_second: crawl.max_requests_per_second,
            max_concurrent_requests: crawl.detail_concurrency,
            retry_attempts: crawl.retry_attempts,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        let site = SiteConfig::default();
        let crawl = CrawlConfig::default();
        Self::from_crawler_config(&site, &crawl)
    }
}

/// Rate-limited HTTP client for respectful crawling.
pub struct HttpClient {
    client: Client,
    rate_limiter: DirectRateLimiter,
    in_flight: Arc<Semaphore>,
    cancel: CancellationToken,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        Self::with_cancellation(config, CancellationToken::new())
    }

    /// Create a client whose requests abort when `cancel` fires.
    pub fn with_cancellation(config: HttpClientConfig, cancel: CancellationToken) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );
        let rate_limiter = RateLimiter::direct(quota);

        let in_flight = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));

        Ok(Self {
            client,
            rate_limiter,
            in_flight,
            cancel,
            config,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// One GET attempt: wait for a politeness slot, issue the request,
    /// validate status and content type.
    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|_| FetchError::Cancelled {
                url: url.to_string(),
            })?;

        tokio::select! {
            _ = self.rate_limiter.until_ready() => {}
            _ = self.cancel.cancelled() => {
                return Err(FetchError::Cancelled { url: url.to_string() });
            }
        }

        debug!("HTTP GET: {}", url);

        let response = tokio::select! {
            result = self.client.get(url).send() => {
                result.map_err(|e| classify_reqwest_error(url, &e))?
            }
            _ = self.cancel.cancelled() => {
                return Err(FetchError::Cancelled { url: url.to_string() });
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(url, status, response.headers().get(RETRY_AFTER)));
        }

        // The archive occasionally answers with a plain-text block page;
        // treat anything that is not HTML as unusable.
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(FetchError::permanent(
                url,
                format!("non-HTML response: {content_type}"),
            ));
        }

        let body = tokio::select! {
            result = response.text() => {
                result.map_err(|e| FetchError::transient(url, format!("body read failed: {e}")))?
            }
            _ = self.cancel.cancelled() => {
                return Err(FetchError::Cancelled { url: url.to_string() });
            }
        };

        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    /// Fetch a URL, retrying transient failures with exponential backoff.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let mut last_error = FetchError::transient(url, "no attempts made");

        for attempt in 1..=self.config.retry_attempts.max(1) {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e @ FetchError::Transient { .. }) => {
                    warn!("Attempt {} failed for {}: {}", attempt, url, e);
                    last_error = e;
                    if attempt < self.config.retry_attempts {
                        let delay = Duration::from_secs(2_u64.pow(attempt - 1));
                        tokio::select! {
                            _ = sleep(delay) => {}
                            _ = self.cancel.cancelled() => {
                                return Err(FetchError::Cancelled { url: url.to_string() });
                            }
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }
}

/// Map a reqwest transport error onto the retry taxonomy.
fn classify_reqwest_error(url: &str, e: &reqwest::Error) -> FetchError {
    if e.is_builder() {
        FetchError::permanent(url, format!("malformed request: {e}"))
    } else if e.is_timeout() {
        FetchError::transient(url, "request timed out".to_string())
    } else {
        // Connect resets and mid-body failures are worth another try.
        FetchError::transient(url, format!("request failed: {e}"))
    }
}

/// Map an HTTP error status onto the retry taxonomy.
fn classify_status(
    url: &str,
    status: StatusCode,
    retry_after: Option<&HeaderValue>,
) -> FetchError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        let reason = match retry_after
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(secs) => format!("HTTP {status} (retry after {secs}s)"),
            None => format!("HTTP {status}"),
        };
        FetchError::transient(url, reason)
    } else {
        FetchError::permanent(url, format!("HTTP {status}"))
    }
}
