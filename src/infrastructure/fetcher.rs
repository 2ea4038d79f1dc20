//! Page fetching contract
//!
//! The crawl engine talks to the network through this seam so tests can
//! substitute a scripted fetcher for the real HTTP client.

use async_trait::async_trait;
use thiserror::Error;

/// Failure modes of a page fetch.
///
/// Transient failures may be retried with backoff; permanent ones must
/// not be. The distinction drives the skip-vs-abort policy upstream: a
/// detail page that keeps failing is skipped, an unreachable listing
/// host aborts the run.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("transient fetch failure for {url}: {reason}")]
    Transient { url: String, reason: String },

    #[error("permanent fetch failure for {url}: {reason}")]
    Permanent { url: String, reason: String },

    #[error("fetch cancelled for {url}")]
    Cancelled { url: String },
}

impl FetchError {
    pub fn transient(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transient {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn permanent(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Permanent {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Anything that can turn a URL into raw HTML.
///
/// Implementations own their politeness budget (rate limit, concurrency
/// cap) and retry policy; callers see only the final outcome.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}
