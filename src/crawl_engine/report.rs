//! Crawl run outcomes and engine-level errors

use serde::Serialize;
use thiserror::Error;

use crate::domain::catalog::{Catalog, ChangeSet};
use crate::infrastructure::catalog_store::StoreError;

/// Phases of one crawl run, in the order a page moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    FetchingListing,
    ParsingListing,
    FetchingDetails,
    Merging,
    Done,
    Failed,
}

/// Why pagination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The listing ran out of next-page links.
    EndOfListing,
    /// The configured page cap was reached.
    MaxPages,
    /// Enough consecutive pages produced no new ids.
    EarlyStop,
    /// The cooperative stop signal fired.
    Cancelled,
    /// A listing page beyond the first failed to fetch.
    ListingFetchFailed,
}

/// Summary of one finished run, for the log and for the collaborator
/// that decides what to announce.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub changes: ChangeSet,
    pub pages_visited: u32,
    pub entries_merged: usize,
    pub entries_skipped: usize,
    pub stop_reason: StopReason,
    pub duration_ms: u64,
}

/// Final state of a successful run: the merged catalog plus its report.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub catalog: Catalog,
    pub report: CrawlReport,
}

/// Run-failing errors. Everything else a crawl encounters is reduced to
/// a logged skip.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("listing host unreachable at {url}: {reason}")]
    HostUnreachable { url: String, reason: String },

    #[error("re-scrape of {url} failed: {reason}")]
    RescrapeFailed { url: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("merger task terminated unexpectedly")]
    MergerGone,
}
