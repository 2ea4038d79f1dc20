//! Crawl engine - pagination orchestration and catalog merging
//!
//! The engine ties the infrastructure pieces into one run: orchestrator
//! drives pagination and detail fan-out, the merger task owns the
//! catalog, and the store functions below handle the load/run/persist
//! cycle with last-known-good semantics (a failed run never overwrites
//! the previous catalog file).

pub mod merger;
pub mod orchestrator;
pub mod report;

pub use merger::{MergeOutcome, MergerHandle, PageDelta, merge_batch};
pub use orchestrator::CrawlOrchestrator;
pub use report::{CrawlError, CrawlOutcome, CrawlPhase, CrawlReport, StopReason};

use crate::infrastructure::catalog_store::CatalogStore;
use crate::infrastructure::config::StorageConfig;
use crate::infrastructure::fetcher::PageFetcher;

/// Load the catalog, run a full crawl, and persist the result.
///
/// The catalog file is only replaced after a successful run; a failed
/// run (or a failed write) leaves the last-known-good file in place.
pub async fn run_with_store<F: PageFetcher>(
    orchestrator: &CrawlOrchestrator<F>,
    store: &CatalogStore,
    storage: &StorageConfig,
) -> Result<CrawlReport, CrawlError> {
    let catalog = store.load().await?;
    let outcome = orchestrator.run(catalog).await?;
    store.save(&outcome.catalog).await?;
    if storage.write_series_index {
        store
            .save_series_index(&outcome.catalog, &storage.series_index_path)
            .await?;
    }
    Ok(outcome.report)
}

/// Load the catalog, re-scrape one URL, and persist the result.
pub async fn rescrape_with_store<F: PageFetcher>(
    orchestrator: &CrawlOrchestrator<F>,
    store: &CatalogStore,
    storage: &StorageConfig,
    url: &str,
) -> Result<CrawlReport, CrawlError> {
    let catalog = store.load().await?;
    let outcome = orchestrator.rescrape(catalog, url).await?;
    store.save(&outcome.catalog).await?;
    if storage.write_series_index {
        store
            .save_series_index(&outcome.catalog, &storage.series_index_path)
            .await?;
    }
    Ok(outcome.report)
}
