//! Crawl orchestrator
//!
//! Drives listing pagination, fans detail work out over a bounded pool,
//! funnels results into the single-writer merger, and decides when the
//! incremental frontier has been reached. Listing pages are fetched
//! sequentially (pagination is ordered); the entries of one page are
//! processed concurrently under the shared politeness budget.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use futures::{StreamExt, stream};
use scraper::Html;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::crawl_engine::merger::{MergerHandle, merge_batch};
use crate::crawl_engine::report::{CrawlError, CrawlOutcome, CrawlPhase, CrawlReport, StopReason};
use crate::domain::catalog::{Catalog, CatalogEntry};
use crate::domain::identity::assign_identity;
use crate::domain::release::ListingSummary;
use crate::infrastructure::config::{CrawlConfig, CrawlerConfig};
use crate::infrastructure::fetcher::PageFetcher;
use crate::infrastructure::parsing::{
    ContextualParser, DetailParseContext, DetailParser, ListingParser, ParseContext, ParsingConfig,
};

/// Orchestrates one crawl run against a page fetcher.
pub struct CrawlOrchestrator<F: PageFetcher> {
    fetcher: Arc<F>,
    listing_parser: ListingParser,
    detail_parser: DetailParser,
    releases_url: String,
    crawl: CrawlConfig,
    cancel: CancellationToken,
}

impl<F: PageFetcher> CrawlOrchestrator<F> {
    /// Build an orchestrator from the crawler configuration.
    pub fn new(fetcher: Arc<F>, config: &CrawlerConfig) -> Result<Self> {
        Self::with_cancellation(fetcher, config, CancellationToken::new())
    }

    /// Build an orchestrator that honors an external stop signal.
    ///
    /// Cancellation is cooperative: in-flight detail work completes and
    /// merges before the loop halts, so the catalog is never cut off
    /// mid-page.
    pub fn with_cancellation(
        fetcher: Arc<F>,
        config: &CrawlerConfig,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let parsing = ParsingConfig::default();
        Ok(Self {
            fetcher,
            listing_parser: ListingParser::with_config(&parsing.listing)?,
            detail_parser: DetailParser::with_config(&parsing.detail)?,
            releases_url: config.site.releases_url.clone(),
            crawl: config.crawl.clone(),
            cancel,
        })
    }

    /// Run the full pagination crawl over the given catalog.
    ///
    /// Fails only when the first listing page is unreachable; every
    /// per-entry problem is reduced to a logged skip.
    pub async fn run(&self, catalog: Catalog) -> Result<CrawlOutcome, CrawlError> {
        let started = Instant::now();
        info!("🚀 Starting crawl at {}", self.releases_url);

        let merger = MergerHandle::spawn(catalog);
        let mut phase = CrawlPhase::FetchingListing;
        let mut page_url = self.releases_url.clone();
        let mut pages_visited = 0u32;
        let mut entries_skipped = 0usize;
        let mut quiet_streak = 0u32;
        let mut stop_reason = StopReason::MaxPages;

        for page_number in 1..=self.crawl.max_pages {
            if self.cancel.is_cancelled() {
                info!("🛑 Stop signal received, halting pagination");
                stop_reason = StopReason::Cancelled;
                break;
            }

            enter_phase(&mut phase, CrawlPhase::FetchingListing, page_number);
            let listing_html = match self.fetcher.fetch_page(&page_url).await {
                Ok(html) => html,
                Err(e) if page_number == 1 => {
                    enter_phase(&mut phase, CrawlPhase::Failed, page_number);
                    return Err(CrawlError::HostUnreachable {
                        url: page_url,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Listing page {} failed, stopping pagination: {}", page_number, e);
                    stop_reason = StopReason::ListingFetchFailed;
                    break;
                }
            };

            enter_phase(&mut phase, CrawlPhase::ParsingListing, page_number);
            let listing = {
                let context = ParseContext::new(page_number, page_url.clone());
                let document = Html::parse_document(&listing_html);
                match self.listing_parser.parse_with_context(&document, &context) {
                    Ok(listing) => listing,
                    Err(e) => {
                        warn!("Listing page {} unparseable, stopping: {}", page_number, e);
                        stop_reason = StopReason::ListingFetchFailed;
                        break;
                    }
                }
            };
            pages_visited += 1;
            info!(
                "Page {}: {} entries{}",
                page_number,
                listing.entries.len(),
                if listing.next_page_url.is_some() { "" } else { " (last page)" }
            );

            enter_phase(&mut phase, CrawlPhase::FetchingDetails, page_number);
            let outcomes: Vec<bool> = stream::iter(listing.entries)
                .map(|summary| self.process_entry(summary, &merger))
                .buffer_unordered(self.crawl.detail_concurrency.max(1))
                .collect()
                .await;
            entries_skipped += outcomes.iter().filter(|merged| !**merged).count();

            enter_phase(&mut phase, CrawlPhase::Merging, page_number);
            let delta = merger.page_boundary().await?;
            debug!(
                "Page {} delta: {} added, {} updated",
                page_number, delta.added, delta.updated
            );

            // Early-stop bookkeeping: a page that adds nothing and only
            // re-touches a handful of known entries is "quiet".
            if delta.added == 0 && delta.updated <= self.crawl.rescrape_noise_threshold {
                quiet_streak += 1;
                if quiet_streak >= self.crawl.early_stop_threshold {
                    info!(
                        "Early stop: {} consecutive pages without new identities",
                        quiet_streak
                    );
                    stop_reason = StopReason::EarlyStop;
                    break;
                }
            } else {
                quiet_streak = 0;
            }

            match listing.next_page_url {
                Some(next) => page_url = next,
                None => {
                    stop_reason = StopReason::EndOfListing;
                    break;
                }
            }
        }

        let outcome = merger.finish().await?;
        enter_phase(&mut phase, CrawlPhase::Done, pages_visited);
        let report = CrawlReport {
            changes: outcome.changes,
            pages_visited,
            entries_merged: outcome.entries_merged,
            entries_skipped,
            stop_reason,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "✅ Crawl done: {} pages, {} added, {} updated, {} skipped ({:?})",
            report.pages_visited,
            report.changes.added.len(),
            report.changes.updated.len(),
            report.entries_skipped,
            report.stop_reason
        );

        Ok(CrawlOutcome {
            catalog: outcome.catalog,
            report,
        })
    }

    /// Fetch, parse, key, and submit one detail page.
    ///
    /// Returns whether the entry reached the merger; every failure path
    /// is contained here as a warning.
    async fn process_entry(&self, summary: ListingSummary, merger: &MergerHandle) -> bool {
        let html = match self.fetcher.fetch_page(&summary.detail_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Skipping '{}': {}", summary.title, e);
                return false;
            }
        };

        let release = {
            let context = DetailParseContext::new(summary.detail_url.clone());
            let document = Html::parse_document(&html);
            match self.detail_parser.parse_with_context(&document, &context) {
                Ok(release) => release,
                Err(e) => {
                    warn!("Skipping '{}': {}", summary.title, e);
                    return false;
                }
            }
        };

        let identity = match assign_identity(&release) {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Skipping '{}': {}", summary.title, e);
                return false;
            }
        };

        let entry = CatalogEntry::from_release(identity.catalog_id(), release, Utc::now());
        merger.submit(entry).await;
        true
    }

    /// Re-scrape one specific detail URL, bypassing pagination.
    ///
    /// The inbound admin signal: runs the detail pipeline for a single
    /// page and merges the result. Unlike the pagination crawl, failures
    /// here are reported back to the caller instead of being skipped.
    pub async fn rescrape(&self, mut catalog: Catalog, url: &str) -> Result<CrawlOutcome, CrawlError> {
        let started = Instant::now();
        info!("Re-scraping {}", url);

        let html = self
            .fetcher
            .fetch_page(url)
            .await
            .map_err(|e| CrawlError::RescrapeFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let release = {
            let context = DetailParseContext::new(url.to_string());
            let document = Html::parse_document(&html);
            self.detail_parser
                .parse_with_context(&document, &context)
                .map_err(|e| CrawlError::RescrapeFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?
        };

        let identity = assign_identity(&release).map_err(|e| CrawlError::RescrapeFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let entry = CatalogEntry::from_release(identity.catalog_id(), release, Utc::now());
        let changes = merge_batch(&mut catalog, [entry]);

        let report = CrawlReport {
            changes,
            pages_visited: 0,
            entries_merged: 1,
            entries_skipped: 0,
            stop_reason: StopReason::EndOfListing,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        Ok(CrawlOutcome { catalog, report })
    }
}

fn enter_phase(phase: &mut CrawlPhase, next: CrawlPhase, page_number: u32) {
    debug!("Phase {:?} -> {:?} (page {})", phase, next, page_number);
    *phase = next;
}
