//! mso-crawler - incremental subtitle release catalog crawler
//!
//! Builds and maintains a structured catalog of subtitle releases
//! scraped from the MSone release archive. Daily re-runs are additive
//! and idempotent: known entries are refreshed in place, new ones are
//! appended, and nothing is ever deleted by the crawl itself.

// Module declarations
pub mod crawl_engine;
pub mod domain;
pub mod infrastructure;

// Re-export the run-level surface for the binary and for tests
pub use crawl_engine::{CrawlError, CrawlOrchestrator, CrawlReport, StopReason};
pub use domain::{Catalog, CatalogEntry, ChangeSet};
pub use infrastructure::{CatalogStore, ConfigManager, CrawlerConfig, HttpClient, HttpClientConfig};
