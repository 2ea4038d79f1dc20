//! Infrastructure layer for HTTP fetching, HTML parsing, configuration,
//! and catalog persistence
//!
//! Everything that touches the outside world lives here; the domain and
//! the crawl engine stay free of I/O details.

pub mod catalog_store;
pub mod config;
pub mod fetcher;
pub mod http_client;
pub mod logging;
pub mod parsing;

// Re-export commonly used items
pub use catalog_store::{CatalogStore, StoreError};
pub use config::{ConfigManager, CrawlerConfig};
pub use fetcher::{FetchError, PageFetcher};
pub use http_client::{HttpClient, HttpClientConfig};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use parsing::{
    DetailParseContext, DetailParser, ListingParser, ParseContext, ParsingConfig, ParsingError,
    ParsingResult,
};
