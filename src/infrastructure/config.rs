//! Configuration infrastructure
//!
//! Configuration loading and management for the release-catalog crawl.
//!
//! Settings come from three layers, later layers winning:
//! 1. Built-in defaults (the `defaults` module)
//! 2. An optional JSON config file
//! 3. `CRAWLER_*` environment variables (what the invoking scheduler sets)

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

/// Default values for all tunables.
pub mod defaults {
    pub const BASE_URL: &str = "https://malayalamsubtitles.org";
    pub const RELEASES_URL: &str = "https://malayalamsubtitles.org/releases/";

    /// The site serves an error page to obviously non-browser agents.
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
         AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    pub const MAX_PAGES: u32 = 10;
    pub const DETAIL_CONCURRENCY: usize = 4;
    pub const MAX_REQUESTS_PER_SECOND: u32 = 2;
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
    pub const RETRY_ATTEMPTS: u32 = 3;
    pub const EARLY_STOP_THRESHOLD: u32 = 3;
    pub const RESCRAPE_NOISE_THRESHOLD: usize = 0;

    pub const CATALOG_FILE: &str = "db.json";
    pub const SERIES_INDEX_FILE: &str = "series.json";

    pub const LOG_LEVEL: &str = "info";
}

/// Complete crawler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub site: SiteConfig,
    pub crawl: CrawlConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Where to crawl and how to identify ourselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site root, used to resolve relative links.
    pub base_url: String,

    /// First listing page of the release archive.
    pub releases_url: String,

    /// User-Agent header sent with every request.
    pub user_agent: String,
}

/// Crawl pacing and termination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Hard cap on listing pages visited in one run.
    pub max_pages: u32,

    /// Maximum detail requests in flight at once.
    pub detail_concurrency: usize,

    /// Politeness budget: requests per second across the whole run.
    pub max_requests_per_second: u32,

    /// Per-request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Attempts per URL for transient failures (first try included).
    pub retry_attempts: u32,

    /// Stop pagination after this many consecutive pages with no new ids.
    pub early_stop_threshold: u32,

    /// Updated-id count per page that still counts as re-scrape noise.
    pub rescrape_noise_threshold: usize,
}

/// Catalog persistence locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the catalog JSON file the bot reads.
    pub catalog_path: PathBuf,

    /// Write the derived series aggregation next to the catalog.
    pub write_series_index: bool,

    /// Path of the series aggregation file.
    pub series_index_path: PathBuf,
}

/// Logging configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Also write logs to a file.
    pub file_output: bool,

    /// Directory for log files when `file_output` is set.
    pub log_dir: Option<PathBuf>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            crawl: CrawlConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            releases_url: defaults::RELEASES_URL.to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: defaults::MAX_PAGES,
            detail_concurrency: defaults::DETAIL_CONCURRENCY,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            retry_attempts: defaults::RETRY_ATTEMPTS,
            early_stop_threshold: defaults::EARLY_STOP_THRESHOLD,
            rescrape_noise_threshold: defaults::RESCRAPE_NOISE_THRESHOLD,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(defaults::CATALOG_FILE),
            write_series_index: false,
            series_index_path: PathBuf::from(defaults::SERIES_INDEX_FILE),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            file_output: false,
            log_dir: None,
        }
    }
}

/// Configuration manager for loading and saving settings.
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the crawler configuration directory.
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("mso-crawler");
        Ok(config_dir)
    }

    /// Create a configuration manager using the default config location.
    ///
    /// `CRAWLER_CONFIG` overrides the path entirely (CI sets this).
    pub fn new() -> Result<Self> {
        let config_path = match std::env::var_os("CRAWLER_CONFIG") {
            Some(path) => PathBuf::from(path),
            None => Self::get_config_dir()?.join("crawler_config.json"),
        };
        Ok(Self { config_path })
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load the config file if present, otherwise defaults; then apply
    /// environment overrides on top.
    pub async fn load(&self) -> Result<CrawlerConfig> {
        let mut config = if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)
                .await
                .with_context(|| format!("Failed to read config file: {:?}", self.config_path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid config file: {:?}", self.config_path))?
        } else {
            info!(
                "No config file at {:?}, using built-in defaults",
                self.config_path
            );
            CrawlerConfig::default()
        };

        apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Persist the given configuration (pretty JSON, directory created on
    /// demand).
    pub async fn save(&self, config: &CrawlerConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create config directory: {parent:?}"))?;
        }
        let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.config_path, json)
            .await
            .with_context(|| format!("Failed to write config file: {:?}", self.config_path))?;
        Ok(())
    }
}

/// Apply `CRAWLER_*` environment variables over a loaded configuration.
///
/// Unparseable values are ignored rather than fatal; a typo in a cron
/// definition should not take the nightly run down.
pub fn apply_env_overrides(config: &mut CrawlerConfig) {
    fn env_var(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    if let Some(v) = env_var("CRAWLER_MAX_PAGES").and_then(|v| v.parse().ok()) {
        config.crawl.max_pages = v;
    }
    if let Some(v) = env_var("CRAWLER_CONCURRENCY").and_then(|v| v.parse().ok()) {
        config.crawl.detail_concurrency = v;
    }
    if let Some(v) = env_var("CRAWLER_RPS").and_then(|v| v.parse().ok()) {
        config.crawl.max_requests_per_second = v;
    }
    if let Some(v) = env_var("CRAWLER_EARLY_STOP").and_then(|v| v.parse().ok()) {
        config.crawl.early_stop_threshold = v;
    }
    if let Some(v) = env_var("CRAWLER_RELEASES_URL") {
        config.site.releases_url = v;
    }
    if let Some(v) = env_var("CRAWLER_DB_FILE") {
        config.storage.catalog_path = PathBuf::from(v);
    }
    if let Some(v) = env_var("CRAWLER_LOG_LEVEL") {
        config.logging.level = v;
    }
}
