//! Crawler entry point
//!
//! Two verbs: the default full pagination crawl, and `rescrape <url>`
//! for the admin signal that refreshes one catalog entry in place.
//! Configuration comes from the config file plus `CRAWLER_*` env vars;
//! the scheduler that invokes this binary is expected to serialize runs.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use mso_crawler::crawl_engine::{self, CrawlOrchestrator};
use mso_crawler::infrastructure::catalog_store::CatalogStore;
use mso_crawler::infrastructure::config::ConfigManager;
use mso_crawler::infrastructure::http_client::{HttpClient, HttpClientConfig};
use mso_crawler::infrastructure::logging::init_logging_with_config;

#[tokio::main]
async fn main() -> Result<()> {
    let manager = ConfigManager::new()?;
    let config = manager.load().await?;
    init_logging_with_config(&config.logging)?;

    // Two-stage shutdown: the first interrupt stops pagination but lets
    // in-flight detail work finish and merge; a second one aborts the
    // open requests as well.
    let stop_pagination = CancellationToken::new();
    let abort_requests = CancellationToken::new();
    spawn_signal_handler(stop_pagination.clone(), abort_requests.clone());

    let http_config = HttpClientConfig::from_crawler_config(&config.site, &config.crawl);
    let fetcher = Arc::new(HttpClient::with_cancellation(http_config, abort_requests)?);
    let orchestrator = CrawlOrchestrator::with_cancellation(fetcher, &config, stop_pagination)
        .context("Failed to build crawl orchestrator")?;
    let store = CatalogStore::new(&config.storage.catalog_path);

    let mut args = std::env::args().skip(1);
    let report = match args.next().as_deref() {
        None | Some("crawl") => {
            crawl_engine::run_with_store(&orchestrator, &store, &config.storage).await
        }
        Some("rescrape") => {
            let url = args
                .next()
                .context("Usage: mso-crawler rescrape <detail-url>")?;
            crawl_engine::rescrape_with_store(&orchestrator, &store, &config.storage, &url).await
        }
        Some(other) => {
            anyhow::bail!("Unknown command '{other}'. Usage: mso-crawler [crawl | rescrape <url>]");
        }
    };

    match report {
        Ok(report) => {
            // The change set goes to stdout as JSON for the notifier.
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!("Run failed, catalog left untouched: {e}");
            Err(e.into())
        }
    }
}

fn spawn_signal_handler(stop_pagination: CancellationToken, abort_requests: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received; finishing in-flight work before stopping");
            stop_pagination.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Second interrupt; aborting open requests");
            abort_requests.cancel();
        }
    });
}
