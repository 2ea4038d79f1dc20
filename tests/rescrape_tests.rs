//! The admin re-scrape signal: one URL through the detail pipeline,
//! merged in place, pagination untouched.

mod common;

use std::sync::Arc;

use common::{PageScript, ScriptedFetcher, detail_page, detail_page_with_genre};
use mso_crawler::crawl_engine::{self, CrawlError, CrawlOrchestrator};
use mso_crawler::domain::Catalog;
use mso_crawler::infrastructure::catalog_store::CatalogStore;
use mso_crawler::infrastructure::config::CrawlerConfig;

const DETAIL_URL: &str = "https://site.test/drishyam/";

fn test_config() -> CrawlerConfig {
    let mut config = CrawlerConfig::default();
    config.site.base_url = "https://site.test".to_string();
    config.site.releases_url = "https://site.test/releases/".to_string();
    config
}

#[tokio::test]
async fn rescrape_inserts_a_new_entry() {
    let fetcher = ScriptedFetcher::new().with_page(
        DETAIL_URL,
        PageScript::Html(detail_page("Drishyam", "tt3417422")),
    );
    let orchestrator = CrawlOrchestrator::new(Arc::new(fetcher), &test_config()).unwrap();

    let outcome = orchestrator
        .rescrape(Catalog::new(), DETAIL_URL)
        .await
        .unwrap();

    assert_eq!(outcome.report.changes.added, vec!["tt3417422"]);
    assert_eq!(outcome.report.pages_visited, 0);
    assert_eq!(outcome.catalog["tt3417422"].title, "Drishyam");
}

#[tokio::test]
async fn rescrape_updates_in_place_and_keeps_the_id_stable() {
    let fetcher = ScriptedFetcher::new().with_page(
        DETAIL_URL,
        PageScript::Html(detail_page("Drishyam", "tt3417422")),
    );
    let orchestrator = CrawlOrchestrator::new(Arc::new(fetcher), &test_config()).unwrap();
    let first = orchestrator
        .rescrape(Catalog::new(), DETAIL_URL)
        .await
        .unwrap();

    // The page changed its genre row; the id must not move.
    let fetcher = ScriptedFetcher::new().with_page(
        DETAIL_URL,
        PageScript::Html(detail_page_with_genre("Drishyam", "tt3417422", "Thriller")),
    );
    let orchestrator = CrawlOrchestrator::new(Arc::new(fetcher), &test_config()).unwrap();
    let second = orchestrator.rescrape(first.catalog, DETAIL_URL).await.unwrap();

    assert!(second.report.changes.added.is_empty());
    assert_eq!(second.report.changes.updated, vec!["tt3417422"]);
    assert_eq!(second.catalog.len(), 1);
    assert_eq!(
        second.catalog["tt3417422"].genre.as_deref(),
        Some("Thriller")
    );
}

#[tokio::test]
async fn rescrape_of_unchanged_page_reports_nothing() {
    let fetcher = ScriptedFetcher::new().with_page(
        DETAIL_URL,
        PageScript::Html(detail_page("Drishyam", "tt3417422")),
    );
    let orchestrator = CrawlOrchestrator::new(Arc::new(fetcher), &test_config()).unwrap();
    let first = orchestrator
        .rescrape(Catalog::new(), DETAIL_URL)
        .await
        .unwrap();

    let fetcher = ScriptedFetcher::new().with_page(
        DETAIL_URL,
        PageScript::Html(detail_page("Drishyam", "tt3417422")),
    );
    let orchestrator = CrawlOrchestrator::new(Arc::new(fetcher), &test_config()).unwrap();
    let second = orchestrator.rescrape(first.catalog, DETAIL_URL).await.unwrap();

    assert!(second.report.changes.is_empty());
}

#[tokio::test]
async fn rescrape_failure_is_reported_to_the_caller() {
    let fetcher = ScriptedFetcher::new().with_page(DETAIL_URL, PageScript::Permanent);
    let orchestrator = CrawlOrchestrator::new(Arc::new(fetcher), &test_config()).unwrap();

    let result = orchestrator.rescrape(Catalog::new(), DETAIL_URL).await;
    assert!(matches!(result, Err(CrawlError::RescrapeFailed { .. })));
}

#[tokio::test]
async fn rescrape_with_store_persists_the_result() {
    let dir = tempfile::tempdir().unwrap();
    let store = CatalogStore::new(dir.path().join("db.json"));
    let config = test_config();

    let fetcher = ScriptedFetcher::new().with_page(
        DETAIL_URL,
        PageScript::Html(detail_page("Drishyam", "tt3417422")),
    );
    let orchestrator = CrawlOrchestrator::new(Arc::new(fetcher), &config).unwrap();

    let report =
        crawl_engine::rescrape_with_store(&orchestrator, &store, &config.storage, DETAIL_URL)
            .await
            .unwrap();
    assert_eq!(report.changes.added, vec!["tt3417422"]);

    let reloaded = store.load().await.unwrap();
    assert!(reloaded.contains_key("tt3417422"));
}
