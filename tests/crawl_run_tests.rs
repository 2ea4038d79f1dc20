//! End-to-end crawl runs against a scripted fetcher: pagination,
//! early stop, failure containment, and persistence semantics.

mod common;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use common::{
    PageScript, ScriptedFetcher, detail_page, detail_page_with_genre, listing_page,
    malformed_detail_page,
};
use mso_crawler::crawl_engine::{self, CrawlError, CrawlOrchestrator, StopReason};
use mso_crawler::domain::Catalog;
use mso_crawler::infrastructure::catalog_store::CatalogStore;
use mso_crawler::infrastructure::config::CrawlerConfig;

const RELEASES: &str = "https://site.test/releases/";

fn test_config() -> CrawlerConfig {
    let mut config = CrawlerConfig::default();
    config.site.base_url = "https://site.test".to_string();
    config.site.releases_url = RELEASES.to_string();
    config.crawl.max_pages = 10;
    config.crawl.detail_concurrency = 2;
    config.crawl.early_stop_threshold = 3;
    config
}

fn page_url(n: u32) -> String {
    if n == 1 {
        RELEASES.to_string()
    } else {
        format!("https://site.test/releases/page/{n}/")
    }
}

/// Ten listing pages, one movie each, fully linked.
fn ten_page_site() -> ScriptedFetcher {
    let mut fetcher = ScriptedFetcher::new();
    for n in 1..=10u32 {
        let detail_url = format!("https://site.test/movie-{n}/");
        let next = (n < 10).then(|| page_url(n + 1));
        fetcher = fetcher
            .with_page(
                &page_url(n),
                PageScript::Html(listing_page(
                    &[(&format!("Movie {n}"), &detail_url)],
                    next.as_deref(),
                )),
            )
            .with_page(
                &detail_url,
                PageScript::Html(detail_page(
                    &format!("Movie {n}"),
                    &format!("tt100000{n}"),
                )),
            );
    }
    fetcher
}

#[tokio::test]
async fn first_run_adds_every_entry() {
    let fetcher = Arc::new(ten_page_site());
    let orchestrator = CrawlOrchestrator::new(fetcher.clone(), &test_config()).unwrap();

    let outcome = orchestrator.run(Catalog::new()).await.unwrap();

    assert_eq!(outcome.report.changes.added.len(), 10);
    assert!(outcome.report.changes.updated.is_empty());
    assert_eq!(outcome.report.pages_visited, 10);
    assert_eq!(outcome.report.entries_skipped, 0);
    assert_eq!(outcome.report.stop_reason, StopReason::EndOfListing);
    assert_eq!(outcome.catalog.len(), 10);
    assert!(outcome.catalog.contains_key("tt1000001"));
}

#[tokio::test]
async fn second_run_over_unchanged_site_is_idempotent() {
    let orchestrator1 =
        CrawlOrchestrator::new(Arc::new(ten_page_site()), &test_config()).unwrap();
    let first = orchestrator1.run(Catalog::new()).await.unwrap();

    let orchestrator2 =
        CrawlOrchestrator::new(Arc::new(ten_page_site()), &test_config()).unwrap();
    let second = orchestrator2.run(first.catalog).await.unwrap();

    assert!(second.report.changes.is_empty());
    assert_eq!(second.catalog.len(), 10);
}

#[tokio::test]
async fn early_stop_skips_listing_pages_past_the_threshold() {
    // First run fills the catalog.
    let orchestrator1 =
        CrawlOrchestrator::new(Arc::new(ten_page_site()), &test_config()).unwrap();
    let first = orchestrator1.run(Catalog::new()).await.unwrap();

    // Second run over the same site: pages 1-3 yield nothing new, so
    // with threshold 3 pagination must stop after page 3.
    let fetcher = Arc::new(ten_page_site());
    let orchestrator2 = CrawlOrchestrator::new(fetcher.clone(), &test_config()).unwrap();
    let second = orchestrator2.run(first.catalog).await.unwrap();

    assert_eq!(second.report.stop_reason, StopReason::EarlyStop);
    assert_eq!(second.report.pages_visited, 3);
    for n in 1..=3u32 {
        assert!(fetcher.requested(&page_url(n)), "page {n} should be fetched");
    }
    for n in 4..=10u32 {
        assert!(
            !fetcher.requested(&page_url(n)),
            "page {n} should not be fetched after early stop"
        );
    }
}

#[tokio::test]
async fn updated_entry_resets_the_quiet_streak() {
    let orchestrator1 =
        CrawlOrchestrator::new(Arc::new(ten_page_site()), &test_config()).unwrap();
    let first = orchestrator1.run(Catalog::new()).await.unwrap();

    // Same site, but movie 2's genre changed: page 2 is not quiet, so
    // the early-stop streak restarts and pages 4 and 5 are reached.
    let mut fetcher = ten_page_site();
    fetcher = fetcher.with_page(
        "https://site.test/movie-2/",
        PageScript::Html(detail_page_with_genre("Movie 2", "tt1000002", "Thriller")),
    );
    let fetcher = Arc::new(fetcher);
    let orchestrator2 = CrawlOrchestrator::new(fetcher.clone(), &test_config()).unwrap();
    let second = orchestrator2.run(first.catalog).await.unwrap();

    assert_eq!(second.report.changes.updated, vec!["tt1000002"]);
    assert_eq!(second.report.stop_reason, StopReason::EarlyStop);
    assert_eq!(second.report.pages_visited, 5);
    assert!(fetcher.requested(&page_url(5)));
    assert!(!fetcher.requested(&page_url(6)));
}

#[tokio::test]
async fn one_bad_detail_page_among_five_is_contained() {
    let mut entries = Vec::new();
    let mut fetcher = ScriptedFetcher::new();
    for n in 1..=5u32 {
        let detail_url = format!("https://site.test/movie-{n}/");
        entries.push((format!("Movie {n}"), detail_url.clone()));
        let script = if n == 3 {
            PageScript::Html(malformed_detail_page())
        } else {
            PageScript::Html(detail_page(&format!("Movie {n}"), &format!("tt100000{n}")))
        };
        fetcher = fetcher.with_page(&detail_url, script);
    }
    let entry_refs: Vec<(&str, &str)> = entries
        .iter()
        .map(|(t, u)| (t.as_str(), u.as_str()))
        .collect();
    let fetcher = fetcher.with_page(RELEASES, PageScript::Html(listing_page(&entry_refs, None)));

    let orchestrator = CrawlOrchestrator::new(Arc::new(fetcher), &test_config()).unwrap();
    let outcome = orchestrator.run(Catalog::new()).await.unwrap();

    assert_eq!(outcome.report.changes.added.len(), 4);
    assert_eq!(outcome.report.entries_skipped, 1);
    assert_eq!(outcome.report.entries_merged, 4);
    assert_eq!(outcome.catalog.len(), 4);
    assert!(!outcome.catalog.contains_key("tt1000003"));
}

#[tokio::test]
async fn detail_fetch_failure_is_a_skip_not_a_run_failure() {
    let fetcher = ScriptedFetcher::new()
        .with_page(
            RELEASES,
            PageScript::Html(listing_page(
                &[
                    ("Movie 1", "https://site.test/movie-1/"),
                    ("Movie 2", "https://site.test/movie-2/"),
                ],
                None,
            )),
        )
        .with_page(
            "https://site.test/movie-1/",
            PageScript::Html(detail_page("Movie 1", "tt1000001")),
        )
        .with_page("https://site.test/movie-2/", PageScript::Permanent);

    let orchestrator = CrawlOrchestrator::new(Arc::new(fetcher), &test_config()).unwrap();
    let outcome = orchestrator.run(Catalog::new()).await.unwrap();

    assert_eq!(outcome.report.changes.added, vec!["tt1000001"]);
    assert_eq!(outcome.report.entries_skipped, 1);
}

#[tokio::test]
async fn unreachable_listing_host_fails_the_run() {
    let fetcher = ScriptedFetcher::new().with_page(RELEASES, PageScript::Transient);
    let orchestrator = CrawlOrchestrator::new(Arc::new(fetcher), &test_config()).unwrap();

    let result = orchestrator.run(Catalog::new()).await;
    assert!(matches!(result, Err(CrawlError::HostUnreachable { .. })));
}

#[tokio::test]
async fn listing_failure_past_page_one_keeps_partial_progress() {
    let fetcher = ScriptedFetcher::new()
        .with_page(
            RELEASES,
            PageScript::Html(listing_page(
                &[("Movie 1", "https://site.test/movie-1/")],
                Some("https://site.test/releases/page/2/"),
            )),
        )
        .with_page(
            "https://site.test/movie-1/",
            PageScript::Html(detail_page("Movie 1", "tt1000001")),
        )
        .with_page("https://site.test/releases/page/2/", PageScript::Transient);

    let orchestrator = CrawlOrchestrator::new(Arc::new(fetcher), &test_config()).unwrap();
    let outcome = orchestrator.run(Catalog::new()).await.unwrap();

    assert_eq!(outcome.report.changes.added, vec!["tt1000001"]);
    assert_eq!(outcome.report.stop_reason, StopReason::ListingFetchFailed);
}

#[tokio::test]
async fn series_seasons_occupy_distinct_catalog_slots() {
    let fetcher = ScriptedFetcher::new()
        .with_page(
            RELEASES,
            PageScript::Html(listing_page(
                &[
                    ("Dark Season 1", "https://site.test/dark-season-1/"),
                    ("Dark Season 2", "https://site.test/dark-season-2/"),
                ],
                None,
            )),
        )
        .with_page(
            "https://site.test/dark-season-1/",
            PageScript::Html(detail_page("Dark Season 1", "tt5753856")),
        )
        .with_page(
            "https://site.test/dark-season-2/",
            PageScript::Html(detail_page("Dark Season 2", "tt5753856")),
        );

    let orchestrator = CrawlOrchestrator::new(Arc::new(fetcher), &test_config()).unwrap();
    let outcome = orchestrator.run(Catalog::new()).await.unwrap();

    assert_eq!(outcome.catalog.len(), 2);
    assert!(outcome.catalog.contains_key("tt5753856-S1"));
    assert!(outcome.catalog.contains_key("tt5753856-S2"));
}

#[tokio::test]
async fn cancellation_before_the_first_page_yields_an_empty_run() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let fetcher = Arc::new(ten_page_site());
    let orchestrator =
        CrawlOrchestrator::with_cancellation(fetcher.clone(), &test_config(), cancel).unwrap();
    let outcome = orchestrator.run(Catalog::new()).await.unwrap();

    assert_eq!(outcome.report.stop_reason, StopReason::Cancelled);
    assert_eq!(outcome.report.pages_visited, 0);
    assert!(!fetcher.requested(RELEASES));
}

#[tokio::test]
async fn run_with_store_persists_the_merged_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let store = CatalogStore::new(dir.path().join("db.json"));

    let mut config = test_config();
    config.storage.write_series_index = true;
    config.storage.series_index_path = dir.path().join("series.json");

    let orchestrator = CrawlOrchestrator::new(Arc::new(ten_page_site()), &config).unwrap();
    let report = crawl_engine::run_with_store(&orchestrator, &store, &config.storage)
        .await
        .unwrap();
    assert_eq!(report.changes.added.len(), 10);

    let reloaded = store.load().await.unwrap();
    assert_eq!(reloaded.len(), 10);
    assert_eq!(
        reloaded["tt1000001"].subtitle_file_url.as_deref(),
        Some("https://site.test/files/tt1000001.zip")
    );
    // No seasons in this fixture, so the series index is an empty map.
    let series: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("series.json")).unwrap())
            .unwrap();
    assert_eq!(series, serde_json::json!({}));
}

#[tokio::test]
async fn failed_run_does_not_touch_the_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    let store = CatalogStore::new(&path);

    // Seed a last-known-good catalog.
    let orchestrator1 =
        CrawlOrchestrator::new(Arc::new(ten_page_site()), &test_config()).unwrap();
    let seeded = orchestrator1.run(Catalog::new()).await.unwrap();
    store.save(&seeded.catalog).await.unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    // This run cannot reach the listing host at all.
    let fetcher = ScriptedFetcher::new().with_page(RELEASES, PageScript::Transient);
    let orchestrator2 = CrawlOrchestrator::new(Arc::new(fetcher), &test_config()).unwrap();
    let config = test_config();
    let result = crawl_engine::run_with_store(&orchestrator2, &store, &config.storage).await;

    assert!(result.is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}
