//! Catalog merger
//!
//! Reconciles freshly scraped entries with the running catalog. The
//! merge itself is a pure function with no ordering dependency between
//! ids, so batches may arrive in any order. At runtime the catalog is
//! owned by a single merger task; concurrent detail workers submit
//! entries over a channel instead of sharing a locked map.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::crawl_engine::report::CrawlError;
use crate::domain::catalog::{Catalog, CatalogEntry, ChangeSet};

/// Merge a batch of fresh entries into the catalog.
///
/// New ids are inserted and recorded as added. Existing ids are
/// overwritten wholesale (last write wins, no field-level conflict
/// resolution) and recorded as updated only when some field other than
/// the scrape timestamp actually changed. Entries already in the
/// catalog but absent from the batch are left alone: the crawl is
/// additive, never a mirror.
pub fn merge_batch(
    catalog: &mut Catalog,
    batch: impl IntoIterator<Item = CatalogEntry>,
) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for entry in batch {
        match catalog.get(&entry.id) {
            None => {
                debug!("New catalog entry: {} ({})", entry.id, entry.title);
                changes.added.push(entry.id.clone());
            }
            Some(existing) if !existing.content_eq(&entry) => {
                debug!("Updated catalog entry: {} ({})", entry.id, entry.title);
                changes.updated.push(entry.id.clone());
            }
            // Unchanged re-scrape: refresh the timestamp silently.
            Some(_) => {}
        }
        catalog.insert(entry.id.clone(), entry);
    }

    changes
}

/// Per-page delta the orchestrator uses for its early-stop decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageDelta {
    pub added: usize,
    pub updated: usize,
}

/// Everything the merger hands back when the run finishes.
#[derive(Debug)]
pub struct MergeOutcome {
    pub catalog: Catalog,
    pub changes: ChangeSet,
    pub entries_merged: usize,
}

enum MergeCommand {
    Submit(Box<CatalogEntry>),
    PageBoundary {
        respond_to: oneshot::Sender<PageDelta>,
    },
    Finish {
        respond_to: oneshot::Sender<MergeOutcome>,
    },
}

/// Handle to the single-writer merger task.
///
/// Cloneable; detail workers hold clones and `submit`, the orchestrator
/// keeps one for `page_boundary`/`finish`.
#[derive(Clone)]
pub struct MergerHandle {
    tx: mpsc::Sender<MergeCommand>,
}

impl MergerHandle {
    /// Spawn the merger task owning `catalog`.
    pub fn spawn(catalog: Catalog) -> Self {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(merger_task(catalog, rx));
        Self { tx }
    }

    /// Submit one freshly scraped entry for merging.
    pub async fn submit(&self, entry: CatalogEntry) {
        if self
            .tx
            .send(MergeCommand::Submit(Box::new(entry)))
            .await
            .is_err()
        {
            error!("Merger task is gone; dropping submitted entry");
        }
    }

    /// Fetch and reset the delta accumulated since the last boundary.
    pub async fn page_boundary(&self) -> Result<PageDelta, CrawlError> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(MergeCommand::PageBoundary { respond_to })
            .await
            .map_err(|_| CrawlError::MergerGone)?;
        response.await.map_err(|_| CrawlError::MergerGone)
    }

    /// Stop the merger and collect the final catalog and change set.
    pub async fn finish(self) -> Result<MergeOutcome, CrawlError> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(MergeCommand::Finish { respond_to })
            .await
            .map_err(|_| CrawlError::MergerGone)?;
        response.await.map_err(|_| CrawlError::MergerGone)
    }
}

async fn merger_task(mut catalog: Catalog, mut rx: mpsc::Receiver<MergeCommand>) {
    let mut changes = ChangeSet::default();
    let mut page_delta = PageDelta::default();
    let mut entries_merged = 0usize;

    while let Some(command) = rx.recv().await {
        match command {
            MergeCommand::Submit(entry) => {
                let delta = merge_batch(&mut catalog, [*entry]);
                page_delta.added += delta.added.len();
                page_delta.updated += delta.updated.len();
                entries_merged += 1;
                changes.absorb(delta);
            }
            MergeCommand::PageBoundary { respond_to } => {
                let _ = respond_to.send(page_delta);
                page_delta = PageDelta::default();
            }
            MergeCommand::Finish { respond_to } => {
                let _ = respond_to.send(MergeOutcome {
                    catalog,
                    changes,
                    entries_merged,
                });
                return;
            }
        }
    }
    // Channel closed without Finish: the run was aborted, nothing to
    // hand back.
    debug!("Merger task shutting down after abort");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(id: &str, title: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            title: title.to_string(),
            poster_url: None,
            description_localized: None,
            release_label: None,
            imdb_url: None,
            imdb_rating: None,
            certification: None,
            genre: None,
            director: None,
            language: None,
            production: None,
            translator: None,
            subtitle_file_url: None,
            source_url: format!("https://example.org/{id}"),
            last_scraped_at: Utc::now(),
        }
    }

    #[test]
    fn new_ids_are_added() {
        let mut catalog = Catalog::new();
        let changes = merge_batch(&mut catalog, [entry("tt1", "One"), entry("tt2", "Two")]);

        assert_eq!(changes.added, vec!["tt1", "tt2"]);
        assert!(changes.updated.is_empty());
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn unchanged_rescrape_is_not_an_update() {
        let mut catalog = Catalog::new();
        merge_batch(&mut catalog, [entry("tt1", "One")]);

        let mut fresh = entry("tt1", "One");
        fresh.last_scraped_at = fresh.last_scraped_at + chrono::Duration::days(1);
        let changes = merge_batch(&mut catalog, [fresh.clone()]);

        assert!(changes.is_empty());
        // The timestamp still moved forward.
        assert_eq!(
            catalog["tt1"].last_scraped_at,
            fresh.last_scraped_at
        );
    }

    #[test]
    fn changed_field_records_an_update() {
        let mut catalog = Catalog::new();
        merge_batch(&mut catalog, [entry("tt1", "One")]);

        let mut fresh = entry("tt1", "One");
        fresh.genre = Some("Drama".to_string());
        let changes = merge_batch(&mut catalog, [fresh]);

        assert!(changes.added.is_empty());
        assert_eq!(changes.updated, vec!["tt1"]);
        assert_eq!(catalog["tt1"].genre.as_deref(), Some("Drama"));
    }

    #[test]
    fn merge_is_order_independent_for_disjoint_batches() {
        let base: Catalog = {
            let mut c = Catalog::new();
            merge_batch(&mut c, [entry("tt0", "Zero")]);
            c
        };
        let b1 = vec![entry("tt1", "One"), entry("tt2", "Two")];
        let b2 = vec![entry("tt3", "Three")];

        let mut forward = base.clone();
        merge_batch(&mut forward, b1.clone());
        merge_batch(&mut forward, b2.clone());

        let mut backward = base.clone();
        merge_batch(&mut backward, b2);
        merge_batch(&mut backward, b1);

        let keys_forward: Vec<_> = forward.keys().collect();
        let keys_backward: Vec<_> = backward.keys().collect();
        assert_eq!(keys_forward, keys_backward);
        for (id, e) in &forward {
            assert!(backward[id].content_eq(e));
        }
    }

    #[test]
    fn absent_entries_are_never_deleted() {
        let mut catalog = Catalog::new();
        merge_batch(&mut catalog, [entry("tt1", "One"), entry("tt2", "Two")]);

        // Next run only sees tt2.
        let changes = merge_batch(&mut catalog, [entry("tt2", "Two")]);

        assert!(changes.is_empty());
        assert!(catalog.contains_key("tt1"));
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn merger_task_tracks_page_deltas() {
        let handle = MergerHandle::spawn(Catalog::new());

        handle.submit(entry("tt1", "One")).await;
        handle.submit(entry("tt2", "Two")).await;
        let delta = handle.page_boundary().await.unwrap();
        assert_eq!(delta.added, 2);
        assert_eq!(delta.updated, 0);

        // Same entries again: quiet page.
        handle.submit(entry("tt1", "One")).await;
        let delta = handle.page_boundary().await.unwrap();
        assert_eq!(delta.added, 0);
        assert_eq!(delta.updated, 0);

        let outcome = handle.finish().await.unwrap();
        assert_eq!(outcome.catalog.len(), 2);
        assert_eq!(outcome.changes.added.len(), 2);
        assert_eq!(outcome.entries_merged, 3);
    }
}
