//! Selector configuration for the release archive
//!
//! Every extraction goes through a fallback chain: the site's current
//! markup first, older or more generic shapes behind it. When the theme
//! changes, this file is the only place that needs to learn the new
//! selectors.

use serde::{Deserialize, Serialize};

/// Full selector configuration for both page kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    pub listing: ListingSelectors,
    pub detail: DetailSelectors,
}

/// Selectors for listing pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// Anchors pointing at entry detail pages, in fallback order.
    pub entry_link: Vec<String>,

    /// The "next page" anchor.
    pub next_page: Vec<String>,
}

/// Selectors for detail pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    pub title: Vec<String>,
    pub poster: Vec<String>,
    pub synopsis: Vec<String>,
    pub release_number: Vec<String>,
    pub imdb_link: Vec<String>,
    pub download_link: Vec<String>,
    pub release_type: Vec<String>,
    /// The label/value details table scanned by the first pass.
    pub details_table: Vec<String>,
    /// Definition-list fallback for the same data.
    pub details_list: Vec<String>,
    /// Used only when the details table had no translator row.
    pub translator_fallback: Vec<String>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            listing: ListingSelectors::default(),
            detail: DetailSelectors::default(),
        }
    }
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            entry_link: vec![
                ".loop-entry .entry-title a".to_string(),
                "article.loop-entry h2 a".to_string(),
                "h2.entry-title a".to_string(),
                ".post-title a".to_string(),
            ],
            next_page: vec![
                "a.next.page-numbers".to_string(),
                "a[rel=\"next\"]".to_string(),
                ".pagination .next a".to_string(),
            ],
        }
    }
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            title: vec![
                "h1#release-title".to_string(),
                "h1.entry-title".to_string(),
                ".post-title h1".to_string(),
                "h1".to_string(),
            ],
            poster: vec![
                "figure#release-poster img".to_string(),
                ".post-thumbnail img".to_string(),
                "img[src*=\"poster\"]".to_string(),
            ],
            synopsis: vec![
                "div#synopsis".to_string(),
                ".entry-content".to_string(),
                ".synopsis".to_string(),
            ],
            release_number: vec!["h4#release-number".to_string()],
            imdb_link: vec![
                "a#imdb-button".to_string(),
                "a[href*=\"imdb.com\"]".to_string(),
            ],
            download_link: vec![
                "a#download-button".to_string(),
                "a[data-downloadurl]".to_string(),
                ".download-link a".to_string(),
            ],
            release_type: vec!["a#release-type-button".to_string()],
            details_table: vec![
                "table#release-details-table".to_string(),
                ".release-details table".to_string(),
            ],
            details_list: vec!["dl.release-details".to_string()],
            translator_fallback: vec![
                ".translator-info a".to_string(),
                "a[href*=\"/tag/\"]".to_string(),
            ],
        }
    }
}
