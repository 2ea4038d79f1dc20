//! Intermediate release records produced by the parsers
//!
//! These are the pre-identity shapes: what a listing page says about an
//! entry, and what a detail page says about a release before a catalog
//! key has been assigned.

use crate::domain::catalog::Translator;

/// One entry summary from a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSummary {
    pub title: String,
    pub detail_url: String,
}

/// One parsed listing page: its entries in page order plus the link to
/// the next page, if any. An empty entry list with a next link is valid;
/// the orchestrator decides whether to keep paginating.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub entries: Vec<ListingSummary>,
    pub next_page_url: Option<String>,
}

/// Full structured record extracted from one detail page.
///
/// Every field except `title` and `source_url` is optional: a selector
/// miss loses that one field, never the record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRelease {
    pub title: String,
    pub poster_url: Option<String>,
    pub description_localized: Option<String>,
    pub release_label: Option<String>,
    pub imdb_url: Option<String>,
    pub imdb_rating: Option<String>,
    pub certification: Option<String>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub language: Option<String>,
    pub production: Option<String>,
    pub translator: Option<Translator>,
    pub subtitle_file_url: Option<String>,
    /// The page declared itself a series release (release-type badge).
    pub is_series: bool,
    pub source_url: String,
}
