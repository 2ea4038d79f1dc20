//! Catalog data model for subtitle releases
//!
//! A catalog is the persisted map from release identity to structured
//! metadata. Entries are only ever added or overwritten by the crawl;
//! removal is an out-of-band admin action on the catalog file.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Translator credit attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translator {
    pub name: String,
    pub url: Option<String>,
}

/// One subtitle release as stored in the catalog.
///
/// `id` is the catalog key: the IMDb id for a movie (`tt1234567`),
/// or IMDb id plus season suffix for a series season (`tt1234567-S2`).
/// Field names follow the JSON shape the front-end bot reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    #[serde(rename = "posterURL")]
    pub poster_url: Option<String>,
    #[serde(rename = "descriptionLocalized")]
    pub description_localized: Option<String>,
    #[serde(rename = "releaseLabel")]
    pub release_label: Option<String>,
    #[serde(rename = "imdbURL")]
    pub imdb_url: Option<String>,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: Option<String>,
    pub certification: Option<String>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub language: Option<String>,
    pub production: Option<String>,
    pub translator: Option<Translator>,
    #[serde(rename = "subtitleFileURL")]
    pub subtitle_file_url: Option<String>,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    #[serde(rename = "lastScrapedAt")]
    pub last_scraped_at: DateTime<Utc>,
}

impl CatalogEntry {
    /// Build a catalog entry from a parsed release under its assigned id.
    pub fn from_release(
        id: String,
        release: crate::domain::release::ParsedRelease,
        scraped_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: release.title,
            poster_url: release.poster_url,
            description_localized: release.description_localized,
            release_label: release.release_label,
            imdb_url: release.imdb_url,
            imdb_rating: release.imdb_rating,
            certification: release.certification,
            genre: release.genre,
            director: release.director,
            language: release.language,
            production: release.production,
            translator: release.translator,
            subtitle_file_url: release.subtitle_file_url,
            source_url: release.source_url,
            last_scraped_at: scraped_at,
        }
    }

    /// Compare the scraped content of two entries, ignoring `last_scraped_at`.
    ///
    /// Re-scraping an unchanged page refreshes the timestamp but must not
    /// show up in the change set.
    pub fn content_eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.poster_url == other.poster_url
            && self.description_localized == other.description_localized
            && self.release_label == other.release_label
            && self.imdb_url == other.imdb_url
            && self.imdb_rating == other.imdb_rating
            && self.certification == other.certification
            && self.genre == other.genre
            && self.director == other.director
            && self.language == other.language
            && self.production == other.production
            && self.translator == other.translator
            && self.subtitle_file_url == other.subtitle_file_url
            && self.source_url == other.source_url
    }
}

/// The persisted catalog: release id -> entry.
///
/// A `BTreeMap` keeps serialization deterministic, so unchanged runs
/// produce byte-identical catalog files.
pub type Catalog = BTreeMap<String, CatalogEntry>;

/// Ids touched by one crawl run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub updated: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.updated.len()
    }

    /// Fold another change set into this one.
    pub fn absorb(&mut self, other: ChangeSet) {
        self.added.extend(other.added);
        self.updated.extend(other.updated);
    }
}

/// One season of a series as seen from the aggregated view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonRef {
    pub id: String,
    pub season: Option<u32>,
    pub title: String,
}

/// Read-only series aggregation: IMDb id -> seasons in the catalog.
///
/// Derived from the primary catalog by grouping on the id prefix; only
/// external ids with at least one season-suffixed entry are included.
pub fn series_index(catalog: &Catalog) -> BTreeMap<String, Vec<SeasonRef>> {
    let mut groups: BTreeMap<String, Vec<SeasonRef>> = BTreeMap::new();

    for (id, entry) in catalog {
        let (external_id, season) = match id.split_once("-S") {
            Some((prefix, suffix)) => match suffix.parse::<u32>() {
                Ok(season) => (prefix.to_string(), Some(season)),
                Err(_) => (id.clone(), None),
            },
            None => (id.clone(), None),
        };

        groups.entry(external_id).or_default().push(SeasonRef {
            id: id.clone(),
            season,
            title: entry.title.clone(),
        });
    }

    groups.retain(|_, seasons| seasons.iter().any(|s| s.season.is_some()));
    for seasons in groups.values_mut() {
        seasons.sort_by_key(|s| s.season);
    }
    groups
}
