//! Catalog identity assignment
//!
//! Derives the catalog key for a parsed release: the IMDb id alone for a
//! movie, or the IMDb id with a `-S<n>` suffix for one season of a
//! series. Seasons of the same series share the IMDb prefix, so a
//! multi-season show occupies several catalog slots under one external id.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::release::ParsedRelease;

static IMDB_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"tt\d+").unwrap());

/// Season markers in URL slugs: `.../season-2/`, `?season=2`, `...-s02`.
static URL_SEASON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)season[^0-9]{0,3}(\d{1,2})|[-_/]s(\d{2})(?:[-_/]|$)").unwrap());

/// Season markers in title text, English or Malayalam.
static TITLE_SEASON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:season|സീസൺ)\s*(\d{1,2})").unwrap());

#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("no IMDb id found for '{title}' ({url})")]
    MissingImdbId { title: String, url: String },
}

/// Assigned catalog identity for one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseIdentity {
    pub external_id: String,
    pub season: Option<u32>,
}

impl ReleaseIdentity {
    /// The catalog key this identity maps to.
    pub fn catalog_id(&self) -> String {
        match self.season {
            Some(season) => format!("{}-S{}", self.external_id, season),
            None => self.external_id.clone(),
        }
    }
}

/// Extract the `tt`-prefixed IMDb id from an IMDb URL.
pub fn extract_imdb_id(imdb_url: &str) -> Option<String> {
    IMDB_ID_RE.find(imdb_url).map(|m| m.as_str().to_string())
}

/// Season number encoded in a detail-page URL, if any.
pub fn season_from_url(url: &str) -> Option<u32> {
    URL_SEASON_RE.captures(url).and_then(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| m.as_str().parse().ok())
    })
}

/// Season number spelled out in the release title, if any.
pub fn season_from_title(title: &str) -> Option<u32> {
    TITLE_SEASON_RE
        .captures(title)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Derive the catalog identity for a parsed release.
///
/// A release without an extractable IMDb id cannot be keyed and is
/// rejected; the caller drops it as a skip. When the URL and the title
/// disagree on the season number, the URL wins: slugs are generated from
/// the release form and survive cosmetic title edits.
pub fn assign_identity(release: &ParsedRelease) -> Result<ReleaseIdentity, IdentityError> {
    let external_id = release
        .imdb_url
        .as_deref()
        .and_then(extract_imdb_id)
        .ok_or_else(|| IdentityError::MissingImdbId {
            title: release.title.clone(),
            url: release.source_url.clone(),
        })?;

    let url_season = season_from_url(&release.source_url);
    let title_season = season_from_title(&release.title);

    let season = match (url_season, title_season) {
        (Some(u), Some(t)) if u != t => {
            warn!(
                "Season conflict for {}: URL says {} but title says {}; trusting the URL",
                release.source_url, u, t
            );
            Some(u)
        }
        (Some(u), _) => Some(u),
        (None, Some(t)) => Some(t),
        (None, None) => {
            if release.is_series {
                debug!(
                    "Series release without a season marker, keying by IMDb id alone: {}",
                    release.source_url
                );
            }
            None
        }
    };

    Ok(ReleaseIdentity {
        external_id,
        season,
    })
}
