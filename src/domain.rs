//! Domain module - catalog entities and identity rules
//!
//! Everything here is plain data and pure functions: the catalog map,
//! the parsed-release shapes, and the identity assignment policy. No
//! I/O, no HTML.

pub mod catalog;
pub mod identity;
pub mod release;

pub use catalog::{Catalog, CatalogEntry, ChangeSet, SeasonRef, Translator, series_index};
pub use identity::{IdentityError, ReleaseIdentity, assign_identity, extract_imdb_id};
pub use release::{ListingPage, ListingSummary, ParsedRelease};
