//! HTML parsing infrastructure for the release archive
//!
//! Trait-based parsing architecture with fallback selector strategies
//! and per-field error containment: a broken selector costs one field,
//! a broken page costs one record, never the run.

pub mod config;
pub mod context;
pub mod detail_parser;
pub mod error;
pub mod field_map;
pub mod listing_parser;

// Re-export public types
pub use config::ParsingConfig;
pub use context::{DetailParseContext, ParseContext};
pub use detail_parser::DetailParser;
pub use error::{ParsingError, ParsingResult};
pub use field_map::{FIELD_MAPPINGS, MappedField, normalize_label};
pub use listing_parser::ListingParser;

use scraper::Html;

/// Parser trait with context support.
pub trait ContextualParser {
    type Output;
    type Context;

    /// Parse HTML with contextual information.
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output>;
}
