//! Detail page parser
//!
//! Extracts the full structured record from one release page. The
//! label/value details table goes through two passes: scan every row
//! the page happens to have, then map known labels onto attributes via
//! the static field mapping, so row reordering costs nothing. The
//! remaining fields (title, poster, synopsis, buttons) sit outside the
//! table and use positional fallback chains; each miss loses one field.
//! Only a missing title makes the record unusable.

use anyhow::Result;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::ContextualParser;
use super::config::DetailSelectors;
use super::context::DetailParseContext;
use super::error::{ParsingError, ParsingResult};
use super::field_map::{self, MappedField};
use super::listing_parser::{compile_selectors, resolve_url};
use crate::domain::catalog::Translator;
use crate::domain::release::ParsedRelease;

/// Synopses on some older pages run to full essays; cap what we store.
const SYNOPSIS_MAX_CHARS: usize = 2000;

/// One value cell from the details table: its collapsed text and the
/// first link inside it, if any.
#[derive(Debug, Clone)]
struct ValueFragment {
    text: String,
    link_text: Option<String>,
    link_href: Option<String>,
}

/// Parser for release detail pages.
pub struct DetailParser {
    title_selectors: Vec<Selector>,
    poster_selectors: Vec<Selector>,
    synopsis_selectors: Vec<Selector>,
    release_number_selectors: Vec<Selector>,
    imdb_selectors: Vec<Selector>,
    download_selectors: Vec<Selector>,
    release_type_selectors: Vec<Selector>,
    details_table_selectors: Vec<Selector>,
    details_list_selectors: Vec<Selector>,
    translator_fallback_selectors: Vec<Selector>,
    row_selector: Selector,
    cell_selector: Selector,
    term_selector: Selector,
    definition_selector: Selector,
    anchor_selector: Selector,
}

impl DetailParser {
    /// Create a detail parser with the default selectors.
    pub fn new() -> Result<Self> {
        Self::with_config(&DetailSelectors::default())
    }

    /// Create a parser with custom selector configuration.
    pub fn with_config(selectors: &DetailSelectors) -> Result<Self> {
        let parse_fixed = |s: &str| {
            Selector::parse(s).map_err(|e| anyhow::anyhow!("invalid built-in selector '{s}': {e}"))
        };

        Ok(Self {
            title_selectors: compile_selectors(&selectors.title)?,
            poster_selectors: compile_selectors(&selectors.poster)?,
            synopsis_selectors: compile_selectors(&selectors.synopsis)?,
            release_number_selectors: compile_selectors(&selectors.release_number)?,
            imdb_selectors: compile_selectors(&selectors.imdb_link)?,
            download_selectors: compile_selectors(&selectors.download_link)?,
            release_type_selectors: compile_selectors(&selectors.release_type)?,
            details_table_selectors: compile_selectors(&selectors.details_table)?,
            details_list_selectors: compile_selectors(&selectors.details_list)?,
            translator_fallback_selectors: compile_selectors(&selectors.translator_fallback)?,
            row_selector: parse_fixed("tr")?,
            cell_selector: parse_fixed("td, th")?,
            term_selector: parse_fixed("dt")?,
            definition_selector: parse_fixed("dd")?,
            anchor_selector: parse_fixed("a")?,
        })
    }
}

impl ContextualParser for DetailParser {
    type Output = ParsedRelease;
    type Context = DetailParseContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<ParsedRelease> {
        // A page without a title heading is not a release page; drop it.
        let title = self
            .extract_text(html, &self.title_selectors)
            .ok_or_else(|| ParsingError::unusable_record(&context.url, "missing title"))?;

        let mut release = ParsedRelease {
            title,
            source_url: context.url.clone(),
            ..Default::default()
        };

        release.poster_url = self.extract_image_url(html, context);
        release.description_localized = self
            .extract_text(html, &self.synopsis_selectors)
            .map(|text| cap_chars(&text, SYNOPSIS_MAX_CHARS));
        release.release_label = self.extract_text(html, &self.release_number_selectors);
        release.imdb_url = self.extract_imdb_url(html);
        release.subtitle_file_url = self.extract_download_url(html, context);
        release.is_series = self
            .extract_text(html, &self.release_type_selectors)
            .is_some_and(|t| t.to_ascii_lowercase().contains("series"));

        // Pass 1: whatever label/value rows the page has, in any order.
        let rows = self.scan_label_rows(html);
        debug!("Scanned {} detail rows from {}", rows.len(), context.url);

        // Pass 2: walk the static mapping and pick out known labels.
        self.apply_field_mappings(&rows, &mut release, context);

        if release.translator.is_none() {
            release.translator = self.extract_translator_fallback(html, context);
        }

        Ok(release)
    }
}

impl DetailParser {
    /// First pass: scan every label/value row into `(label, fragment)`
    /// pairs, independent of row order or count. Tables first, then
    /// definition lists.
    fn scan_label_rows(&self, html: &Html) -> Vec<(String, ValueFragment)> {
        let mut rows = Vec::new();

        for table in self.select_first_matching(html, &self.details_table_selectors) {
            for row in table.select(&self.row_selector) {
                let cells: Vec<_> = row.select(&self.cell_selector).collect();
                if cells.len() >= 2 {
                    let label = field_map::normalize_label(&collapse_ws(&cell_text(&cells[0])));
                    if !label.is_empty() {
                        rows.push((label, self.value_fragment(&cells[1])));
                    }
                }
            }
        }

        for dl in self.select_first_matching(html, &self.details_list_selectors) {
            let terms: Vec<_> = dl.select(&self.term_selector).collect();
            let definitions: Vec<_> = dl.select(&self.definition_selector).collect();
            for (term, definition) in terms.iter().zip(definitions.iter()) {
                let label = field_map::normalize_label(&collapse_ws(&cell_text(term)));
                if !label.is_empty() {
                    rows.push((label, self.value_fragment(definition)));
                }
            }
        }

        rows
    }

    /// Second pass: assign each mapped label's value to its attribute.
    /// Labels missing from the page leave the attribute unset; labels
    /// the table does not know are ignored by construction.
    fn apply_field_mappings(
        &self,
        rows: &[(String, ValueFragment)],
        release: &mut ParsedRelease,
        context: &DetailParseContext,
    ) {
        for (label, fragment) in rows {
            let Some(field) = field_map::lookup(label) else {
                continue;
            };
            let value = Some(fragment.text.clone()).filter(|t| !t.is_empty());

            match field {
                MappedField::Language => release.language = value,
                MappedField::Director => release.director = value,
                MappedField::Production => release.production = value,
                MappedField::Genre => release.genre = value,
                MappedField::ImdbRating => release.imdb_rating = value,
                MappedField::Certification => release.certification = value,
                MappedField::Translator => {
                    let name = fragment
                        .link_text
                        .clone()
                        .filter(|t| !t.is_empty())
                        .or(value);
                    if let Some(name) = name {
                        let url = fragment
                            .link_href
                            .as_deref()
                            .and_then(|href| resolve_url(href, &context.url).ok());
                        release.translator = Some(Translator { name, url });
                    }
                }
            }
        }
    }

    /// Collapse a value cell into text plus its first link.
    fn value_fragment(&self, cell: &ElementRef<'_>) -> ValueFragment {
        let anchor = cell.select(&self.anchor_selector).next();
        ValueFragment {
            text: collapse_ws(&cell_text(cell)),
            link_text: anchor.map(|a| collapse_ws(&cell_text(&a))),
            link_href: anchor.and_then(|a| a.value().attr("href").map(str::to_string)),
        }
    }

    /// First non-empty text hit across a fallback chain.
    fn extract_text(&self, html: &Html, selectors: &[Selector]) -> Option<String> {
        for selector in selectors {
            if let Some(element) = html.select(selector).next() {
                let text = collapse_ws(&cell_text(&element));
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }

    fn extract_image_url(&self, html: &Html, context: &DetailParseContext) -> Option<String> {
        for selector in &self.poster_selectors {
            if let Some(img) = html.select(selector).next() {
                if let Some(src) = img.value().attr("src") {
                    if let Ok(url) = resolve_url(src, &context.url) {
                        return Some(url);
                    }
                }
            }
        }
        None
    }

    fn extract_imdb_url(&self, html: &Html) -> Option<String> {
        for selector in &self.imdb_selectors {
            for anchor in html.select(selector) {
                if let Some(href) = anchor.value().attr("href") {
                    if href.contains("imdb.com") {
                        return Some(href.to_string());
                    }
                }
            }
        }
        None
    }

    /// The download button stores the archive URL in `data-downloadurl`;
    /// older markup used a plain `href`.
    fn extract_download_url(&self, html: &Html, context: &DetailParseContext) -> Option<String> {
        for selector in &self.download_selectors {
            if let Some(anchor) = html.select(selector).next() {
                let raw = anchor
                    .value()
                    .attr("data-downloadurl")
                    .or_else(|| anchor.value().attr("href"));
                if let Some(raw) = raw {
                    if let Ok(url) = resolve_url(raw, &context.url) {
                        return Some(url);
                    }
                }
            }
        }
        None
    }

    fn extract_translator_fallback(
        &self,
        html: &Html,
        context: &DetailParseContext,
    ) -> Option<Translator> {
        for selector in &self.translator_fallback_selectors {
            if let Some(anchor) = html.select(selector).next() {
                let name = collapse_ws(&cell_text(&anchor));
                if !name.is_empty() {
                    let url = anchor
                        .value()
                        .attr("href")
                        .and_then(|href| resolve_url(href, &context.url).ok());
                    return Some(Translator { name, url });
                }
            }
        }
        None
    }

    /// Elements under the first selector of the chain that matches
    /// anything.
    fn select_first_matching<'a>(
        &self,
        html: &'a Html,
        selectors: &[Selector],
    ) -> Vec<ElementRef<'a>> {
        for selector in selectors {
            let elements: Vec<_> = html.select(selector).collect();
            if !elements.is_empty() {
                return elements;
            }
        }
        Vec::new()
    }
}

fn cell_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

/// Collapse runs of whitespace (the markup is full of layout newlines).
fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cap_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let capped: String = text.chars().take(max).collect();
        format!("{capped}...")
    }
}
