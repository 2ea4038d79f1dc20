//! Listing page parser
//!
//! Extracts the ordered entry summaries and the next-page link from one
//! page of the release archive. Fallback selector chains absorb theme
//! variations; an empty page is a valid result, not an error.

use anyhow::Result;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::config::ListingSelectors;
use super::context::ParseContext;
use super::error::{ParsingError, ParsingResult};
use super::ContextualParser;
use crate::domain::release::{ListingPage, ListingSummary};

/// Parser for release listing pages.
pub struct ListingParser {
    entry_link_selectors: Vec<Selector>,
    next_page_selectors: Vec<Selector>,
}

impl ListingParser {
    /// Create a listing parser with the default selectors.
    pub fn new() -> Result<Self> {
        Self::with_config(&ListingSelectors::default())
    }

    /// Create a parser with custom selector configuration.
    pub fn with_config(selectors: &ListingSelectors) -> Result<Self> {
        Ok(Self {
            entry_link_selectors: compile_selectors(&selectors.entry_link)?,
            next_page_selectors: compile_selectors(&selectors.next_page)?,
        })
    }
}

impl ContextualParser for ListingParser {
    type Output = ListingPage;
    type Context = ParseContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<ListingPage> {
        let mut entries = Vec::new();

        // First selector chain that yields anchors wins; within it,
        // keep page order.
        for (i, selector) in self.entry_link_selectors.iter().enumerate() {
            let anchors: Vec<_> = html.select(selector).collect();
            if anchors.is_empty() {
                continue;
            }
            debug!(
                "Found {} entries on page {} using entry selector {}",
                anchors.len(),
                context.page_number,
                i
            );

            for anchor in anchors {
                let title = anchor.text().collect::<String>().trim().to_string();
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                match resolve_url(href, &context.page_url) {
                    Ok(detail_url) => entries.push(ListingSummary { title, detail_url }),
                    Err(e) => {
                        warn!(
                            "Skipping entry with unresolvable link on page {}: {}",
                            context.page_number, e
                        );
                    }
                }
            }
            break;
        }

        let next_page_url = self.next_page_selectors.iter().find_map(|selector| {
            html.select(selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolve_url(href, &context.page_url).ok())
        });

        if entries.is_empty() {
            debug!(
                "Listing page {} yielded no entries (next page: {})",
                context.page_number,
                next_page_url.is_some()
            );
        }

        Ok(ListingPage {
            entries,
            next_page_url,
        })
    }
}

/// Compile selector strings, skipping the broken ones.
///
/// At least one selector per chain must compile; a chain that is all
/// typos is a configuration bug worth failing construction over.
pub(crate) fn compile_selectors(selector_strings: &[String]) -> Result<Vec<Selector>> {
    let mut selectors = Vec::new();
    let mut errors = Vec::new();

    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push(selector),
            Err(e) => {
                warn!("Failed to compile selector '{}': {}", selector_str, e);
                errors.push(format!("'{selector_str}': {e}"));
            }
        }
    }

    if selectors.is_empty() {
        return Err(anyhow::anyhow!(
            "No valid selectors compiled. Errors: {}",
            errors.join(", ")
        ));
    }

    Ok(selectors)
}

/// Resolve a possibly-relative href against the page it appeared on.
pub(crate) fn resolve_url(href: &str, page_url: &str) -> ParsingResult<String> {
    let base = Url::parse(page_url).map_err(|e| ParsingError::UrlResolutionFailed {
        url: page_url.to_string(),
        reason: format!("invalid base URL: {e}"),
    })?;

    let resolved = base
        .join(href)
        .map_err(|e| ParsingError::UrlResolutionFailed {
            url: href.to_string(),
            reason: format!("failed to join URL: {e}"),
        })?;

    Ok(resolved.to_string())
}
