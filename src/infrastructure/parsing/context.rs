//! Parsing context objects
//!
//! Carry the page provenance the parsers need for link resolution and
//! error reporting.

/// Context for parsing a listing page.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// 1-based listing page number, for log provenance.
    pub page_number: u32,

    /// URL of the page being parsed; relative links resolve against it.
    pub page_url: String,
}

impl ParseContext {
    pub fn new(page_number: u32, page_url: impl Into<String>) -> Self {
        Self {
            page_number,
            page_url: page_url.into(),
        }
    }
}

/// Context for parsing a detail page.
#[derive(Debug, Clone)]
pub struct DetailParseContext {
    /// Canonical detail-page URL; becomes the record's `source_url`.
    pub url: String,
}

impl DetailParseContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}
