//! Parsing error types
//!
//! Errors are scoped to one record at most. The orchestrator reduces
//! them to a logged skip; nothing here aborts a run.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParsingError {
    #[error("Required field '{field}' not found in {url}")]
    RequiredFieldMissing { field: String, url: String },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed { url: String, reason: String },

    #[error("Unusable record at {url}: {reason}")]
    UnusableRecord { url: String, reason: String },
}

impl ParsingError {
    pub fn required_field_missing(field: &str, url: &str) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            url: url.to_string(),
        }
    }

    pub fn unusable_record(url: &str, reason: &str) -> Self {
        Self::UnusableRecord {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
