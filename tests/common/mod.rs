//! Shared test support: a scripted page fetcher and HTML fixtures.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use mso_crawler::infrastructure::fetcher::{FetchError, PageFetcher};

/// What the scripted fetcher should answer for a URL.
#[derive(Debug, Clone)]
pub enum PageScript {
    Html(String),
    Transient,
    Permanent,
}

/// In-memory fetcher: a URL-to-response script plus a request log, so
/// tests can assert which pages were (not) fetched.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, PageScript>,
    pub requests: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, script: PageScript) -> Self {
        self.pages.insert(url.to_string(), script);
        self
    }

    pub fn requested(&self, url: &str) -> bool {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .any(|r| r == url)
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(PageScript::Html(html)) => Ok(html.clone()),
            Some(PageScript::Transient) => {
                Err(FetchError::transient(url, "scripted transient failure"))
            }
            Some(PageScript::Permanent) => Err(FetchError::permanent(url, "HTTP 404 Not Found")),
            None => Err(FetchError::permanent(url, "HTTP 404 Not Found")),
        }
    }
}

/// A listing page with the given `(title, detail-href)` entries and an
/// optional next-page link.
pub fn listing_page(entries: &[(&str, &str)], next: Option<&str>) -> String {
    let mut body = String::new();
    for (title, href) in entries {
        body.push_str(&format!(
            r#"<article class="loop-entry"><h2 class="entry-title"><a href="{href}">{title}</a></h2></article>"#
        ));
    }
    if let Some(next) = next {
        body.push_str(&format!(
            r#"<nav class="pagination"><a class="next page-numbers" href="{next}">Next</a></nav>"#
        ));
    }
    format!("<html><body>{body}</body></html>")
}

/// A minimal but complete detail page.
pub fn detail_page(title: &str, imdb_id: &str) -> String {
    detail_page_with_genre(title, imdb_id, "Drama")
}

pub fn detail_page_with_genre(title: &str, imdb_id: &str, genre: &str) -> String {
    format!(
        r#"<html><body>
            <h1 id="release-title">{title}</h1>
            <figure id="release-poster"><img src="/posters/{imdb_id}.jpg"></figure>
            <div id="synopsis">Synopsis for {title}.</div>
            <a id="imdb-button" href="https://www.imdb.com/title/{imdb_id}/">IMDb</a>
            <a id="download-button" data-downloadurl="https://site.test/files/{imdb_id}.zip" href="/files/{imdb_id}.zip">Download</a>
            <table id="release-details-table">
              <tr><td>ഭാഷ:</td><td>മലയാളം</td></tr>
              <tr><td>ജോണർ:</td><td>{genre}</td></tr>
            </table>
          </body></html>"#
    )
}

/// A page that parses as HTML but is not a release page at all.
pub fn malformed_detail_page() -> String {
    "<html><body><div class=\"error\">database error</div></body></html>".to_string()
}
