//! Secondary link extraction
//!
//! Harvests the assets a page references from its own host so they can be
//! resolved independently of the crawl engine's queue.

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Selectors scanned for secondary links, paired with the attribute holding the URL
const LINK_SOURCES: &[(&str, &str)] = &[
    ("img[src]", "src"),
    ("script[src]", "src"),
    ("link[href]", "href"),
];

/// Scheme prefix browsers report for document-relative references
const ABOUT_PREFIX: &str = "about:///";

/// A secondary resource discovered on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLink {
    /// Absolute URL of the resource
    pub url: String,

    /// MIME type guessed from the path extension
    pub content_type: String,

    /// The page that referenced the resource
    pub referer: String,
}

impl ParsedLink {
    /// Creates a link, deriving its content type from the URL path
    pub fn new(url: impl Into<String>, referer: impl Into<String>) -> Self {
        let url = url.into();
        let path = Url::parse(&url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.clone());
        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Self {
            url,
            content_type,
            referer: referer.into(),
        }
    }

    /// Returns true if the resource is a stylesheet
    pub fn is_css(&self) -> bool {
        self.content_type == "text/css"
    }
}

/// Extracts locally-scoped secondary links from a parsed page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<img src>`, `<script src>` and every `<link href>`, stylesheets included
/// - relative URLs, rewritten against the page authority with a forced leading `/`
/// - `about:///...` references, treated as relative
/// - absolute `http(s)://` URLs on the page's own host
///
/// **Exclude:**
/// - empty or missing values
/// - protocol-relative `//...` URLs
/// - absolute URLs on another host, and non-HTTP schemes (`data:`, `mailto:`, ...)
///
/// Each URL is yielded once per page, in document order of first appearance.
///
/// # Example
///
/// ```
/// use crawlsheet::extract::extract_links;
/// use scraper::Html;
/// use url::Url;
///
/// let page = Url::parse("https://example.com/dir/page.html").unwrap();
/// let html = Html::parse_document(r#"<img src="/img/a.png"><img src="https://other.com/b.png">"#);
/// let links = extract_links(&html, &page);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].url, "https://example.com/img/a.png");
/// ```
pub fn extract_links(document: &Html, page_url: &Url) -> Vec<ParsedLink> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();
    let referer = page_url.to_string();

    for (selector, attribute) in LINK_SOURCES {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };

        for element in document.select(&selector) {
            let Some(value) = element.value().attr(attribute) else {
                continue;
            };

            if !is_local_url(value, page_url) {
                continue;
            }

            if let Some(absolute) = absolutize(value, page_url) {
                if seen.insert(absolute.clone()) {
                    links.push(ParsedLink::new(absolute, referer.clone()));
                }
            }
        }
    }

    links
}

/// Decides whether a link value points at the page's own host
fn is_local_url(value: &str, page_url: &Url) -> bool {
    let value = value.trim();

    if value.is_empty() || value.starts_with("//") {
        return false;
    }

    if value.starts_with(ABOUT_PREFIX) {
        return true;
    }

    match Url::parse(value) {
        Ok(absolute) => {
            matches!(absolute.scheme(), "http" | "https")
                && absolute.host_str().is_some()
                && absolute.host_str() == page_url.host_str()
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}

/// Turns a local link value into an absolute URL
fn absolutize(value: &str, page_url: &Url) -> Option<String> {
    let value = value.trim();

    if let Ok(absolute) = Url::parse(value) {
        if absolute.scheme() != "about" {
            return Some(absolute.to_string());
        }
    }

    let mut path = value.replacen("about://", "", 1);
    if !path.starts_with('/') {
        path.insert(0, '/');
    }

    let authority = page_url.origin().ascii_serialization();
    Url::parse(&format!("{}{}", authority, path))
        .ok()
        .map(|url| url.to_string())
}
