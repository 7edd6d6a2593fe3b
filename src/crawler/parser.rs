//! Anchor extraction for the crawl frontier
//!
//! The crawl engine follows `<a href>` and canonical `<link>` targets. Secondary
//! assets are harvested separately by the pipeline.

use scraper::{Html, Selector};
use url::Url;

/// Where an anchor points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorTarget {
    /// An HTTP(S) page, resolved against the document URL
    Page(Url),

    /// An inline `data:` URI; `reason` is its scheme and media type prefix
    DataUri { url: String, reason: String },
}

/// Extracts the targets of all followable anchors
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
/// - `data:` URIs, reported as `AnchorTarget::DataUri`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - fragment-only links (same page anchors)
/// - URLs that are not HTTP(S) after resolution
///
/// # Example
///
/// ```
/// use crawlsheet::crawler::{extract_anchor_targets, AnchorTarget};
/// use scraper::Html;
/// use url::Url;
///
/// let html = Html::parse_document(r#"<a href="/page">Link</a><a href="mailto:x@y.z">Mail</a>"#);
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let targets = extract_anchor_targets(&html, &base_url);
/// assert_eq!(targets.len(), 1);
/// ```
pub fn extract_anchor_targets(document: &Html, base_url: &Url) -> Vec<AnchorTarget> {
    let mut targets = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(target) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_anchor(href, base_url))
            {
                targets.push(target);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(target) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_anchor(href, base_url))
            {
                targets.push(target);
            }
        }
    }

    targets
}

/// Resolves an href against the document URL
fn resolve_anchor(href: &str, base_url: &Url) -> Option<AnchorTarget> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
    {
        return None;
    }

    if lowered.starts_with("data:") {
        return Some(AnchorTarget::DataUri {
            url: href.to_string(),
            reason: data_uri_reason(href),
        });
    }

    let absolute = base_url.join(href).ok()?;
    matches!(absolute.scheme(), "http" | "https").then_some(AnchorTarget::Page(absolute))
}

/// Reduces `data:image/png;base64,...` to `data:image`
pub fn data_uri_reason(uri: &str) -> String {
    let end = uri
        .find(['/', ';', ','])
        .unwrap_or(uri.len());
    uri[..end].to_ascii_lowercase()
}
