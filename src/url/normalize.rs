use crate::url::DedupKey;
use crate::{UrlError, UrlResult};
use url::Url;

/// Canonicalizes a crawled URL
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only HTTP and HTTPS schemes
/// 3. Require a host (the parser lowercases it and resolves dot segments)
/// 4. Empty path becomes `/`
/// 5. Remove the fragment
///
/// Query strings are kept: two pages that differ only by query are distinct
/// primary pages.
///
/// # Examples
///
/// ```
/// use crawlsheet::url::canonicalize_url;
///
/// let url = canonicalize_url("HTTPS://EXAMPLE.COM/a/../Page#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/Page");
/// ```
pub fn canonicalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    if url.path().is_empty() {
        url.set_path("/");
    }

    url.set_fragment(None);

    Ok(url)
}

/// Derives the dedup key of a primary page
///
/// The full canonical URL (query included, fragment dropped) is hashed.
/// Unparseable input falls back to its trimmed text so it still dedups
/// against itself.
pub fn page_key(url_str: &str) -> DedupKey {
    match canonicalize_url(url_str) {
        Ok(url) => DedupKey::from_normalized(url.as_str()),
        Err(_) => DedupKey::from_normalized(url_str.trim()),
    }
}

/// Derives the dedup key of a secondary asset
///
/// Only authority and path are hashed, so `http`/`https` variants and
/// cache-busting query strings of the same asset collapse into one key.
pub fn asset_key(url_str: &str) -> DedupKey {
    match canonicalize_url(url_str) {
        Ok(url) => {
            let authority = match url.port() {
                Some(port) => format!("{}:{}", url.host_str().unwrap_or_default(), port),
                None => url.host_str().unwrap_or_default().to_string(),
            };
            DedupKey::from_normalized(&format!("{}{}", authority, url.path()))
        }
        Err(_) => {
            let trimmed = url_str.trim();
            let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
            DedupKey::from_normalized(&trimmed[..end])
        }
    }
}
