//! Page metadata extraction
//!
//! Reads the document-level fields recorded for every HTML page: character
//! set and language, the SEO trio (title, description, keywords) and the
//! Open Graph properties.

use scraper::{Html, Selector};

/// Document-level information about a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub charset: Option<String>,
    pub lang: Option<String>,
    pub content_type: Option<String>,
}

impl PageInfo {
    /// Returns true if the content type indicates an HTML document
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("html"))
    }
}

/// Search engine metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeoInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
}

/// Open Graph metadata (`og:*` properties)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenGraphInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub og_type: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub site_name: Option<String>,
}

/// Extracts charset and language, keeping the transport content type
///
/// The charset comes from `<meta charset>`, then from a
/// `<meta http-equiv="content-type">` declaration, then from the
/// `charset=` parameter of the Content-Type header.
pub fn extract_page_info(document: &Html, content_type: Option<&str>) -> PageInfo {
    let charset = select_attr(document, "meta[charset]", "charset")
        .or_else(|| {
            find_meta(document, "http-equiv", "content-type").and_then(|c| charset_param(&c))
        })
        .or_else(|| content_type.and_then(charset_param));

    let lang = select_attr(document, "html[lang]", "lang");

    PageInfo {
        charset,
        lang,
        content_type: content_type.map(str::to_string),
    }
}

/// Extracts the page title and the description/keywords meta tags
pub fn extract_seo_info(document: &Html) -> SeoInfo {
    SeoInfo {
        title: extract_title(document),
        description: find_meta(document, "name", "description"),
        keywords: find_meta(document, "name", "keywords"),
    }
}

/// Extracts the `og:*` meta properties
pub fn extract_open_graph_info(document: &Html) -> OpenGraphInfo {
    OpenGraphInfo {
        title: find_meta(document, "property", "og:title"),
        description: find_meta(document, "property", "og:description"),
        og_type: find_meta(document, "property", "og:type"),
        url: find_meta(document, "property", "og:url"),
        image: find_meta(document, "property", "og:image"),
        site_name: find_meta(document, "property", "og:site_name"),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Returns the `content` of the first `<meta>` whose `attribute` equals `name`
fn find_meta(document: &Html, attribute: &str, name: &str) -> Option<String> {
    let selector = Selector::parse("meta").ok()?;

    document
        .select(&selector)
        .find(|element| {
            element
                .value()
                .attr(attribute)
                .is_some_and(|value| value.trim().eq_ignore_ascii_case(name))
        })
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
}

fn select_attr(document: &Html, selector: &str, attribute: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attribute))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Pulls `utf-8` out of `text/html; charset="UTF-8"`
fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches('"').trim();
            (!value.is_empty()).then(|| value.to_lowercase())
        } else {
            None
        }
    })
}
