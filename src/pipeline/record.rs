//! Result record definitions
//!
//! One `ResultRecord` becomes one row of output, whether it describes a
//! primary page or a secondary asset.

use crate::extract::{OpenGraphInfo, PageInfo, SeoInfo};

/// One row of crawl output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRecord {
    /// Canonical URL of the resource
    pub url: String,

    /// The page that linked to the resource
    pub referer: Option<String>,

    /// HTTP status code, 0 if no connection was made
    pub http_status: u16,

    /// Time taken to fetch the resource
    pub elapsed_millis: u64,

    /// Body size in bytes
    pub size_bytes: u64,

    /// Error description, empty when the fetch succeeded
    pub error_text: String,

    pub page_info: PageInfo,
    pub seo_info: SeoInfo,
    pub open_graph_info: OpenGraphInfo,
}

impl ResultRecord {
    /// Creates a record with only the URL and referer set
    pub fn new(url: impl Into<String>, referer: Option<String>) -> Self {
        Self {
            url: url.into(),
            referer,
            ..Self::default()
        }
    }

    /// Returns true if the record carries an error
    pub fn has_error(&self) -> bool {
        !self.error_text.is_empty()
    }

    /// Appends an error message, separated from any existing one by a line break
    pub fn append_error(&mut self, message: &str) {
        if message.is_empty() {
            return;
        }
        if !self.error_text.is_empty() {
            self.error_text.push('\n');
        }
        self.error_text.push_str(message);
    }

    /// Replaces line breaks in every free-text field with single spaces
    pub fn normalize_text(&mut self) {
        normalize_field(&mut self.error_text);

        for field in [
            &mut self.referer,
            &mut self.page_info.charset,
            &mut self.page_info.lang,
            &mut self.page_info.content_type,
            &mut self.seo_info.title,
            &mut self.seo_info.description,
            &mut self.seo_info.keywords,
            &mut self.open_graph_info.title,
            &mut self.open_graph_info.description,
            &mut self.open_graph_info.og_type,
            &mut self.open_graph_info.url,
            &mut self.open_graph_info.image,
            &mut self.open_graph_info.site_name,
        ] {
            if let Some(text) = field.as_mut() {
                normalize_field(text);
            }
        }
    }
}

/// Collapses each `\r\n`, `\n` or `\r` into a single space
fn normalize_field(text: &mut String) {
    if text.contains(['\n', '\r']) {
        *text = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
    }
}
