//! Turns crawl events into result records
//!
//! The aggregator is pure: it reads an event, parses the page if it is HTML,
//! and returns the record together with the secondary links found on the
//! page. Dedup and buffering happen in the caller.

use crate::extract::{
    extract_links, extract_open_graph_info, extract_page_info, extract_seo_info, PageInfo,
    ParsedLink,
};
use crate::pipeline::events::{CrawlEvent, CrawledPage, PageDisallowance, PageOutcome};
use crate::pipeline::record::ResultRecord;
use crate::url::canonicalize_url;
use scraper::Html;

/// Status recorded for pages the engine refused to fetch
pub const DISALLOWED_STATUS: u16 = 500;

/// Status recorded for pages that produced no response
pub const NO_CONNECTION_STATUS: u16 = 503;

/// Error text recorded for pages that produced no response
pub const NO_CONNECTION_MESSAGE: &str = "No connection!";

/// Record built from one primary page event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedPage {
    pub record: ResultRecord,

    /// Secondary links found on the page; empty unless the page was HTML
    pub links: Vec<ParsedLink>,
}

/// Builds result records from crawl events
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    ignored_prefixes: Vec<String>,
}

impl ResultAggregator {
    /// Creates an aggregator
    ///
    /// # Arguments
    ///
    /// * `ignored_disallow_reasons` - Prefixes of disallow reasons (or URLs)
    ///   that produce no record at all; matched case-insensitively
    pub fn new(ignored_disallow_reasons: &[String]) -> Self {
        Self {
            ignored_prefixes: ignored_disallow_reasons
                .iter()
                .map(|reason| reason.trim().to_lowercase())
                .filter(|reason| !reason.is_empty())
                .collect(),
        }
    }

    /// Builds the record for one event
    ///
    /// # Returns
    ///
    /// * `Some(AggregatedPage)` - The record and any secondary links
    /// * `None` - The event is an ignored disallowance
    pub fn build_record(&self, event: CrawlEvent) -> Option<AggregatedPage> {
        match event {
            CrawlEvent::PageDisallowed(disallowance) => self.build_disallowed(disallowance),
            CrawlEvent::PageCompleted(completion) => Some(match completion.into_outcome() {
                PageOutcome::Crawled(page) => build_crawled(page),
                PageOutcome::Failed {
                    url,
                    referer,
                    message,
                } => {
                    let mut record = ResultRecord::new(record_url(&url), referer);
                    record.http_status = NO_CONNECTION_STATUS;
                    record.append_error(NO_CONNECTION_MESSAGE);
                    if let Some(message) = message {
                        record.append_error(message.trim());
                    }
                    AggregatedPage {
                        record,
                        links: Vec::new(),
                    }
                }
            }),
        }
    }

    /// Returns true if a disallowance should leave no trace in the output
    pub fn is_ignored(&self, disallowance: &PageDisallowance) -> bool {
        let reason = disallowance.reason.trim().to_lowercase();
        let url = disallowance.url.trim().to_lowercase();

        self.ignored_prefixes
            .iter()
            .any(|prefix| reason.starts_with(prefix.as_str()) || url.starts_with(prefix.as_str()))
    }

    fn build_disallowed(&self, disallowance: PageDisallowance) -> Option<AggregatedPage> {
        if self.is_ignored(&disallowance) {
            tracing::debug!(
                "Ignoring disallowed {} ({})",
                disallowance.url,
                disallowance.reason
            );
            return None;
        }

        let mut record = ResultRecord::new(record_url(&disallowance.url), disallowance.referer);
        record.http_status = DISALLOWED_STATUS;
        record.append_error(&disallowance.reason);

        Some(AggregatedPage {
            record,
            links: Vec::new(),
        })
    }
}

fn build_crawled(page: CrawledPage) -> AggregatedPage {
    let mut record = ResultRecord::new(record_url(&page.url), page.referer);
    record.http_status = page.http_status;
    record.elapsed_millis = page.elapsed_millis;
    record.size_bytes = match &page.body {
        Some(body) => body.len() as u64,
        None => page.content_length.unwrap_or(0),
    };

    let content_type = page.content_type.as_deref();
    record.page_info = PageInfo {
        content_type: content_type.map(str::to_string),
        ..PageInfo::default()
    };

    let mut links = Vec::new();
    if record.page_info.is_html() {
        if let Some(body) = &page.body {
            // Html is not Send; it must not outlive this function
            let text = String::from_utf8_lossy(body);
            let document = Html::parse_document(&text);

            record.page_info = extract_page_info(&document, content_type);
            record.seo_info = extract_seo_info(&document);
            record.open_graph_info = extract_open_graph_info(&document);

            if let Ok(page_url) = canonicalize_url(&page.url) {
                links = extract_links(&document, &page_url);
            }
        }
    }

    AggregatedPage { record, links }
}

/// Canonical form of an event URL, or the trimmed original when it will not parse
fn record_url(url: &str) -> String {
    canonicalize_url(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.trim().to_string())
}
