//! Crawl engine events
//!
//! The crawl engine never calls into the pipeline directly. It sends one
//! `CrawlEvent` per page it finished or declined over a `tokio::sync::mpsc`
//! channel, and the pipeline consumes them until the channel closes.

/// Notification from the crawl engine about one primary page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    /// The engine attempted the page, with or without a response
    PageCompleted(PageCompletion),

    /// The engine declined to fetch the page
    PageDisallowed(PageDisallowance),
}

/// Everything the engine knows about a page it attempted
///
/// `http_status` is `None` when no response arrived at all; in that case
/// `exception_message` usually explains why.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCompletion {
    pub url: String,
    pub referer: Option<String>,
    pub http_status: Option<u16>,
    pub elapsed_millis: Option<u64>,
    pub body: Option<Vec<u8>>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub exception_message: Option<String>,
}

/// A page the engine refused to fetch, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDisallowance {
    pub url: String,
    pub referer: Option<String>,
    pub reason: String,
}

/// A completed page split by whether a response arrived
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Crawled(CrawledPage),
    Failed {
        url: String,
        referer: Option<String>,
        message: Option<String>,
    },
}

/// A page with a transport response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawledPage {
    pub url: String,
    pub referer: Option<String>,
    pub http_status: u16,
    pub elapsed_millis: u64,
    pub body: Option<Vec<u8>>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
}

impl PageCompletion {
    /// Creates a completion for a page that answered
    pub fn responded(url: impl Into<String>, referer: Option<String>, http_status: u16) -> Self {
        Self {
            url: url.into(),
            referer,
            http_status: Some(http_status),
            ..Self::default()
        }
    }

    /// Creates a completion for a page that never answered
    pub fn no_response(
        url: impl Into<String>,
        referer: Option<String>,
        exception_message: Option<String>,
    ) -> Self {
        Self {
            url: url.into(),
            referer,
            exception_message,
            ..Self::default()
        }
    }

    /// Maps a missing response to `PageOutcome::Failed`
    pub fn into_outcome(self) -> PageOutcome {
        match self.http_status {
            Some(http_status) => PageOutcome::Crawled(CrawledPage {
                url: self.url,
                referer: self.referer,
                http_status,
                elapsed_millis: self.elapsed_millis.unwrap_or(0),
                body: self.body,
                content_length: self.content_length,
                content_type: self.content_type,
            }),
            None => PageOutcome::Failed {
                url: self.url,
                referer: self.referer,
                message: self.exception_message,
            },
        }
    }
}
