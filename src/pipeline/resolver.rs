//! Secondary link resolution with bounded retry
//!
//! Each secondary link is fetched through a `Transport` up to a fixed number of
//! attempts. An attempt fails if the transport errors, the body is empty or
//! the status is not 2xx.
//! Failures with a retryable status (502 and 503 by default) wait for the
//! backoff interval before the next attempt; other failures retry at once.
//! When the attempts run out, the last status and error stay on the record.

use crate::config::PipelineConfig;
use crate::extract::{extract_css_urls, ParsedLink};
use crate::pipeline::record::ResultRecord;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Error text recorded when a response carried no bytes
pub const EMPTY_RESPONSE_MESSAGE: &str = "Empty response";

/// Error text for a non-2xx response that carried a body
fn status_message(status: u16) -> String {
    format!("HTTP status {}", status)
}

/// Errors reported by a transport when no usable response arrived
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Bytes and timing of one fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fetched {
    pub status: u16,
    pub elapsed_millis: u64,
    pub bytes: Vec<u8>,
}

impl Fetched {
    /// Returns true for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches secondary links
///
/// The production implementation wraps `reqwest`; tests substitute stubs.
pub trait Transport: Send + Sync {
    /// Fetches the URL once, without retrying
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> impl Future<Output = TransportResult<Fetched>> + Send + 'a;
}

/// Retry policy for secondary links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    pub attempts: u32,
    pub backoff: Duration,
    pub retryable_statuses: HashSet<u16>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for ResolverSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            attempts: config.retry_attempts.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
            retryable_statuses: config.retryable_statuses.iter().copied().collect(),
        }
    }
}

/// What resolving one link produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub record: ResultRecord,

    /// Fetches made, including the successful one
    pub attempts: u32,

    /// Backoff sleeps taken between attempts
    pub backoffs: u32,

    /// `src` URLs found in a stylesheet body; reported but never fetched
    pub css_urls: Vec<String>,
}

/// Fetches secondary links through a transport
pub struct SecondaryLinkResolver<T> {
    transport: T,
    settings: ResolverSettings,
}

impl<T: Transport> SecondaryLinkResolver<T> {
    /// Creates a resolver
    pub fn new(transport: T, settings: ResolverSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Resolves one link
    ///
    /// Never fails: the outcome of the last attempt is recorded on the
    /// returned record instead.
    ///
    /// # Arguments
    ///
    /// * `link` - The secondary link to fetch
    pub async fn resolve(&self, link: &ParsedLink) -> Resolution {
        let mut record = ResultRecord::new(link.url.clone(), Some(link.referer.clone()));
        record.page_info.content_type = Some(link.content_type.clone());

        let mut attempts = 0;
        let mut backoffs = 0;

        loop {
            attempts += 1;

            match self.transport.fetch(&link.url).await {
                Ok(fetched) if fetched.is_success() && !fetched.bytes.is_empty() => {
                    record.http_status = fetched.status;
                    record.elapsed_millis = fetched.elapsed_millis;
                    record.size_bytes = fetched.bytes.len() as u64;
                    record.error_text.clear();

                    let css_urls = if link.is_css() {
                        let urls = extract_css_urls(&String::from_utf8_lossy(&fetched.bytes));
                        for url in &urls {
                            tracing::debug!("Stylesheet {} references {}", link.url, url);
                        }
                        urls
                    } else {
                        Vec::new()
                    };

                    return Resolution {
                        record,
                        attempts,
                        backoffs,
                        css_urls,
                    };
                }
                Ok(fetched) if fetched.bytes.is_empty() => {
                    record.http_status = fetched.status;
                    record.elapsed_millis = fetched.elapsed_millis;
                    record.size_bytes = 0;
                    record.error_text = EMPTY_RESPONSE_MESSAGE.to_string();
                }
                Ok(fetched) => {
                    record.http_status = fetched.status;
                    record.elapsed_millis = fetched.elapsed_millis;
                    record.size_bytes = fetched.bytes.len() as u64;
                    record.error_text = status_message(fetched.status);
                }
                Err(e) => {
                    record.http_status = 0;
                    record.size_bytes = 0;
                    record.error_text = e.to_string();
                }
            }

            if attempts >= self.settings.attempts {
                break;
            }

            if self.settings.retryable_statuses.contains(&record.http_status) {
                tracing::warn!(
                    "{} returned {}, retrying in {:?} (attempt {}/{})",
                    link.url,
                    record.http_status,
                    self.settings.backoff,
                    attempts,
                    self.settings.attempts
                );
                tokio::time::sleep(self.settings.backoff).await;
                backoffs += 1;
            } else {
                tracing::debug!(
                    "Retrying {} after {} (attempt {}/{})",
                    link.url,
                    record.error_text,
                    attempts,
                    self.settings.attempts
                );
            }
        }

        tracing::warn!(
            "Giving up on {} after {} attempts: {}",
            link.url,
            attempts,
            record.error_text
        );

        Resolution {
            record,
            attempts,
            backoffs,
            css_urls: Vec::new(),
        }
    }
}
