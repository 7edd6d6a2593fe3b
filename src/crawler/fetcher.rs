//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the crate:
//! - Building the HTTP client with the crawler's user agent string
//! - GET requests for primary pages, reported as `PageCompletion`s
//! - `ReqwestTransport`, the production `Transport` for secondary links

use crate::config::UserAgentConfig;
use crate::pipeline::{Fetched, PageCompletion, Transport, TransportError, TransportResult};
use reqwest::header::{CONTENT_TYPE, REFERER};
use reqwest::{redirect::Policy, Client};
use std::future::Future;
use std::time::{Duration, Instant};

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use crawlsheet::config::UserAgentConfig;
/// use crawlsheet::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a primary page
///
/// Never fails: a request that produced no response is reported as a
/// completion without a status, carrying the error message.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The page to fetch
/// * `referer` - The page that linked to it, sent as the `Referer` header
pub async fn fetch_page(client: &Client, url: &str, referer: Option<String>) -> PageCompletion {
    let started = Instant::now();

    let mut request = client.get(url);
    if let Some(referer) = &referer {
        request = request.header(REFERER, referer.as_str());
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("No response from {}: {}", url, e);
            return PageCompletion::no_response(url, referer, Some(describe_error(&e)));
        }
    };

    let mut completion = PageCompletion::responded(url, referer, response.status().as_u16());
    completion.content_length = response.content_length();
    completion.content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match response.bytes().await {
        Ok(bytes) => completion.body = Some(bytes.to_vec()),
        Err(e) => tracing::warn!("Failed to read body of {}: {}", url, e),
    }
    completion.elapsed_millis = Some(elapsed_millis(started));

    completion
}

/// `Transport` backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> impl Future<Output = TransportResult<Fetched>> + Send + 'a {
        async move {
            let started = Instant::now();

            let response = self.client.get(url).send().await.map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(elapsed_millis(started))
                } else {
                    TransportError::Connection(describe_error(&e))
                }
            })?;

            let status = response.status().as_u16();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?;

            Ok(Fetched {
                status,
                elapsed_millis: elapsed_millis(started),
                bytes: bytes.to_vec(),
            })
        }
    }
}

/// Classifies a request error into a short message
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection refused: {}", error)
    } else if error.is_redirect() {
        format!("Redirect error: {}", error)
    } else {
        error.to_string()
    }
}

fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_page_has_no_status() {
        let client = build_http_client(&create_test_config()).unwrap();
        // Port 9 (discard) on localhost is closed in test environments
        let completion = fetch_page(&client, "http://127.0.0.1:9/", None).await;

        assert_eq!(completion.http_status, None);
        assert!(completion.exception_message.is_some());
    }

    #[tokio::test]
    async fn test_transport_connection_error() {
        let transport = ReqwestTransport::new(build_http_client(&create_test_config()).unwrap());
        let result = transport.fetch("http://127.0.0.1:9/a.png").await;
        assert!(matches!(
            result,
            Err(TransportError::Connection(_)) | Err(TransportError::Timeout(_))
        ));
    }
}
