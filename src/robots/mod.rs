//! Robots.txt handling module
//!
//! The crawl engine fetches robots.txt once per host and checks every page
//! against it before fetching. Disallowed pages are reported to the pipeline
//! instead of being fetched.

mod parser;

pub use parser::RobotsRules;

use reqwest::Client;
use url::Url;

/// Disallow reason reported for pages blocked by robots.txt
pub const ROBOTS_DISALLOW_REASON: &str = "robots.txt";

/// Fetches robots.txt for the host of `site`
///
/// Any failure allows everything: a missing file (4xx) is the common case,
/// and an unreachable one (5xx or network error) is logged.
///
/// # Arguments
///
/// * `client` - HTTP client carrying the crawler's user agent
/// * `site` - Any URL on the host
pub async fn fetch_robots(client: &Client, site: &Url) -> RobotsRules {
    let Ok(robots_url) = site.join("/robots.txt") else {
        return RobotsRules::allow_all();
    };

    let response = match client.get(robots_url.as_str()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", robots_url, e);
            return RobotsRules::allow_all();
        }
    };

    let status = response.status();
    if !status.is_success() {
        if status.is_server_error() {
            tracing::warn!("{} returned {}, allowing all", robots_url, status);
        } else {
            tracing::debug!("No robots.txt at {} ({})", robots_url, status);
        }
        return RobotsRules::allow_all();
    }

    match response.text().await {
        Ok(content) => {
            tracing::debug!("Loaded {} ({} bytes)", robots_url, content.len());
            RobotsRules::from_content(&content)
        }
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", robots_url, e);
            RobotsRules::allow_all()
        }
    }
}

/// Checks if a URL is allowed by robots.txt
///
/// # Arguments
///
/// * `robots` - Rules of the URL's host
/// * `url` - The URL to check
/// * `user_agent` - Product token of the crawler
pub fn is_allowed(robots: &RobotsRules, url: &Url, user_agent: &str) -> bool {
    robots.is_allowed(url.as_str(), user_agent)
}
