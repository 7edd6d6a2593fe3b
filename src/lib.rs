//! Crawlsheet: crawl a site and tabulate what it serves
//!
//! This crate aggregates crawl events into result records, deduplicates them,
//! resolves the secondary assets each page references (images, scripts,
//! stylesheets) and persists everything in ordered batches to a spreadsheet
//! or database sink.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod pipeline;
pub mod robots;
pub mod sink;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Crawlsheet operations
#[derive(Debug, Error)]
pub enum CrawlsheetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("Output file already exists: {} (pass --overwrite to replace it)", path.display())]
    OutputExists { path: PathBuf },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Event channel closed before the crawl finished")]
    ChannelClosed,

    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Crawlsheet operations
pub type Result<T> = std::result::Result<T, CrawlsheetError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{CrawlEvent, Pipeline, ResultRecord, RunSummary};
pub use sink::{open_sink, PersistenceSink};
pub use url::{asset_key, canonicalize_url, page_key, DedupKey};
