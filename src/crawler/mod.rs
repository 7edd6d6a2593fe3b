//! Crawler module for web page fetching
//!
//! This module contains the crawl engine that feeds the pipeline:
//! - HTTP fetching for primary pages and secondary links
//! - Anchor extraction for the frontier
//! - Breadth-first scheduling with politeness delays

mod engine;
mod fetcher;
mod parser;

pub use engine::{CrawlStats, SiteCrawler};
pub use fetcher::{build_http_client, fetch_page, ReqwestTransport};
pub use parser::{data_uri_reason, extract_anchor_targets, AnchorTarget};
