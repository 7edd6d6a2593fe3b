//! Integration tests for Crawlsheet
//!
//! These tests use wiremock to create mock HTTP servers and run the crawl
//! engine, the pipeline and the sinks end to end.

mod crawl_tests;
mod pipeline_tests;
mod resolver_tests;
mod support;
