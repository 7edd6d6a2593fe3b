//! Shared helpers for the integration tests

use crawlsheet::config::Config;
use crawlsheet::crawler::{build_http_client, CrawlStats, ReqwestTransport, SiteCrawler};
use crawlsheet::pipeline::{NoProgress, PipelineSettings, RunSummary};
use crawlsheet::{open_sink, Pipeline};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Creates a configuration tuned for fast tests
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.minimum_time_on_page = 0;
    config.crawler.max_concurrent_pages_open = 4;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.pipeline.flush_threshold = 2;
    config.pipeline.retry_backoff_ms = 10;
    config
}

/// Crawls `start_url` into `output` and returns both summaries
pub async fn crawl_into(config: &Config, start_url: &str, output: &Path) -> (RunSummary, CrawlStats) {
    let sink = open_sink(output, false, "test-hash").expect("Failed to open sink");
    let client = build_http_client(&config.user_agent).expect("Failed to build client");

    let pipeline = Pipeline::new(
        PipelineSettings::from(&config.pipeline),
        ReqwestTransport::new(client.clone()),
        sink,
        Arc::new(NoProgress),
    );
    let crawler = SiteCrawler::new(config, client);

    let (sender, receiver) = mpsc::channel(64);
    let pipeline_task = tokio::spawn(pipeline.run(receiver));

    let stats = crawler
        .crawl(start_url, sender)
        .await
        .expect("Crawl failed");
    let summary = pipeline_task
        .await
        .expect("Pipeline task panicked")
        .expect("Pipeline failed");

    (summary, stats)
}

/// Reads a CSV output into rows keyed by URL
pub fn read_csv_rows(path: &Path) -> HashMap<String, Vec<String>> {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open CSV");
    reader
        .records()
        .map(|record| {
            let record = record.expect("Malformed CSV row");
            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            (cells[0].clone(), cells)
        })
        .collect()
}

/// Column positions in the CSV output
pub mod column {
    pub const REFERER: usize = 1;
    pub const STATUS: usize = 2;
    pub const SIZE: usize = 4;
    pub const CONTENT_TYPE: usize = 5;
    pub const LANG: usize = 7;
    pub const SEO_TITLE: usize = 8;
    pub const SEO_DESCRIPTION: usize = 9;
    pub const ERROR: usize = 17;
}
