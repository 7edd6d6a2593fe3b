//! Pipeline runs into SQLite output and failure handling

use crate::support::{crawl_into, create_test_config};
use crawlsheet::pipeline::{CrawlEvent, NoProgress, PageDisallowance, PipelineSettings};
use crawlsheet::crawler::{build_http_client, ReqwestTransport};
use crawlsheet::{open_sink, CrawlsheetError, Pipeline};
use rusqlite::Connection;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_crawl_into_sqlite() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><title>Home</title></head><body><img src="/missing.png"></body></html>"#,
            "text/html",
        ))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("results.db");

    let (summary, _) = crawl_into(&create_test_config(), &base_url, &output).await;
    assert_eq!(summary.records_written, 2);

    let conn = Connection::open(&output).unwrap();
    let (status, error): (u16, String) = conn
        .query_row(
            "SELECT status, error FROM results WHERE url = ?1",
            [format!("{}/missing.png", base_url)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(status, 404);
    assert_eq!(error, "Empty response");

    let title: String = conn
        .query_row(
            "SELECT seo_title FROM results WHERE url = ?1",
            [format!("{}/", base_url)],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(title, "Home");

    let (run_status, hash): (String, String) = conn
        .query_row("SELECT status, config_hash FROM runs", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(run_status, "completed");
    assert_eq!(hash, "test-hash");
}

#[tokio::test]
async fn test_unreachable_start_page_is_recorded() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("down.csv");
    let mut config = create_test_config();
    config.crawler.respect_robots = false;

    let (summary, stats) = crawl_into(&config, "http://127.0.0.1:9/", &output).await;

    assert_eq!(stats.pages_failed, 1);
    assert_eq!(summary.failures, 1);

    let rows = crate::support::read_csv_rows(&output);
    let row = &rows["http://127.0.0.1:9/"];
    assert_eq!(row[crate::support::column::STATUS], "503");
    assert!(row[crate::support::column::ERROR].starts_with("No connection!"));
}

#[tokio::test]
async fn test_existing_output_requires_overwrite() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("taken.csv");
    std::fs::write(&output, "keep me").unwrap();

    let result = open_sink(&output, false, "hash");
    assert!(matches!(result, Err(CrawlsheetError::OutputExists { .. })));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "keep me");
}

#[tokio::test]
async fn test_events_sent_directly_are_flushed_in_batches() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("direct.csv");
    let config = create_test_config();

    let pipeline = Pipeline::new(
        PipelineSettings::from(&config.pipeline),
        ReqwestTransport::new(build_http_client(&config.user_agent).unwrap()),
        open_sink(&output, false, "hash").unwrap(),
        Arc::new(NoProgress),
    );

    let (sender, receiver) = mpsc::channel(8);
    let run = tokio::spawn(pipeline.run(receiver));

    for i in 0..5 {
        sender
            .send(CrawlEvent::PageDisallowed(PageDisallowance {
                url: format!("https://example.com/blocked/{}", i),
                referer: None,
                reason: "robots.txt".to_string(),
            }))
            .await
            .unwrap();
    }
    sender
        .send(CrawlEvent::PageDisallowed(PageDisallowance {
            url: "https://example.com/BLOCKED/0".to_string(),
            referer: None,
            reason: "robots.txt".to_string(),
        }))
        .await
        .unwrap();
    drop(sender);

    let summary = run.await.unwrap().unwrap();

    assert_eq!(summary.pages, 6);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.records_written, 5);
    assert_eq!(summary.batches, 3);
    assert_eq!(crate::support::read_csv_rows(&output).len(), 5);
}
