//! End-to-end crawls against a mock site

use crate::support::{column, crawl_into, create_test_config, read_csv_rows};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_html(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .mount(&mock_server)
        .await;

    mount_html(
        &mock_server,
        "/",
        r#"<html lang="en"><head><title>Home</title>
        <meta name="description" content="Front page">
        <link rel="stylesheet" href="/style.css"></head>
        <body>
            <img src="/logo.png">
            <a href="/about">About</a>
            <a href="/private">Private</a>
            <a href="data:image/png;base64,AAAA">Inline</a>
            <a href="https://other.example/">Elsewhere</a>
        </body></html>"#,
    )
    .await;

    mount_html(
        &mock_server,
        "/about",
        r#"<html><head><title>About</title></head>
        <body><img src="/logo.png?v=2"><a href="/">Home</a></body></html>"#,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/style.css"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("@font-face{src:url(/fonts/a.woff);}", "text/css"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PNGDATA".to_vec(), "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("site.csv");
    let config = create_test_config();

    let (summary, stats) = crawl_into(&config, &base_url, &output).await;

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.robots_disallowed, 1);
    assert_eq!(stats.data_links, 1);

    assert_eq!(summary.pages, 4);
    assert_eq!(summary.ignored_disallows, 1);
    assert_eq!(summary.secondary_links, 2);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.records_written, 5);

    let rows = read_csv_rows(&output);
    assert_eq!(rows.len(), 5);

    let home = &rows[&format!("{}/", base_url)];
    assert_eq!(home[column::STATUS], "200");
    assert_eq!(home[column::LANG], "en");
    assert_eq!(home[column::SEO_TITLE], "Home");
    assert_eq!(home[column::SEO_DESCRIPTION], "Front page");
    assert_eq!(home[column::ERROR], "");

    let about = &rows[&format!("{}/about", base_url)];
    assert_eq!(about[column::REFERER], format!("{}/", base_url));

    let private = &rows[&format!("{}/private", base_url)];
    assert_eq!(private[column::STATUS], "500");
    assert_eq!(private[column::ERROR], "robots.txt");

    let logo = &rows[&format!("{}/logo.png", base_url)];
    assert_eq!(logo[column::STATUS], "200");
    assert_eq!(logo[column::SIZE], "7");
    assert_eq!(logo[column::CONTENT_TYPE], "image/png");

    let css = &rows[&format!("{}/style.css", base_url)];
    assert_eq!(css[column::CONTENT_TYPE], "text/css");

    assert!(!rows.keys().any(|url| url.starts_with("data:")));
    assert!(!rows.keys().any(|url| url.contains("fonts")));
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(&mock_server, "/", r#"<a href="/level1">next</a>"#).await;
    mount_html(&mock_server, "/level1", r#"<a href="/level2">next</a>"#).await;

    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("depth.csv");
    let mut config = create_test_config();
    config.crawler.max_depth = 1;

    let (summary, stats) = crawl_into(&config, &base_url, &output).await;

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.links_over_limit, 1);
    assert_eq!(summary.records_written, 2);

    let rows = read_csv_rows(&output);
    assert!(rows.contains_key(&format!("{}/level1", base_url)));
    assert!(!rows.contains_key(&format!("{}/level2", base_url)));
}

#[tokio::test]
async fn test_crawl_with_page_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/",
        r#"<a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>"#,
    )
    .await;
    for route in ["/a", "/b", "/c"] {
        mount_html(&mock_server, route, "<html></html>").await;
    }

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("limit.csv");
    let mut config = create_test_config();
    config.crawler.max_pages = 2;

    let (_, stats) = crawl_into(&config, &base_url, &output).await;

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.links_over_limit, 2);
    assert_eq!(read_csv_rows(&output).len(), 2);
}

#[tokio::test]
async fn test_robots_disallows_start_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("robots.csv");

    let (summary, stats) = crawl_into(&create_test_config(), &base_url, &output).await;

    assert_eq!(stats.pages_fetched, 0);
    assert_eq!(stats.robots_disallowed, 1);
    assert_eq!(summary.records_written, 1);

    let rows = read_csv_rows(&output);
    let start = &rows[&format!("{}/", base_url)];
    assert_eq!(start[column::STATUS], "500");
    assert_eq!(start[column::ERROR], "robots.txt");
}

#[tokio::test]
async fn test_non_html_page_is_recorded_without_metadata() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(&mock_server, "/", r#"<a href="/report.pdf">report</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("pdf.csv");

    crawl_into(&create_test_config(), &base_url, &output).await;

    let rows = read_csv_rows(&output);
    let pdf = &rows[&format!("{}/report.pdf", base_url)];
    assert_eq!(pdf[column::STATUS], "200");
    assert_eq!(pdf[column::SIZE], "8");
    assert_eq!(pdf[column::CONTENT_TYPE], "application/pdf");
    assert_eq!(pdf[column::SEO_TITLE], "");
}
