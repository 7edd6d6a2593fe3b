//! Secondary link resolution against a mock server

use crawlsheet::crawler::{build_http_client, ReqwestTransport};
use crawlsheet::extract::ParsedLink;
use crawlsheet::pipeline::{ResolverSettings, SecondaryLinkResolver};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver() -> SecondaryLinkResolver<ReqwestTransport> {
    let config = crate::support::create_test_config();
    let client = build_http_client(&config.user_agent).unwrap();
    let settings = ResolverSettings {
        backoff: Duration::from_millis(20),
        ..ResolverSettings::from(&config.pipeline)
    };
    SecondaryLinkResolver::new(ReqwestTransport::new(client), settings)
}

#[tokio::test]
async fn test_unavailable_twice_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PNG".to_vec(), "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let link = ParsedLink::new(
        format!("{}/img/a.png", mock_server.uri()),
        format!("{}/", mock_server.uri()),
    );
    let resolution = resolver().resolve(&link).await;

    assert_eq!(resolution.attempts, 3);
    assert_eq!(resolution.backoffs, 2);
    assert_eq!(resolution.record.http_status, 200);
    assert_eq!(resolution.record.size_bytes, 3);
    assert!(!resolution.record.has_error());
}

#[tokio::test]
async fn test_unavailable_pages_with_body_are_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/img/b.png"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/b.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PNG".to_vec(), "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let link = ParsedLink::new(
        format!("{}/img/b.png", mock_server.uri()),
        format!("{}/", mock_server.uri()),
    );
    let resolution = resolver().resolve(&link).await;

    assert_eq!(resolution.attempts, 3);
    assert_eq!(resolution.backoffs, 2);
    assert_eq!(resolution.record.http_status, 200);
    assert!(!resolution.record.has_error());
}

#[tokio::test]
async fn test_not_found_page_with_body_is_recorded_as_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone.css"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<h1>Not Found</h1>"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let link = ParsedLink::new(
        format!("{}/gone.css", mock_server.uri()),
        format!("{}/", mock_server.uri()),
    );
    let resolution = resolver().resolve(&link).await;

    assert_eq!(resolution.attempts, 3);
    assert_eq!(resolution.backoffs, 0);
    assert_eq!(resolution.record.http_status, 404);
    assert_eq!(resolution.record.error_text, "HTTP status 404");
    assert!(resolution.css_urls.is_empty());
}

#[tokio::test]
async fn test_not_found_is_retried_without_backoff() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.js"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;

    let link = ParsedLink::new(
        format!("{}/missing.js", mock_server.uri()),
        format!("{}/", mock_server.uri()),
    );
    let resolution = resolver().resolve(&link).await;

    assert_eq!(resolution.attempts, 3);
    assert_eq!(resolution.backoffs, 0);
    assert_eq!(resolution.record.http_status, 404);
    assert_eq!(resolution.record.size_bytes, 0);
    assert_eq!(resolution.record.error_text, "Empty response");
}

#[tokio::test]
async fn test_stylesheet_font_urls_are_reported_not_fetched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/css/site.css"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"@font-face { font-family: "Body"; src: url("/fonts/body.woff2"); }"#,
            "text/css",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fonts/body.woff2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let link = ParsedLink::new(
        format!("{}/css/site.css", mock_server.uri()),
        format!("{}/", mock_server.uri()),
    );
    assert!(link.is_css());

    let resolution = resolver().resolve(&link).await;

    assert_eq!(resolution.attempts, 1);
    assert_eq!(resolution.css_urls, vec!["/fonts/body.woff2".to_string()]);
}
