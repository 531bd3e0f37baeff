use lookalike_common::LookalikeError;
use lookalike_web::{BrowserFetcher, HttpFetcher, PageFetcher};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn http_fetcher_sends_browser_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ad"))
        .and(header("accept-language", "zh-CN,zh;q=0.9"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><p>offer</p></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let html = fetcher.fetch(&format!("{}/ad", server.uri())).await.unwrap();
    assert!(html.contains("offer"));
}

#[tokio::test]
async fn http_fetcher_makes_three_attempts_on_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let err = fetcher
        .fetch(&format!("{}/down", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, LookalikeError::Fetch(_)));
}

#[tokio::test]
async fn http_fetcher_retries_forbidden_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/guarded"))
        .respond_with(ResponseTemplate::new(403))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let err = fetcher
        .fetch(&format!("{}/guarded", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, LookalikeError::Fetch(_)));
}

#[tokio::test]
async fn stylesheet_fetch_is_a_single_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/site.css"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    assert!(fetcher
        .fetch_stylesheet(&format!("{}/site.css", server.uri()))
        .await
        .is_err());
}

#[tokio::test]
async fn unreachable_webdriver_is_a_fetch_error() {
    let server = MockServer::start().await;
    let fetcher = BrowserFetcher::new(server.uri(), Duration::from_secs(2));
    let err = fetcher.fetch("https://example.com/").await.unwrap_err();
    assert!(matches!(err, LookalikeError::Fetch(_)));
}

#[tokio::test]
#[ignore]
async fn webdriver_smoke() {
    // Requires chromedriver listening on localhost:9515.
    let fetcher = BrowserFetcher::new("http://localhost:9515", Duration::from_secs(20));
    let html = fetcher.fetch("https://example.com/").await.unwrap();
    assert!(html.contains("Example Domain"));
}
