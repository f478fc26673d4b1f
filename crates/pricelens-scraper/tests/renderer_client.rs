//! Integration tests for the renderer client against a stub rendering
//! service.

use pricelens_scraper::{RendererClient, ScrapeConfig, SessionError, SessionProvider};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> ScrapeConfig {
    let mut config = ScrapeConfig::default().without_delays();
    config.nav_timeout_secs = 5;
    config.selector_timeout_secs = 2;
    config
}

#[tokio::test]
async fn navigate_posts_url_and_keeps_the_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/content"))
        .and(body_partial_json(serde_json::json!({
            "url": "https://www.amazon.in/dp/B0TEST",
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><span id=\"productTitle\">Kettle</span></body></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config();
    let client = RendererClient::new(&server.uri(), None, &config).unwrap();
    let mut session = client.open(&config).await.unwrap();

    session.navigate("https://www.amazon.in/dp/B0TEST").await.unwrap();
    let html = session.html().await.unwrap();
    assert!(html.contains("Kettle"));

    let found = session.wait_for_any(&["#productTitle"]).await.unwrap();
    assert_eq!(found.as_deref(), Some("#productTitle"));
    session.close().await;
}

#[tokio::test]
async fn missing_selector_triggers_exactly_one_re_render() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/content"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .expect(3)
        .mount(&server)
        .await;

    let config = test_config();
    let client = RendererClient::new(&server.uri(), None, &config).unwrap();
    let mut session = client.open(&config).await.unwrap();
    session.navigate("https://www.flipkart.com/x/p/1").await.unwrap();

    // First wait re-renders once with waitForSelector, second gives up
    // without another request. One navigate plus one re-render is two calls,
    // then a fresh navigate makes the third.
    assert_eq!(session.wait_for_any(&["span.B_NuCI"]).await.unwrap(), None);
    assert_eq!(session.wait_for_any(&["span.B_NuCI"]).await.unwrap(), None);
    session.navigate("https://www.flipkart.com/x/p/1").await.unwrap();
    session.close().await;
}

#[tokio::test]
async fn token_is_sent_as_query_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/content"))
        .and(query_param("token", "t0ken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config();
    let client = RendererClient::new(&server.uri(), Some("t0ken"), &config).unwrap();
    let mut session = client.open(&config).await.unwrap();
    session.navigate("https://www.myntra.com/p/1").await.unwrap();
    session.close().await;
}

#[tokio::test]
async fn renderer_error_status_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/content"))
        .respond_with(ResponseTemplate::new(503).set_body_string("browser pool exhausted"))
        .mount(&server)
        .await;

    let config = test_config();
    let client = RendererClient::new(&server.uri(), None, &config).unwrap();
    let mut session = client.open(&config).await.unwrap();

    let err = session
        .navigate("https://www.amazon.in/dp/B0TEST")
        .await
        .unwrap_err();
    match err {
        SessionError::Renderer { status, message } => {
            assert_eq!(status, 503);
            assert!(message.contains("exhausted"));
        }
        other => panic!("unexpected error: {other}"),
    }
    session.close().await;
}
