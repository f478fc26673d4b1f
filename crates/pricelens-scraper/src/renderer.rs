//! HTTP client for a headless page rendering service.
//!
//! The service exposes a Browserless-compatible `POST /content` endpoint:
//! send a URL plus goto options, get back fully rendered HTML. Each
//! [`RendererSession`] keeps the latest snapshot and re-renders at most once
//! with a `waitForSelector` directive when a wanted selector is missing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::session::{BrowserSession, ScrapeConfig, SessionProvider};
use crate::snapshot::first_matching_selector;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RendererClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RendererClient {
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        config: &ScrapeConfig,
    ) -> Result<Self, SessionError> {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&config.accept_language) {
            headers.insert(ACCEPT_LANGUAGE, value);
        }
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(ToString::to_string),
        })
    }

    /// Renders `url` and returns the page HTML. `wait_for` adds a
    /// `waitForSelector` directive so the service blocks until the element
    /// appears (or its own timeout fires).
    async fn render(
        &self,
        url: &str,
        config: &ScrapeConfig,
        wait_for: Option<&str>,
    ) -> Result<String, SessionError> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(token) = &self.token {
            endpoint.push_str("?token=");
            endpoint.push_str(token);
        }

        let mut body = serde_json::json!({
            "url": url,
            "gotoOptions": {
                "waitUntil": "domcontentloaded",
                "timeout": config.nav_timeout_secs * 1000,
            },
        });
        let mut budget_secs = config.nav_timeout_secs;
        if let Some(selector) = wait_for {
            body["waitForSelector"] = serde_json::json!({
                "selector": selector,
                "timeout": config.selector_timeout_secs * 1000,
            });
            budget_secs += config.selector_timeout_secs;
        }

        debug!(url, wait_for, "rendering page");
        let request = self.client.post(&endpoint).json(&body).send();
        let response = tokio::time::timeout(Duration::from_secs(budget_secs + 5), request)
            .await
            .map_err(|_| SessionError::NavigationTimeout {
                url: url.to_string(),
                timeout_secs: budget_secs,
            })??;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let message = message.chars().take(200).collect::<String>();
            warn!(url, status = status.as_u16(), "renderer refused request");
            return Err(SessionError::Renderer {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl SessionProvider for RendererClient {
    async fn open(&self, config: &ScrapeConfig) -> Result<Box<dyn BrowserSession>, SessionError> {
        Ok(Box::new(RendererSession {
            client: self.clone(),
            config: config.clone(),
            url: None,
            html: None,
            re_rendered: false,
        }))
    }
}

/// One rendered page held as an HTML snapshot.
pub struct RendererSession {
    client: RendererClient,
    config: ScrapeConfig,
    url: Option<String>,
    html: Option<String>,
    re_rendered: bool,
}

impl RendererSession {
    /// Random human-ish pause before navigation, from the configured window.
    async fn pre_nav_delay(&self) {
        let (min, max) = self.config.pre_nav_delay_ms;
        if max == 0 {
            return;
        }
        let delay = {
            let mut rng = rand::rng();
            rand::Rng::random_range(&mut rng, min..=max)
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

#[async_trait]
impl BrowserSession for RendererSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.pre_nav_delay().await;
        let html = self.client.render(url, &self.config, None).await?;
        self.url = Some(url.to_string());
        self.html = Some(html);
        self.re_rendered = false;
        Ok(())
    }

    async fn wait_for_any(&mut self, selectors: &[&str]) -> Result<Option<String>, SessionError> {
        let url = self.url.clone().ok_or(SessionError::NoPage)?;
        let html = self.html.as_deref().ok_or(SessionError::NoPage)?;

        if let Some(found) = first_matching_selector(html, selectors) {
            return Ok(Some(found));
        }
        if self.re_rendered {
            return Ok(None);
        }

        // One retry with an explicit waitForSelector, in case the page needs
        // script-driven hydration before the element shows up.
        self.re_rendered = true;
        let wanted = selectors.first().copied();
        let html = self.client.render(&url, &self.config, wanted).await?;
        self.html = Some(html);
        Ok(first_matching_selector(
            self.html.as_deref().unwrap_or_default(),
            selectors,
        ))
    }

    async fn html(&mut self) -> Result<String, SessionError> {
        self.html.clone().ok_or(SessionError::NoPage)
    }

    async fn close(self: Box<Self>) {
        debug!(url = self.url.as_deref(), "closing renderer session");
    }
}

// -------------------------------------------------------------------------
// tests
// -------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> ScrapeConfig {
        ScrapeConfig::default().without_delays()
    }

    #[tokio::test]
    async fn session_without_navigation_reports_no_page() {
        let client = RendererClient::new("http://localhost:9", None, &quiet_config()).unwrap();
        let mut session = client.open(&quiet_config()).await.unwrap();
        assert!(matches!(session.html().await, Err(SessionError::NoPage)));
        assert!(matches!(
            session.wait_for_any(&["body"]).await,
            Err(SessionError::NoPage)
        ));
        session.close().await;
    }

    #[test]
    fn token_is_appended_as_query_parameter() {
        let config = quiet_config();
        let client = RendererClient::new("http://render.local/", Some("s3cret"), &config).unwrap();
        assert_eq!(client.base_url, "http://render.local");
        assert_eq!(client.token.as_deref(), Some("s3cret"));
    }
}
