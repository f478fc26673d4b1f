//! Browser session contract used by the marketplace extractors.
//!
//! Extractors never talk to the rendering service directly. They open a
//! [`BrowserSession`] through a [`SessionProvider`], drive it with plain
//! string URLs and CSS selectors, and read back owned HTML. That keeps the
//! extractors testable with canned pages and keeps non-`Send` DOM handles
//! out of async code.

use async_trait::async_trait;
use pricelens_core::AppConfig;

use crate::error::SessionError;

/// Per-session tuning carried from [`AppConfig`] into the scraping layer.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub nav_timeout_secs: u64,
    pub selector_timeout_secs: u64,
    /// Inclusive jitter window slept before each navigation, in milliseconds.
    pub pre_nav_delay_ms: (u64, u64),
    pub currency_fallback: String,
    pub max_title_len: usize,
    pub max_candidates: usize,
}

impl ScrapeConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            nav_timeout_secs: config.nav_timeout_secs,
            selector_timeout_secs: config.selector_timeout_secs,
            pre_nav_delay_ms: (config.pre_nav_delay_min_ms, config.pre_nav_delay_max_ms),
            currency_fallback: config.currency_fallback.clone(),
            max_title_len: config.max_title_len,
            max_candidates: config.max_candidates,
        }
    }

    /// Variant with no artificial delays, for tests against local fixtures.
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.pre_nav_delay_ms = (0, 0);
        self
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
                "(KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
            )
            .to_string(),
            accept_language: "en-US,en;q=0.9,en-IN;q=0.8".to_string(),
            nav_timeout_secs: 60,
            selector_timeout_secs: 15,
            pre_nav_delay_ms: (1000, 3000),
            currency_fallback: "\u{20b9}".to_string(),
            max_title_len: 100,
            max_candidates: 5,
        }
    }
}

/// One rendered-page session against a single marketplace.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates to `url` and renders the page.
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Waits for any of `selectors` to be present in the rendered page.
    ///
    /// Returns the first selector that matched, or `Ok(None)` when the page
    /// rendered fine but none of the selectors ever appeared. Transport
    /// failures are errors; a missing selector is signal, not failure.
    async fn wait_for_any(&mut self, selectors: &[&str]) -> Result<Option<String>, SessionError>;

    /// Full HTML of the current page.
    async fn html(&mut self) -> Result<String, SessionError>;

    /// Releases the session. Must be called on every exit path.
    async fn close(self: Box<Self>);
}

/// Source of [`BrowserSession`]s.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open(&self, config: &ScrapeConfig) -> Result<Box<dyn BrowserSession>, SessionError>;
}
