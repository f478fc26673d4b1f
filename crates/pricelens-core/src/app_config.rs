use std::net::SocketAddr;

/// Application configuration, sourced from `PRICELENS_*` environment
/// variables by [`crate::config::load_app_config`].
#[derive(Clone)]
pub struct AppConfig {
    /// Base URL of the remote page renderer (Browserless-style `/content`
    /// endpoint). The only required setting.
    pub renderer_url: String,
    /// Optional API token for the renderer.
    pub renderer_token: Option<String>,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Hard cap on a single page navigation, in seconds.
    pub nav_timeout_secs: u64,
    /// Bounded wait for a selector to resolve after navigation, in seconds.
    pub selector_timeout_secs: u64,
    /// Randomized pre-navigation delay bounds, in milliseconds.
    pub pre_nav_delay_min_ms: u64,
    pub pre_nav_delay_max_ms: u64,
    /// Randomized delay between the two secondary searches, in milliseconds.
    pub search_delay_min_ms: u64,
    pub search_delay_max_ms: u64,
    /// Browser identity presented to the marketplaces.
    pub user_agent: String,
    pub accept_language: String,
    /// Currency symbol used when a page does not expose its own.
    pub currency_fallback: String,
    /// Display-title cap before the ellipsis marker is appended.
    pub max_title_len: usize,
    /// How many search result cards to extract per marketplace.
    pub max_candidates: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("renderer_url", &self.renderer_url)
            .field(
                "renderer_token",
                &self.renderer_token.as_ref().map(|_| "[redacted]"),
            )
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("nav_timeout_secs", &self.nav_timeout_secs)
            .field("selector_timeout_secs", &self.selector_timeout_secs)
            .field("pre_nav_delay_min_ms", &self.pre_nav_delay_min_ms)
            .field("pre_nav_delay_max_ms", &self.pre_nav_delay_max_ms)
            .field("search_delay_min_ms", &self.search_delay_min_ms)
            .field("search_delay_max_ms", &self.search_delay_max_ms)
            .field("user_agent", &self.user_agent)
            .field("accept_language", &self.accept_language)
            .field("currency_fallback", &self.currency_fallback)
            .field("max_title_len", &self.max_title_len)
            .field("max_candidates", &self.max_candidates)
            .finish()
    }
}
