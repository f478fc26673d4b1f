use thiserror::Error;

use crate::app_config::AppConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process. Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let renderer_url = require("PRICELENS_RENDERER_URL")?;
    let renderer_token = lookup("PRICELENS_RENDERER_TOKEN").ok();

    let bind_addr = parse_addr("PRICELENS_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("PRICELENS_LOG_LEVEL", "info");

    let nav_timeout_secs = parse_u64("PRICELENS_NAV_TIMEOUT_SECS", "60")?;
    let selector_timeout_secs = parse_u64("PRICELENS_SELECTOR_TIMEOUT_SECS", "15")?;
    let pre_nav_delay_min_ms = parse_u64("PRICELENS_PRE_NAV_DELAY_MIN_MS", "1000")?;
    let pre_nav_delay_max_ms = parse_u64("PRICELENS_PRE_NAV_DELAY_MAX_MS", "3000")?;
    let search_delay_min_ms = parse_u64("PRICELENS_SEARCH_DELAY_MIN_MS", "2000")?;
    let search_delay_max_ms = parse_u64("PRICELENS_SEARCH_DELAY_MAX_MS", "3000")?;

    let user_agent = or_default(
        "PRICELENS_USER_AGENT",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    );
    let accept_language = or_default("PRICELENS_ACCEPT_LANGUAGE", "en-US,en;q=0.9,en-IN;q=0.8");
    let currency_fallback = or_default("PRICELENS_CURRENCY_FALLBACK", "\u{20b9}");

    let max_title_len = parse_usize("PRICELENS_MAX_TITLE_LEN", "100")?;
    let max_candidates = parse_usize("PRICELENS_MAX_CANDIDATES", "5")?;

    if pre_nav_delay_max_ms < pre_nav_delay_min_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "PRICELENS_PRE_NAV_DELAY_MAX_MS".to_string(),
            reason: "must be >= PRICELENS_PRE_NAV_DELAY_MIN_MS".to_string(),
        });
    }
    if search_delay_max_ms < search_delay_min_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "PRICELENS_SEARCH_DELAY_MAX_MS".to_string(),
            reason: "must be >= PRICELENS_SEARCH_DELAY_MIN_MS".to_string(),
        });
    }

    Ok(AppConfig {
        renderer_url,
        renderer_token,
        bind_addr,
        log_level,
        nav_timeout_secs,
        selector_timeout_secs,
        pre_nav_delay_min_ms,
        pre_nav_delay_max_ms,
        search_delay_min_ms,
        search_delay_max_ms,
        user_agent,
        accept_language,
        currency_fallback,
        max_title_len,
        max_candidates,
    })
}
