pub mod app_config;
pub mod config;
pub mod platform;
pub mod types;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use platform::{classify_platform, Platform};
pub use types::{ProductRecord, SearchCandidate};
