//! Marketplace page rendering and product extraction.
//!
//! A [`session::SessionProvider`] hands out rendered-page sessions (backed by
//! a headless browser service in production), and per-marketplace extractors
//! in [`sites`] turn rendered HTML into [`pricelens_core::ProductRecord`]s and
//! search candidate lists. All DOM work happens on owned HTML snapshots so
//! nothing non-`Send` is ever held across an await point.

pub mod clean;
pub mod error;
pub mod renderer;
pub mod session;
pub mod sites;
pub mod snapshot;

pub use error::{ExtractError, SessionError};
pub use renderer::RendererClient;
pub use session::{BrowserSession, ScrapeConfig, SessionProvider};
pub use sites::{build_extractors, MarketplaceExtractor};
