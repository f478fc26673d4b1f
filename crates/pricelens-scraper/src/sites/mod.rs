//! Per-marketplace extraction strategies.
//!
//! Each marketplace module owns its selector tables, bot-challenge
//! signatures, and cleanup quirks behind the common [`MarketplaceExtractor`]
//! trait. Page fetching goes through the shared session layer; parsing is
//! pure and synchronous over the fetched HTML.

pub mod amazon;
pub mod flipkart;
pub mod myntra;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use pricelens_core::{Platform, ProductRecord, SearchCandidate};
use tracing::debug;

use crate::error::ExtractError;
use crate::session::{ScrapeConfig, SessionProvider};

pub use amazon::AmazonExtractor;
pub use flipkart::FlipkartExtractor;
pub use myntra::MyntraExtractor;

/// Extraction strategy for one marketplace.
#[async_trait]
pub trait MarketplaceExtractor: Send + Sync {
    fn platform(&self) -> Platform;

    /// Fetches a product page and extracts its record.
    async fn extract_product(&self, url: &str) -> Result<ProductRecord, ExtractError>;

    /// Runs a search and returns candidate listings, best-first in page
    /// order. An explicit empty result page yields an empty vec, not an
    /// error.
    async fn search_candidates(&self, query: &str) -> Result<Vec<SearchCandidate>, ExtractError>;
}

/// Builds one extractor per supported marketplace over a shared session
/// provider.
#[must_use]
pub fn build_extractors(
    provider: Arc<dyn SessionProvider>,
    config: &ScrapeConfig,
) -> HashMap<Platform, Arc<dyn MarketplaceExtractor>> {
    let mut extractors: HashMap<Platform, Arc<dyn MarketplaceExtractor>> = HashMap::new();
    extractors.insert(
        Platform::Amazon,
        Arc::new(AmazonExtractor::new(Arc::clone(&provider), config.clone())),
    );
    extractors.insert(
        Platform::Flipkart,
        Arc::new(FlipkartExtractor::new(Arc::clone(&provider), config.clone())),
    );
    extractors.insert(
        Platform::Myntra,
        Arc::new(MyntraExtractor::new(provider, config.clone())),
    );
    extractors
}

/// Opens a session, navigates, waits for any expected selector, and returns
/// the rendered HTML. The session is closed on every path.
pub(crate) async fn fetch_page(
    provider: &dyn SessionProvider,
    config: &ScrapeConfig,
    url: &str,
    wait_for: &[&str],
) -> Result<String, ExtractError> {
    let mut session = provider.open(config).await?;
    let result = async {
        session.navigate(url).await?;
        if session.wait_for_any(wait_for).await?.is_none() {
            debug!(url, "none of the expected selectors appeared");
        }
        session.html().await
    }
    .await;
    session.close().await;
    Ok(result?)
}

/// Validates that `url` is a well-formed link to the given marketplace.
pub(crate) fn validate_product_url(url: &str, platform: Platform) -> Result<(), ExtractError> {
    match pricelens_core::classify_platform(url) {
        Some(found) if found == platform => Ok(()),
        Some(found) => Err(ExtractError::InvalidUrl {
            url: url.to_string(),
            reason: format!(
                "expected a {} link but got {}",
                platform.retailer_name(),
                found.retailer_name()
            ),
        }),
        None => Err(ExtractError::InvalidUrl {
            url: url.to_string(),
            reason: "not a recognizable marketplace product link".to_string(),
        }),
    }
}
