use pricelens_core::Platform;
use thiserror::Error;

/// Failures while talking to the page rendering service.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("renderer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("renderer returned {status}: {message}")]
    Renderer { status: u16, message: String },

    #[error("no page has been navigated in this session")]
    NoPage,
}

/// Failures while extracting product data from a marketplace page.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{} served a bot challenge instead of the page", .platform.retailer_name())]
    BotDetection { platform: Platform },

    #[error("product is unavailable or the page was not found on {}", .platform.retailer_name())]
    ProductUnavailable { platform: Platform },

    #[error("{} page structure did not match known selectors ({context})", .platform.retailer_name())]
    PageStructureChanged { platform: Platform, context: String },

    #[error("could not extract an identifiable product from {}", .platform.retailer_name())]
    ExtractionIncomplete { platform: Platform },

    #[error("invalid product url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ExtractError {
    /// True when the failure came from the remote site pushing back rather
    /// than from our own plumbing.
    #[must_use]
    pub fn is_site_side(&self) -> bool {
        matches!(
            self,
            Self::BotDetection { .. }
                | Self::ProductUnavailable { .. }
                | Self::PageStructureChanged { .. }
        )
    }
}
