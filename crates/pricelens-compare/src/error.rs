use pricelens_scraper::ExtractError;
use thiserror::Error;

/// Fatal failures for a comparison request. Secondary search failures are
/// absorbed into empty slots and never surface here.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("unsupported marketplace url: {url}")]
    UnsupportedPlatform { url: String },

    #[error("could not extract the source product: {0}")]
    SourceExtraction(#[from] ExtractError),
}
