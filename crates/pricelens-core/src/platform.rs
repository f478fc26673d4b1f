//! Marketplace identification from product URLs.

use serde::{Deserialize, Serialize};

/// One of the three supported marketplaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Amazon,
    Flipkart,
    Myntra,
}

impl Platform {
    /// Fixed display order used everywhere a stable platform sequence is
    /// needed (comparison slots, fallback search order).
    pub const DISPLAY_ORDER: [Platform; 3] =
        [Platform::Amazon, Platform::Flipkart, Platform::Myntra];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Amazon => "amazon",
            Platform::Flipkart => "flipkart",
            Platform::Myntra => "myntra",
        }
    }

    /// Human-facing retailer name for comparison output.
    #[must_use]
    pub fn retailer_name(self) -> &'static str {
        match self {
            Platform::Amazon => "Amazon",
            Platform::Flipkart => "Flipkart",
            Platform::Myntra => "Myntra",
        }
    }

    /// The two other marketplaces, in [`Platform::DISPLAY_ORDER`].
    #[must_use]
    pub fn others(self) -> [Platform; 2] {
        match self {
            Platform::Amazon => [Platform::Flipkart, Platform::Myntra],
            Platform::Flipkart => [Platform::Amazon, Platform::Myntra],
            Platform::Myntra => [Platform::Amazon, Platform::Flipkart],
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies an arbitrary string as a supported marketplace product URL.
///
/// Pure and total: any input yields either a platform or `None` (unknown);
/// the function never panics. Matching is a case-insensitive substring test
/// on the parsed hostname, in fixed priority order. `"amazon."` covers every
/// regional storefront (amazon.in, amazon.com, ...).
#[must_use]
pub fn classify_platform(input: &str) -> Option<Platform> {
    let parsed = url::Url::parse(input).ok()?;
    let host = parsed.host_str()?.to_lowercase();

    if host.contains("amazon.") {
        return Some(Platform::Amazon);
    }
    if host.contains("flipkart.com") {
        return Some(Platform::Flipkart);
    }
    if host.contains("myntra.com") {
        return Some(Platform::Myntra);
    }
    None
}
