//! Canonical extraction types shared across the workspace.
//!
//! Both types are created per request by an extractor, never mutated after
//! construction, and discarded once the comparison output is built. There is
//! no cross-request caching in the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// The canonical extracted representation of one marketplace listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub platform: Platform,

    /// Cleaned, length-capped display title. May be empty only when `brand`
    /// is not (see [`ProductRecord::is_identifiable`]).
    pub title: String,

    /// Brand name; empty when no brand element or heuristic matched.
    pub brand: String,

    /// Normalized currency string (symbol + whole-rupee amount) or `"N/A"`.
    pub price: String,

    /// Pre-discount price, when the page exposes one.
    pub original_price: Option<String>,

    /// Absolute image URL, or empty when no usable image was found.
    pub image: String,

    /// Category, usually the last breadcrumb link; may be empty.
    pub category: String,

    /// Short feature strings, deduplicated case-insensitively and capped.
    pub features: Vec<String>,

    /// Numeric rating string (e.g. `"4.3"`) or empty.
    pub rating: String,

    /// Review count digits or empty.
    pub reviews: String,

    /// The product page URL the record was extracted from.
    pub url: String,

    pub scraped_at: DateTime<Utc>,
}

impl ProductRecord {
    /// A record with neither title nor brand identifies nothing and must not
    /// be returned as a successful extraction.
    #[must_use]
    pub fn is_identifiable(&self) -> bool {
        !self.title.is_empty() || !self.brand.is_empty()
    }
}

/// A lighter record extracted from a marketplace search results card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub title: String,
    /// Bare numeric price string as shown on the card; may be empty.
    pub price: String,
    /// Absolute image URL or empty.
    pub image: String,
    /// Absolute product page link.
    pub link: String,
}

impl SearchCandidate {
    /// Candidates missing a title or link are discarded before matching.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.title.is_empty() && !self.link.is_empty()
    }
}
