//! Final comparison shape handed to the serving layer.

use chrono::{DateTime, Utc};
use pricelens_core::{Platform, ProductRecord, SearchCandidate};
use pricelens_scraper::clean;
use serde::Serialize;

/// Title sentinel for a slot with no acceptable match.
pub const NO_MATCH_TITLE: &str = "No Match Found";

/// Image shown for slots with no usable product image.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/100x100/eee/ccc?text=No+Image";

/// One marketplace slot in the comparison, either a real offer or the
/// explicit no-match placeholder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOffer {
    pub platform: Platform,
    pub retailer: String,
    pub title: String,
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<String>,
    pub category: String,
    pub image: String,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub rating: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reviews: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub discount: String,
    pub url: String,
    pub matched: bool,
}

impl PlatformOffer {
    /// Slot for the source marketplace, filled straight from the extracted
    /// record.
    #[must_use]
    pub fn from_record(record: &ProductRecord) -> Self {
        Self {
            platform: record.platform,
            retailer: record.platform.retailer_name().to_string(),
            title: record.title.clone(),
            price: record.price.clone(),
            original_price: record.original_price.clone(),
            category: record.category.clone(),
            image: usable_image(&record.image),
            features: record.features.clone(),
            rating: record.rating.clone(),
            reviews: record.reviews.clone(),
            discount: derive_discount(&record.price, record.original_price.as_deref()),
            url: record.url.clone(),
            matched: true,
        }
    }

    /// Slot built from the winning search candidate on a secondary
    /// marketplace. Search cards carry less detail than product pages.
    #[must_use]
    pub fn from_candidate(platform: Platform, candidate: &SearchCandidate) -> Self {
        Self {
            platform,
            retailer: platform.retailer_name().to_string(),
            title: candidate.title.clone(),
            price: candidate.price.clone(),
            original_price: None,
            category: String::new(),
            image: usable_image(&candidate.image),
            features: Vec::new(),
            rating: String::new(),
            reviews: String::new(),
            discount: String::new(),
            url: candidate.link.clone(),
            matched: true,
        }
    }

    /// Explicit placeholder for a marketplace with no acceptable match.
    #[must_use]
    pub fn no_match(platform: Platform) -> Self {
        Self {
            platform,
            retailer: platform.retailer_name().to_string(),
            title: NO_MATCH_TITLE.to_string(),
            price: "Not Available".to_string(),
            original_price: None,
            category: String::new(),
            image: PLACEHOLDER_IMAGE.to_string(),
            features: Vec::new(),
            rating: String::new(),
            reviews: String::new(),
            discount: String::new(),
            url: String::new(),
            matched: false,
        }
    }
}

/// Full comparison for one request: always exactly three slots, source
/// marketplace first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub product_name: String,
    pub source_platform: Platform,
    pub search_query: String,
    pub source: ProductRecord,
    pub comparison: Vec<PlatformOffer>,
    pub generated_at: DateTime<Utc>,
}

fn usable_image(image: &str) -> String {
    if image.starts_with("http") {
        image.to_string()
    } else {
        PLACEHOLDER_IMAGE.to_string()
    }
}

/// Percentage discount string when both prices parse and the original is
/// higher, else empty.
fn derive_discount(price: &str, original_price: Option<&str>) -> String {
    let Some(original_price) = original_price else {
        return String::new();
    };
    match (
        clean::parse_price_number(price),
        clean::parse_price_number(original_price),
    ) {
        (Some(current), Some(original)) if original > current && original > 0.0 => {
            let percent = ((1.0 - current / original) * 100.0).round() as i64;
            format!("{percent}% off")
        }
        _ => String::new(),
    }
}

// -------------------------------------------------------------------------
// tests
// -------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn record() -> ProductRecord {
        ProductRecord {
            platform: Platform::Flipkart,
            title: "Nova Aura Smartwatch".to_string(),
            brand: "Nova".to_string(),
            price: "\u{20b9}3499".to_string(),
            original_price: Some("\u{20b9}6999".to_string()),
            image: "https://rukminim2.flixcart.com/nova.jpg".to_string(),
            category: "Wearables".to_string(),
            features: vec!["AMOLED display".to_string()],
            rating: "4.3".to_string(),
            reviews: "12480".to_string(),
            url: "https://www.flipkart.com/nova/p/itm1".to_string(),
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn source_slot_carries_record_fields_and_discount() {
        let offer = PlatformOffer::from_record(&record());
        assert_eq!(offer.retailer, "Flipkart");
        assert_eq!(offer.discount, "50% off");
        assert!(offer.matched);
    }

    #[test]
    fn no_match_slot_uses_sentinels() {
        let offer = PlatformOffer::no_match(Platform::Myntra);
        assert_eq!(offer.title, NO_MATCH_TITLE);
        assert_eq!(offer.image, PLACEHOLDER_IMAGE);
        assert!(offer.url.is_empty());
        assert!(!offer.matched);
    }

    #[test]
    fn relative_or_missing_images_fall_back_to_placeholder() {
        let mut source = record();
        source.image = "/images/x.jpg".to_string();
        assert_eq!(PlatformOffer::from_record(&source).image, PLACEHOLDER_IMAGE);
        source.image = String::new();
        assert_eq!(PlatformOffer::from_record(&source).image, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn discount_requires_a_higher_parseable_original() {
        assert_eq!(derive_discount("\u{20b9}900", Some("\u{20b9}1000")), "10% off");
        assert_eq!(derive_discount("\u{20b9}1000", Some("\u{20b9}900")), "");
        assert_eq!(derive_discount("N/A", Some("\u{20b9}900")), "");
        assert_eq!(derive_discount("\u{20b9}900", None), "");
    }

    #[test]
    fn serialized_offer_uses_camel_case_and_skips_empty_optionals() {
        let offer = PlatformOffer::no_match(Platform::Amazon);
        let json = serde_json::to_value(&offer).unwrap();
        assert_eq!(json["title"], "No Match Found");
        assert_eq!(json["platform"], "amazon");
        assert!(json.get("originalPrice").is_none());
        assert!(json.get("rating").is_none());
    }
}
