//! Myntra product and search extraction.
//!
//! Myntra splits the product name across a brand heading and a name heading,
//! renders prices inside free text, and serves gallery images as CSS
//! `background-image` rules. Search URLs are hyphenated path segments rather
//! than query parameters.

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::Utc;
use pricelens_core::{Platform, ProductRecord, SearchCandidate};
use regex::Regex;
use tracing::{debug, warn};

static BACKGROUND_IMAGE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(["']?([^"')]+)["']?\)"#).expect("valid regex"));

use crate::clean;
use crate::error::ExtractError;
use crate::session::{ScrapeConfig, SessionProvider};
use crate::snapshot::Snapshot;

use super::{fetch_page, validate_product_url, MarketplaceExtractor};

const SEARCH_BASE: &str = "https://www.myntra.com/search/";

const BRAND_SELECTOR: &str = "h1.pdp-title";
const NAME_SELECTOR: &str = "h1.pdp-name";

const PRICE_SELECTORS: &[&str] = &["span.pdp-price strong", "span.pdp-price"];
const ORIGINAL_PRICE_SELECTORS: &[&str] = &["span.pdp-mrp s", "span.pdp-mrp"];

const GALLERY_SELECTOR: &str = "div.image-grid-image";
const IMAGE_SELECTORS: &[&str] = &["img.img-responsive"];

const BREADCRUMB_SELECTOR: &str = "a.breadcrumbs-link";

const DESCRIPTION_SELECTORS: &[&str] = &["div.pdp-product-description-content"];

const RESULT_CONTAINER_SELECTOR: &str = "ul.results-base";
const RESULT_CARD_SELECTOR: &str = "li.product-base";

const BOT_SIGNATURES: &[&str] = &["verify you are human", "security check"];

const NO_RESULT_SIGNATURE: &str = "we couldn't find any matches!";

pub struct MyntraExtractor {
    provider: Arc<dyn SessionProvider>,
    config: ScrapeConfig,
}

impl MyntraExtractor {
    #[must_use]
    pub fn new(provider: Arc<dyn SessionProvider>, config: ScrapeConfig) -> Self {
        Self { provider, config }
    }

    /// Lowercased, hyphen-joined search path segment.
    #[must_use]
    pub fn search_segment(query: &str) -> String {
        let cleaned: String = query
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
            .collect();
        cleaned
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase()
    }

    fn bot_check(&self, snap: &Snapshot) -> Result<(), ExtractError> {
        let body = snap.body_text_lower();
        if BOT_SIGNATURES.iter().any(|sig| body.contains(sig)) {
            return Err(ExtractError::BotDetection {
                platform: Platform::Myntra,
            });
        }
        Ok(())
    }

    fn parse_product(&self, html: &str, url: &str) -> Result<ProductRecord, ExtractError> {
        let snap = Snapshot::parse(html, Some(url));
        self.bot_check(&snap)?;
        if snap.body_text_lower().contains("page not found") {
            return Err(ExtractError::ProductUnavailable {
                platform: Platform::Myntra,
            });
        }

        let brand = snap
            .first_text(&[BRAND_SELECTOR])
            .map(|b| clean::collapse_whitespace(&b))
            .unwrap_or_default();
        let name = snap
            .first_text(&[NAME_SELECTOR])
            .map(|n| clean::collapse_whitespace(&n));

        let title = match (&brand[..], name) {
            ("", None) => {
                return Err(ExtractError::PageStructureChanged {
                    platform: Platform::Myntra,
                    context: "product title".to_string(),
                })
            }
            ("", Some(name)) => name,
            (brand, None) => brand.to_string(),
            (brand, Some(name)) => format!("{brand} {name}"),
        };
        let title = clean::truncate_title(&title, self.config.max_title_len);

        let record = ProductRecord {
            platform: Platform::Myntra,
            title: title.clone(),
            brand: if brand.is_empty() {
                clean::brand_from_title(&title)
            } else {
                brand
            },
            price: snap
                .first_text(PRICE_SELECTORS)
                .map(|raw| clean::normalize_price(&raw, &self.config.currency_fallback))
                .unwrap_or_else(|| "N/A".to_string()),
            original_price: snap
                .first_text(ORIGINAL_PRICE_SELECTORS)
                .map(|raw| clean::normalize_price(&raw, &self.config.currency_fallback))
                .filter(|p| p != "N/A"),
            image: self.extract_image(&snap),
            category: self.extract_category(&snap),
            features: snap
                .first_text(DESCRIPTION_SELECTORS)
                .map(|text| clean::filter_features(clean::split_description(&text), 10, 250, 7))
                .unwrap_or_default(),
            rating: snap
                .first_text(&["div.index-overallRating > div"])
                .map(|r| clean::collapse_whitespace(&r))
                .unwrap_or_default(),
            reviews: snap
                .first_text(&["div.index-ratingsCount"])
                .map(|r| clean::digits_only(&r))
                .unwrap_or_default(),
            url: url.to_string(),
            scraped_at: Utc::now(),
        };

        if !record.is_identifiable() {
            return Err(ExtractError::ExtractionIncomplete {
                platform: Platform::Myntra,
            });
        }
        Ok(record)
    }

    /// Gallery tiles carry the image as an inline `background-image` rule.
    fn extract_image(&self, snap: &Snapshot) -> String {
        if let Some(style) = snap.first_attr(&[GALLERY_SELECTOR], "style") {
            if let Some(captures) = BACKGROUND_IMAGE_URL.captures(&style) {
                if let Some(url) = snap.resolve(&captures[1]) {
                    return url;
                }
            }
        }
        snap.first_attr(IMAGE_SELECTORS, "src")
            .and_then(|src| snap.resolve(&src))
            .or_else(|| snap.meta_content(r#"meta[property="og:image"]"#))
            .unwrap_or_default()
    }

    fn extract_category(&self, snap: &Snapshot) -> String {
        let crumbs: Vec<String> = snap
            .texts(BREADCRUMB_SELECTOR)
            .into_iter()
            .map(|c| clean::collapse_whitespace(&c))
            .filter(|c| !c.is_empty() && c.as_str() != "Home")
            .collect();
        crumbs
            .last()
            .cloned()
            .unwrap_or_else(|| "General".to_string())
    }

    fn parse_search(
        &self,
        html: &str,
        search_url: &str,
    ) -> Result<Vec<SearchCandidate>, ExtractError> {
        let snap = Snapshot::parse(html, Some(search_url));
        self.bot_check(&snap)?;

        if snap.body_text_lower().contains(NO_RESULT_SIGNATURE) {
            return Ok(Vec::new());
        }

        let mut candidates = Vec::new();
        for card in snap.fragments(RESULT_CARD_SELECTOR) {
            let brand = card.first_text(&["h3.product-brand"]).unwrap_or_default();
            let Some(name) = card.first_text(&["h4.product-product"]) else {
                continue;
            };
            let title = clean::collapse_whitespace(&format!("{brand} {name}"));
            let candidate = SearchCandidate {
                title: clean::truncate_title(&title, 50),
                price: card
                    .first_text(&["span.product-discountedPrice", "div.product-price span"])
                    .map(|raw| clean::normalize_price(&raw, &self.config.currency_fallback))
                    .unwrap_or_else(|| "N/A".to_string()),
                image: card
                    .first_attr(&["img.img-responsive"], "src")
                    .or_else(|| {
                        card.first_attr(&["picture source"], "srcset")
                            .map(|srcset| first_srcset_url(&srcset))
                    })
                    .and_then(|src| snap.resolve(&src))
                    .unwrap_or_default(),
                // Card hrefs are site-root relative without a leading slash.
                link: card
                    .first_attr(&["a"], "href")
                    .and_then(|href| {
                        if href.starts_with("http") {
                            Some(href)
                        } else {
                            snap.resolve(&format!("/{}", href.trim_start_matches('/')))
                        }
                    })
                    .unwrap_or_default(),
            };
            if candidate.is_complete() {
                candidates.push(candidate);
            }
            if candidates.len() == self.config.max_candidates {
                break;
            }
        }
        if candidates.is_empty() {
            warn!(search_url, "myntra search produced no usable candidates");
        }
        Ok(candidates)
    }
}

fn first_srcset_url(srcset: &str) -> String {
    srcset
        .split(',')
        .next()
        .and_then(|entry| entry.split_whitespace().next())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl MarketplaceExtractor for MyntraExtractor {
    fn platform(&self) -> Platform {
        Platform::Myntra
    }

    async fn extract_product(&self, url: &str) -> Result<ProductRecord, ExtractError> {
        validate_product_url(url, Platform::Myntra)?;
        debug!(url, "extracting myntra product");
        let html = fetch_page(
            self.provider.as_ref(),
            &self.config,
            url,
            &[BRAND_SELECTOR, NAME_SELECTOR],
        )
        .await?;
        self.parse_product(&html, url)
    }

    async fn search_candidates(&self, query: &str) -> Result<Vec<SearchCandidate>, ExtractError> {
        let url = format!("{SEARCH_BASE}{}", Self::search_segment(query));
        debug!(url, "searching myntra");
        let html = fetch_page(
            self.provider.as_ref(),
            &self.config,
            &url,
            &[RESULT_CARD_SELECTOR, RESULT_CONTAINER_SELECTOR],
        )
        .await?;
        self.parse_search(&html, &url)
    }
}

// -------------------------------------------------------------------------
// tests
// -------------------------------------------------------------------------
