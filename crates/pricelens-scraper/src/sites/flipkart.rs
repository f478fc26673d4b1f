//! Flipkart product and search extraction.
//!
//! Flipkart ships obfuscated class names that rotate between frontend
//! releases, so every selector table carries both the legacy and the current
//! generation. Product titles bake variant noise into suffixes, which gets
//! trimmed before the record is built.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use pricelens_core::{Platform, ProductRecord, SearchCandidate};
use tracing::{debug, warn};

use crate::clean;
use crate::error::ExtractError;
use crate::session::{ScrapeConfig, SessionProvider};
use crate::snapshot::Snapshot;

use super::{fetch_page, validate_product_url, MarketplaceExtractor};

const SEARCH_BASE: &str = "https://www.flipkart.com/search?q=";

const TITLE_SELECTORS: &[&str] = &[
    "span.B_NuCI",
    "h1.yhB1nd span.B_NuCI",
    "h1._6EBuvT span.VU-ZEz",
    "span.VU-ZEz",
];

const PRICE_SELECTORS: &[&str] = &[
    "div._30jeq3._16Jk6d",
    "div._30jeq3",
    "div.Nx9bqj.CxhGGd",
    "div.Nx9bqj",
];

const ORIGINAL_PRICE_SELECTORS: &[&str] = &[
    "div._3I9_wc._2p6lqe",
    "div._3I9_wc",
    "div.yRaY8j.A6\\+E6v",
    "div.yRaY8j",
];

const IMAGE_SELECTORS: &[&str] = &[
    "img._396cs4",
    "img._2r_T1I",
    "img.DByuf4",
    "img._53J4C-",
];

const BREADCRUMB_SELECTORS: &[&str] = &["div._1MR4o5 a", "a._2whKao", "div.r2CdBx a"];

const FEATURE_SELECTORS: &[&str] = &["li._21Ahn-", "li._7eSDEz"];

const DESCRIPTION_SELECTORS: &[&str] = &["div._1mXcCf", "div.yN\\+eNk"];

const RESULT_CARD_SELECTORS: &str = "div._1AtVbE, div._75nlfW";

const CARD_TITLE_SELECTORS: &[&str] = &[
    "div._4rR01T",
    "a.s1Q9rs",
    "a.IRpwTa",
    "div.KzDlHZ",
    "a.wjcEIp",
];

const CARD_LINK_SELECTORS: &[&str] = &[
    "a._1fQZEK",
    "a.s1Q9rs",
    "a.IRpwTa",
    "a.CGtC98",
    "a.wjcEIp",
];

const BOT_SIGNATURES: &[&str] = &["are you a human?"];

const ERROR_SIGNATURES: &[&str] = &["something went wrong", "err=404", "request timed out"];

const NO_RESULT_SIGNATURES: &[&str] = &["no results found for", "couldn't find any products"];

pub struct FlipkartExtractor {
    provider: Arc<dyn SessionProvider>,
    config: ScrapeConfig,
}

impl FlipkartExtractor {
    #[must_use]
    pub fn new(provider: Arc<dyn SessionProvider>, config: ScrapeConfig) -> Self {
        Self { provider, config }
    }

    fn bot_check(&self, snap: &Snapshot) -> Result<(), ExtractError> {
        let body = snap.body_text_lower();
        if BOT_SIGNATURES.iter().any(|sig| body.contains(sig)) {
            return Err(ExtractError::BotDetection {
                platform: Platform::Flipkart,
            });
        }
        Ok(())
    }

    /// Flipkart titles carry variant and seller noise after a dash, an
    /// opening parenthesis, or a colon. Keep the head.
    fn tidy_title(&self, raw: &str) -> String {
        let head = raw
            .split(" - ")
            .next()
            .and_then(|s| s.split('(').next())
            .and_then(|s| s.split(':').next())
            .unwrap_or(raw)
            .trim();
        clean::truncate_title(&clean::collapse_whitespace(head), self.config.max_title_len)
    }

    fn parse_product(&self, html: &str, url: &str) -> Result<ProductRecord, ExtractError> {
        let snap = Snapshot::parse(html, Some(url));
        self.bot_check(&snap)?;
        let body = snap.body_text_lower();
        if ERROR_SIGNATURES.iter().any(|sig| body.contains(sig)) || url.contains("err=404") {
            return Err(ExtractError::ProductUnavailable {
                platform: Platform::Flipkart,
            });
        }

        let title = snap
            .first_text(TITLE_SELECTORS)
            .map(|raw| self.tidy_title(&raw))
            .ok_or_else(|| ExtractError::PageStructureChanged {
                platform: Platform::Flipkart,
                context: "product title".to_string(),
            })?;

        let price = snap
            .first_text_excluding_anchors(PRICE_SELECTORS)
            .or_else(|| snap.meta_content(r#"meta[property="product:price:amount"]"#))
            .map(|raw| clean::normalize_price(&raw, &self.config.currency_fallback))
            .unwrap_or_else(|| "N/A".to_string());
        let original_price = snap
            .first_text(ORIGINAL_PRICE_SELECTORS)
            .map(|raw| clean::normalize_price(&raw, &self.config.currency_fallback))
            .filter(|p| p != "N/A" && *p != price);

        let breadcrumbs = snap.first_text(BREADCRUMB_SELECTORS);
        let record = ProductRecord {
            platform: Platform::Flipkart,
            title: title.clone(),
            brand: clean::brand_from_title(&title),
            price,
            original_price,
            image: snap
                .first_attr(IMAGE_SELECTORS, "src")
                .and_then(|src| snap.resolve(&src))
                .or_else(|| snap.meta_content(r#"meta[property="og:image"]"#))
                .unwrap_or_default(),
            category: breadcrumbs
                .map(|c| clean::collapse_whitespace(&c))
                .filter(|c| !c.is_empty() && c.as_str() != "Home")
                .unwrap_or_else(|| "General".to_string()),
            features: self.extract_features(&snap),
            rating: snap
                .first_text(&["div._3LWZlK", "div.XQDdHH"])
                .map(|r| clean::collapse_whitespace(&r))
                .unwrap_or_default(),
            reviews: snap
                .first_text(&["span._2_R_DZ", "span.Wphh3N"])
                .map(|r| clean::collapse_whitespace(&r))
                .unwrap_or_default(),
            url: url.to_string(),
            scraped_at: Utc::now(),
        };

        if !record.is_identifiable() {
            return Err(ExtractError::ExtractionIncomplete {
                platform: Platform::Flipkart,
            });
        }
        Ok(record)
    }

    fn extract_features(&self, snap: &Snapshot) -> Vec<String> {
        for selector in FEATURE_SELECTORS {
            let features = clean::filter_features(snap.texts(selector), 10, 250, 7);
            if !features.is_empty() {
                return features;
            }
        }
        snap.first_text(DESCRIPTION_SELECTORS)
            .map(|text| clean::filter_features(clean::split_description(&text), 10, 250, 7))
            .unwrap_or_default()
    }

    fn parse_search(
        &self,
        html: &str,
        search_url: &str,
    ) -> Result<Vec<SearchCandidate>, ExtractError> {
        let snap = Snapshot::parse(html, Some(search_url));
        self.bot_check(&snap)?;

        let body = snap.body_text_lower();
        if NO_RESULT_SIGNATURES.iter().any(|sig| body.contains(sig)) {
            return Ok(Vec::new());
        }

        let mut candidates = Vec::new();
        for card in snap.fragments(RESULT_CARD_SELECTORS) {
            let Some(title) = card.first_text(CARD_TITLE_SELECTORS) else {
                continue;
            };
            let candidate = SearchCandidate {
                title: clean::truncate_title(&clean::collapse_whitespace(&title), 50),
                price: card
                    .first_text_excluding_anchors(PRICE_SELECTORS)
                    .map(|raw| clean::normalize_price(&raw, &self.config.currency_fallback))
                    .unwrap_or_else(|| "N/A".to_string()),
                image: card
                    .first_attr(IMAGE_SELECTORS, "src")
                    .and_then(|src| snap.resolve(&src))
                    .unwrap_or_default(),
                link: card
                    .first_attr(CARD_LINK_SELECTORS, "href")
                    .and_then(|href| snap.resolve(&href))
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
            warn!(search_url, "flipkart search produced no usable candidates");
        }
        Ok(candidates)
    }
}

#[async_trait]
impl MarketplaceExtractor for FlipkartExtractor {
    fn platform(&self) -> Platform {
        Platform::Flipkart
    }

    async fn extract_product(&self, url: &str) -> Result<ProductRecord, ExtractError> {
        validate_product_url(url, Platform::Flipkart)?;
        debug!(url, "extracting flipkart product");
        let html = fetch_page(self.provider.as_ref(), &self.config, url, TITLE_SELECTORS).await?;
        self.parse_product(&html, url)
    }

    async fn search_candidates(&self, query: &str) -> Result<Vec<SearchCandidate>, ExtractError> {
        let url = format!("{SEARCH_BASE}{}", utf8_percent_encode(query, NON_ALPHANUMERIC));
        debug!(url, "searching flipkart");
        let html = fetch_page(
            self.provider.as_ref(),
            &self.config,
            &url,
            &["div._1YokD2._3Mn1Gg", "div.DOjaWF.gdgoEp", RESULT_CARD_SELECTORS],
        )
        .await?;
        self.parse_search(&html, &url)
    }
}

// -------------------------------------------------------------------------
// tests
// -------------------------------------------------------------------------
