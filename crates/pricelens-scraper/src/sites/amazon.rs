//! Amazon product and search extraction.
//!
//! Amazon pages vary by category and A/B bucket, so every field is read
//! through a fallback chain of selectors observed in the wild. The main
//! image is picked from the `data-a-dynamic-image` JSON map when present,
//! which carries every resolution Amazon serves.

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use pricelens_core::{Platform, ProductRecord, SearchCandidate};
use regex::Regex;
use tracing::{debug, warn};

static BYLINE_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Visit the |Brand: | Store").expect("valid regex"));

use crate::clean;
use crate::error::ExtractError;
use crate::session::{ScrapeConfig, SessionProvider};
use crate::snapshot::Snapshot;

use super::{fetch_page, validate_product_url, MarketplaceExtractor};

const SEARCH_BASE: &str = "https://www.amazon.in/s?k=";

const TITLE_SELECTORS: &[&str] = &[
    "#productTitle",
    ".a-size-large.product-title-word-break",
    "h1.a-size-large",
    "span#title",
];

const PRICE_SELECTORS: &[&str] = &[
    ".a-price:not(.a-text-price) .a-offscreen",
    "#priceblock_ourprice",
    "#priceblock_dealprice",
];

const ORIGINAL_PRICE_SELECTORS: &[&str] = &[
    ".a-price.a-text-price .a-offscreen",
    "#priceblock_mrp",
    ".priceBlockStrikePriceString",
];

const IMAGE_SELECTORS: &[&str] = &["#landingImage", "#imgTagWrapperId img", "#main-image"];

const CATEGORY_SELECTORS: &[&str] = &[
    "#wayfinding-breadcrumbs_feature_div ul li:last-child a",
    "#nav-subnav a.nav-b",
];

const FEATURE_SELECTOR: &str = "#feature-bullets ul li span.a-list-item";

const RESULT_CARD_SELECTOR: &str = r#"div.s-main-slot div[data-component-type="s-search-result"]"#;

const BOT_SIGNATURES: &[&str] = &[
    "enter the characters you see below",
    "sorry, we just need to make sure you're not a robot",
    "api-services-support@amazon.com",
    "robot check",
];

const UNAVAILABLE_SIGNATURES: &[&str] = &[
    "currently unavailable",
    "we couldn't find that page",
    "looking for something?",
];

pub struct AmazonExtractor {
    provider: Arc<dyn SessionProvider>,
    config: ScrapeConfig,
}

impl AmazonExtractor {
    #[must_use]
    pub fn new(provider: Arc<dyn SessionProvider>, config: ScrapeConfig) -> Self {
        Self { provider, config }
    }

    fn bot_check(&self, snap: &Snapshot) -> Result<(), ExtractError> {
        let body = snap.body_text_lower();
        if BOT_SIGNATURES.iter().any(|sig| body.contains(sig)) {
            return Err(ExtractError::BotDetection {
                platform: Platform::Amazon,
            });
        }
        Ok(())
    }

    fn parse_product(&self, html: &str, url: &str) -> Result<ProductRecord, ExtractError> {
        let snap = Snapshot::parse(html, Some(url));
        self.bot_check(&snap)?;
        let body = snap.body_text_lower();
        if UNAVAILABLE_SIGNATURES.iter().any(|sig| body.contains(sig)) {
            return Err(ExtractError::ProductUnavailable {
                platform: Platform::Amazon,
            });
        }

        let title = snap
            .first_text(TITLE_SELECTORS)
            .map(|raw| {
                clean::truncate_title(
                    &clean::strip_store_prefix(&raw),
                    self.config.max_title_len,
                )
            })
            .ok_or_else(|| ExtractError::PageStructureChanged {
                platform: Platform::Amazon,
                context: "product title".to_string(),
            })?;

        let brand = self.extract_brand(&snap, &title);
        let symbol = self.page_currency_symbol(&snap);
        let price = snap
            .first_text(PRICE_SELECTORS)
            .map(|raw| clean::normalize_price(&raw, &symbol))
            .or_else(|| self.composed_price(&snap, &symbol))
            .unwrap_or_else(|| "N/A".to_string());
        let original_price = snap
            .first_text(ORIGINAL_PRICE_SELECTORS)
            .map(|raw| clean::normalize_price(&raw, &symbol))
            .filter(|p| p != "N/A" && *p != price);

        let record = ProductRecord {
            platform: Platform::Amazon,
            title,
            brand,
            price,
            original_price,
            image: self.extract_image(&snap),
            category: snap
                .first_text(CATEGORY_SELECTORS)
                .map(|c| clean::collapse_whitespace(&c))
                .unwrap_or_else(|| "General".to_string()),
            features: self.extract_features(&snap),
            rating: String::new(),
            reviews: String::new(),
            url: url.to_string(),
            scraped_at: Utc::now(),
        };

        if !record.is_identifiable() {
            return Err(ExtractError::ExtractionIncomplete {
                platform: Platform::Amazon,
            });
        }
        Ok(record)
    }

    /// Symbol the page itself displays next to prices, else the configured
    /// fallback.
    fn page_currency_symbol(&self, snap: &Snapshot) -> String {
        snap.first_text(&[".a-price-symbol"])
            .map(|s| clean::collapse_whitespace(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.config.currency_fallback.clone())
    }

    /// Amazon sometimes renders the price as separate whole and fraction
    /// spans with no offscreen copy.
    fn composed_price(&self, snap: &Snapshot, symbol: &str) -> Option<String> {
        let whole = snap.first_text(&[".a-price-whole"])?;
        let fraction = snap
            .first_text(&[".a-price-fraction"])
            .unwrap_or_else(|| "00".to_string());
        let raw = format!("{}.{}", clean::digits_only(&whole), clean::digits_only(&fraction));
        clean::parse_price_number(&raw).map(|value| clean::format_price(value, symbol))
    }

    fn extract_brand(&self, snap: &Snapshot, title: &str) -> String {
        if let Some(byline) = snap.first_text(&["#bylineInfo", "a#bylineInfo"]) {
            let brand = clean::collapse_whitespace(&BYLINE_NOISE.replace_all(&byline, ""));
            if !brand.is_empty() {
                return brand;
            }
        }
        clean::brand_from_title(title)
    }

    fn extract_image(&self, snap: &Snapshot) -> String {
        if let Some(map) = snap.first_attr(IMAGE_SELECTORS, "data-a-dynamic-image") {
            if let Some(url) = clean::largest_dynamic_image(&map) {
                return url;
            }
        }
        snap.first_attr(IMAGE_SELECTORS, "src")
            .and_then(|src| snap.resolve(&src))
            .or_else(|| snap.meta_content(r#"meta[property="og:image"]"#))
            .unwrap_or_default()
    }

    fn extract_features(&self, snap: &Snapshot) -> Vec<String> {
        let bullets = snap.texts(FEATURE_SELECTOR);
        let features = clean::filter_features(bullets, 10, 250, 7);
        if !features.is_empty() {
            return features;
        }
        snap.first_text(&["#productDescription p", "#productDescription"])
            .map(|text| clean::filter_features(clean::split_description(&text), 10, 250, 7))
            .unwrap_or_default()
    }

    fn parse_search(&self, html: &str, search_url: &str) -> Result<Vec<SearchCandidate>, ExtractError> {
        let snap = Snapshot::parse(html, Some(search_url));
        self.bot_check(&snap)?;

        if snap.body_text_lower().contains("no results for") {
            return Ok(Vec::new());
        }

        let symbol = self.page_currency_symbol(&snap);
        let mut candidates = Vec::new();
        for card in snap.fragments(RESULT_CARD_SELECTOR) {
            let Some(title) = card.first_text(&["h2 a span", "h2 span"]) else {
                continue;
            };
            let candidate = SearchCandidate {
                title: clean::truncate_title(&clean::collapse_whitespace(&title), 50),
                price: card
                    .first_text(&[".a-price .a-offscreen", ".a-price-whole"])
                    .map(|raw| clean::normalize_price(&raw, &symbol))
                    .unwrap_or_else(|| "N/A".to_string()),
                image: card
                    .first_attr(&["img.s-image"], "src")
                    .and_then(|src| snap.resolve(&src))
                    .unwrap_or_default(),
                link: card
                    .first_attr(&["h2 a", "a.a-link-normal"], "href")
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
            warn!(search_url, "amazon search produced no usable candidates");
        }
        Ok(candidates)
    }
}

#[async_trait]
impl MarketplaceExtractor for AmazonExtractor {
    fn platform(&self) -> Platform {
        Platform::Amazon
    }

    async fn extract_product(&self, url: &str) -> Result<ProductRecord, ExtractError> {
        validate_product_url(url, Platform::Amazon)?;
        debug!(url, "extracting amazon product");
        let html = fetch_page(self.provider.as_ref(), &self.config, url, TITLE_SELECTORS).await?;
        self.parse_product(&html, url)
    }

    async fn search_candidates(&self, query: &str) -> Result<Vec<SearchCandidate>, ExtractError> {
        let url = format!("{SEARCH_BASE}{}", utf8_percent_encode(query, NON_ALPHANUMERIC));
        debug!(url, "searching amazon");
        let html = fetch_page(
            self.provider.as_ref(),
            &self.config,
            &url,
            &[RESULT_CARD_SELECTOR, "div.s-main-slot"],
        )
        .await?;
        self.parse_search(&html, &url)
    }
}

// -------------------------------------------------------------------------
// tests
// -------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::MockProvider;

    fn extractor_with(html: &str) -> AmazonExtractor {
        AmazonExtractor::new(
            Arc::new(MockProvider::new(html)),
            ScrapeConfig::default().without_delays(),
        )
    }

    const PRODUCT_PAGE: &str = r##"
        <html><body>
            <span id="productTitle"> Visit the Acme Store Acme Thunder Wireless Headphones (Black, Over-Ear) </span>
            <div id="bylineInfo">Visit the Acme Store</div>
            <span class="a-price"><span class="a-offscreen">&#8377;2,499.00</span></span>
            <span class="a-price a-text-price"><span class="a-offscreen">&#8377;4,999.00</span></span>
            <img id="landingImage"
                 data-a-dynamic-image='{"https://img.amazon.in/a-small.jpg":[300,300],"https://img.amazon.in/a-big.jpg":[1500,1500]}'
                 src="https://img.amazon.in/a-small.jpg">
            <div id="wayfinding-breadcrumbs_feature_div"><ul>
                <li><a>Electronics</a></li><li><a>Headphones</a></li>
            </ul></div>
            <div id="feature-bullets"><ul>
                <li><span class="a-list-item">40 hour battery life on a single charge</span></li>
                <li><span class="a-list-item">Make sure this fits by entering your model number</span></li>
                <li><span class="a-list-item">Bluetooth 5.3 with dual device pairing</span></li>
            </ul></div>
        </body></html>
    "##;

    #[tokio::test]
    async fn extracts_full_product_record() {
        let extractor = extractor_with(PRODUCT_PAGE);
        let record = extractor
            .extract_product("https://www.amazon.in/dp/B0TEST123")
            .await
            .unwrap();

        assert_eq!(record.platform, Platform::Amazon);
        assert!(record.title.starts_with("Acme Thunder Wireless Headphones"));
        assert_eq!(record.brand, "Acme");
        assert_eq!(record.price, "\u{20b9}2499");
        assert_eq!(record.original_price.as_deref(), Some("\u{20b9}4999"));
        assert_eq!(record.image, "https://img.amazon.in/a-big.jpg");
        assert_eq!(record.category, "Headphones");
        assert_eq!(record.features.len(), 2);
        assert!(record.features[0].contains("battery"));
    }

    #[tokio::test]
    async fn composed_price_is_used_when_offscreen_is_missing() {
        let page = r#"<html><body>
            <span id="productTitle">Acme Kettle</span>
            <span class="a-price-whole">1,299</span><span class="a-price-fraction">00</span>
        </body></html>"#;
        let record = extractor_with(page)
            .extract_product("https://www.amazon.in/dp/B0TEST123")
            .await
            .unwrap();
        assert_eq!(record.price, "\u{20b9}1299");
    }

    #[tokio::test]
    async fn bot_challenge_is_reported_as_bot_detection() {
        let page = "<html><body><p>Sorry, we just need to make sure you're not a robot.</p></body></html>";
        let err = extractor_with(page)
            .extract_product("https://www.amazon.in/dp/B0TEST123")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::BotDetection { platform: Platform::Amazon }));
    }

    #[tokio::test]
    async fn unavailable_listing_is_reported() {
        let page = "<html><body><p>Currently unavailable.</p></body></html>";
        let err = extractor_with(page)
            .extract_product("https://www.amazon.in/dp/B0TEST123")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::ProductUnavailable { .. }));
    }

    #[tokio::test]
    async fn unrecognized_layout_is_structure_change() {
        let page = "<html><body><div>nothing familiar here</div></body></html>";
        let err = extractor_with(page)
            .extract_product("https://www.amazon.in/dp/B0TEST123")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::PageStructureChanged { .. }));
    }

    #[tokio::test]
    async fn wrong_marketplace_url_is_rejected_before_any_fetch() {
        let extractor = extractor_with("<html></html>");
        let err = extractor
            .extract_product("https://www.flipkart.com/p/x")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidUrl { .. }));
    }

    const SEARCH_PAGE: &str = r#"
        <html><body><div class="s-main-slot">
            <div data-component-type="s-search-result">
                <h2><a href="/dp/B0AAA"><span>Acme Thunder Wireless Headphones with a very long marketing suffix attached</span></a></h2>
                <span class="a-price"><span class="a-offscreen">&#8377;2,399</span></span>
                <img class="s-image" src="https://img.amazon.in/r1.jpg">
            </div>
            <div data-component-type="s-search-result">
                <h2><a href="/dp/B0BBB"><span>Acme Thunder Lite</span></a></h2>
                <img class="s-image" src="https://img.amazon.in/r2.jpg">
            </div>
        </div></body></html>
    "#;

    #[tokio::test]
    async fn search_returns_complete_cards_with_truncated_titles() {
        let extractor = extractor_with(SEARCH_PAGE);
        let candidates = extractor.search_candidates("acme thunder").await.unwrap();

        assert_eq!(candidates.len(), 2);
        let first = &candidates[0];
        assert!(first.title.ends_with("..."));
        assert!(first.title.chars().count() <= 53);
        assert_eq!(first.price, "\u{20b9}2399");
        assert_eq!(first.link, "https://www.amazon.in/dp/B0AAA");
    }

    #[tokio::test]
    async fn priceless_card_is_kept_with_placeholder_price() {
        let extractor = extractor_with(SEARCH_PAGE);
        let candidates = extractor.search_candidates("acme thunder").await.unwrap();

        // The second card has title and link but no price element on the
        // listing. It still reaches the matcher, which scores it without a
        // price proximity bonus.
        let second = &candidates[1];
        assert_eq!(second.title, "Acme Thunder Lite");
        assert_eq!(second.price, "N/A");
        assert_eq!(second.link, "https://www.amazon.in/dp/B0BBB");
    }

    #[tokio::test]
    async fn empty_search_page_yields_no_candidates() {
        let page = r#"<html><body><div class="s-main-slot">
            <span>No results for gibberish query.</span>
        </div></body></html>"#;
        let candidates = extractor_with(page)
            .search_candidates("gibberish query")
            .await
            .unwrap();
        assert!(candidates.is_empty());
    }
}
