//! Comparison orchestration: classify, extract the source, search the other
//! marketplaces, pick matches, and normalize into three fixed slots.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pricelens_core::{classify_platform, AppConfig, Platform};
use pricelens_scraper::{build_extractors, MarketplaceExtractor, ScrapeConfig, SessionProvider};
use tracing::{info, warn};

use crate::error::CompareError;
use crate::matcher::{find_best_match, MatchWeights};
use crate::output::{ComparisonReport, PlatformOffer};
use crate::query::synthesize_query;

pub struct ComparisonEngine {
    extractors: HashMap<Platform, Arc<dyn MarketplaceExtractor>>,
    weights: MatchWeights,
    /// Inclusive jitter window slept before each secondary search, in
    /// milliseconds.
    search_delay_ms: (u64, u64),
}

impl ComparisonEngine {
    #[must_use]
    pub fn new(
        extractors: HashMap<Platform, Arc<dyn MarketplaceExtractor>>,
        weights: MatchWeights,
        search_delay_ms: (u64, u64),
    ) -> Self {
        Self {
            extractors,
            weights,
            search_delay_ms,
        }
    }

    /// Engine with the standard extractor set over the given session
    /// provider.
    #[must_use]
    pub fn from_provider(provider: Arc<dyn SessionProvider>, config: &AppConfig) -> Self {
        let scrape_config = ScrapeConfig::from_app_config(config);
        Self::new(
            build_extractors(provider, &scrape_config),
            MatchWeights::default(),
            (config.search_delay_min_ms, config.search_delay_max_ms),
        )
    }

    /// Runs a full comparison for one product URL.
    ///
    /// Source extraction failures are fatal. Failures on a secondary
    /// marketplace only empty that marketplace's slot; the report always
    /// carries exactly three slots, source first.
    pub async fn compare(&self, url: &str) -> Result<ComparisonReport, CompareError> {
        let source_platform =
            classify_platform(url).ok_or_else(|| CompareError::UnsupportedPlatform {
                url: url.to_string(),
            })?;
        let extractor = self
            .extractors
            .get(&source_platform)
            .ok_or_else(|| CompareError::UnsupportedPlatform {
                url: url.to_string(),
            })?;

        info!(url, platform = source_platform.as_str(), "starting comparison");
        let source = extractor.extract_product(url).await?;
        let query = synthesize_query(&source.title, &source.brand);
        if query.is_empty() {
            warn!(title = %source.title, "query synthesis produced nothing, skipping searches");
        } else {
            info!(query, "synthesized search query");
        }

        let mut comparison = vec![PlatformOffer::from_record(&source)];
        for platform in source_platform.others() {
            if query.is_empty() {
                comparison.push(PlatformOffer::no_match(platform));
                continue;
            }
            self.inter_search_delay().await;
            comparison.push(self.search_one(platform, &source, &query).await);
        }

        Ok(ComparisonReport {
            product_name: source.title.clone(),
            source_platform,
            search_query: query,
            source,
            comparison,
            generated_at: Utc::now(),
        })
    }

    async fn search_one(
        &self,
        platform: Platform,
        source: &pricelens_core::ProductRecord,
        query: &str,
    ) -> PlatformOffer {
        let Some(extractor) = self.extractors.get(&platform) else {
            return PlatformOffer::no_match(platform);
        };
        match extractor.search_candidates(query).await {
            Ok(candidates) => {
                match find_best_match(source, &candidates, &self.weights) {
                    Some(best) => {
                        info!(
                            platform = platform.as_str(),
                            title = %best.title,
                            "accepted match"
                        );
                        PlatformOffer::from_candidate(platform, best)
                    }
                    None => {
                        info!(
                            platform = platform.as_str(),
                            candidates = candidates.len(),
                            "no candidate cleared the match threshold"
                        );
                        PlatformOffer::no_match(platform)
                    }
                }
            }
            Err(err) => {
                warn!(platform = platform.as_str(), error = %err, "search failed");
                PlatformOffer::no_match(platform)
            }
        }
    }

    /// Politeness pause between secondary searches.
    async fn inter_search_delay(&self) {
        let (min, max) = self.search_delay_ms;
        if max == 0 {
            return;
        }
        let delay = {
            let mut rng = rand::rng();
            rand::Rng::random_range(&mut rng, min..=max)
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

// -------------------------------------------------------------------------
// tests
// -------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use pricelens_core::{ProductRecord, SearchCandidate};
    use pricelens_scraper::ExtractError;

    use super::*;
    use crate::output::NO_MATCH_TITLE;

    struct StubExtractor {
        platform: Platform,
        record: Option<ProductRecord>,
        search: Result<Vec<SearchCandidate>, ()>,
        extract_calls: AtomicU32,
        search_calls: AtomicU32,
    }

    impl StubExtractor {
        fn new(platform: Platform) -> Self {
            Self {
                platform,
                record: None,
                search: Ok(Vec::new()),
                extract_calls: AtomicU32::new(0),
                search_calls: AtomicU32::new(0),
            }
        }

        fn with_record(mut self, record: ProductRecord) -> Self {
            self.record = Some(record);
            self
        }

        fn with_candidates(mut self, candidates: Vec<SearchCandidate>) -> Self {
            self.search = Ok(candidates);
            self
        }

        fn failing_search(mut self) -> Self {
            self.search = Err(());
            self
        }
    }

    #[async_trait]
    impl MarketplaceExtractor for StubExtractor {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn extract_product(&self, _url: &str) -> Result<ProductRecord, ExtractError> {
            self.extract_calls.fetch_add(1, Ordering::SeqCst);
            self.record
                .clone()
                .ok_or(ExtractError::ExtractionIncomplete {
                    platform: self.platform,
                })
        }

        async fn search_candidates(
            &self,
            _query: &str,
        ) -> Result<Vec<SearchCandidate>, ExtractError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            match &self.search {
                Ok(candidates) => Ok(candidates.clone()),
                Err(()) => Err(ExtractError::BotDetection {
                    platform: self.platform,
                }),
            }
        }
    }

    fn record(platform: Platform, title: &str, brand: &str) -> ProductRecord {
        ProductRecord {
            platform,
            title: title.to_string(),
            brand: brand.to_string(),
            price: "\u{20b9}2499".to_string(),
            original_price: None,
            image: "https://img/x.jpg".to_string(),
            category: "General".to_string(),
            features: Vec::new(),
            rating: String::new(),
            reviews: String::new(),
            url: "https://www.amazon.in/dp/B0".to_string(),
            scraped_at: Utc::now(),
        }
    }

    fn candidate(title: &str) -> SearchCandidate {
        SearchCandidate {
            title: title.to_string(),
            price: "\u{20b9}2399".to_string(),
            image: "https://img/c.jpg".to_string(),
            link: "https://shop/c".to_string(),
        }
    }

    fn engine_with(stubs: Vec<Arc<StubExtractor>>) -> ComparisonEngine {
        let extractors = stubs
            .into_iter()
            .map(|stub| (stub.platform(), stub as Arc<dyn MarketplaceExtractor>))
            .collect();
        ComparisonEngine::new(extractors, MatchWeights::default(), (0, 0))
    }

    #[tokio::test]
    async fn unsupported_url_aborts_before_any_extraction() {
        let amazon = Arc::new(StubExtractor::new(Platform::Amazon));
        let engine = engine_with(vec![Arc::clone(&amazon)]);
        let err = engine.compare("https://example.com/p/1").await.unwrap_err();
        assert!(matches!(err, CompareError::UnsupportedPlatform { .. }));
        assert_eq!(amazon.extract_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn source_failure_is_fatal() {
        let amazon = Arc::new(StubExtractor::new(Platform::Amazon));
        let engine = engine_with(vec![
            amazon,
            Arc::new(StubExtractor::new(Platform::Flipkart)),
            Arc::new(StubExtractor::new(Platform::Myntra)),
        ]);
        let err = engine
            .compare("https://www.amazon.in/dp/B0")
            .await
            .unwrap_err();
        assert!(matches!(err, CompareError::SourceExtraction(_)));
    }

    #[tokio::test]
    async fn source_slot_comes_from_the_record_and_extraction_runs_once() {
        let amazon = Arc::new(
            StubExtractor::new(Platform::Amazon)
                .with_record(record(Platform::Amazon, "Acme Thunder Headphones", "Acme")),
        );
        let flipkart = Arc::new(
            StubExtractor::new(Platform::Flipkart)
                .with_candidates(vec![candidate("Acme Thunder Headphones")]),
        );
        let myntra = Arc::new(StubExtractor::new(Platform::Myntra));
        let engine = engine_with(vec![Arc::clone(&amazon), Arc::clone(&flipkart), Arc::clone(&myntra)]);

        let report = engine.compare("https://www.amazon.in/dp/B0").await.unwrap();

        assert_eq!(report.comparison.len(), 3);
        assert_eq!(report.comparison[0].platform, Platform::Amazon);
        assert_eq!(report.comparison[0].title, "Acme Thunder Headphones");
        assert_eq!(amazon.extract_calls.load(Ordering::SeqCst), 1);
        assert_eq!(amazon.search_calls.load(Ordering::SeqCst), 0);
        assert_eq!(flipkart.search_calls.load(Ordering::SeqCst), 1);
        assert_eq!(myntra.search_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn one_failing_marketplace_does_not_poison_the_other() {
        let flipkart = Arc::new(
            StubExtractor::new(Platform::Flipkart)
                .with_record(record(Platform::Flipkart, "Nova Aura Smartwatch", "Nova")),
        );
        let amazon = Arc::new(StubExtractor::new(Platform::Amazon).failing_search());
        let myntra = Arc::new(
            StubExtractor::new(Platform::Myntra)
                .with_candidates(vec![candidate("Nova Aura Smartwatch")]),
        );
        let engine = engine_with(vec![flipkart, amazon, Arc::clone(&myntra)]);

        let report = engine
            .compare("https://www.flipkart.com/nova/p/itm1")
            .await
            .unwrap();

        let amazon_slot = report
            .comparison
            .iter()
            .find(|slot| slot.platform == Platform::Amazon)
            .unwrap();
        assert_eq!(amazon_slot.title, NO_MATCH_TITLE);

        let myntra_slot = report
            .comparison
            .iter()
            .find(|slot| slot.platform == Platform::Myntra)
            .unwrap();
        assert_eq!(myntra_slot.title, "Nova Aura Smartwatch");
        assert_eq!(myntra.search_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_query_skips_both_searches() {
        // Title and brand dissolve entirely into stop words.
        let amazon = Arc::new(
            StubExtractor::new(Platform::Amazon)
                .with_record(record(Platform::Amazon, "New Best Premium", "")),
        );
        let flipkart = Arc::new(StubExtractor::new(Platform::Flipkart));
        let myntra = Arc::new(StubExtractor::new(Platform::Myntra));
        let engine = engine_with(vec![amazon, Arc::clone(&flipkart), Arc::clone(&myntra)]);

        let report = engine.compare("https://www.amazon.in/dp/B0").await.unwrap();

        assert_eq!(report.search_query, "");
        assert_eq!(flipkart.search_calls.load(Ordering::SeqCst), 0);
        assert_eq!(myntra.search_calls.load(Ordering::SeqCst), 0);
        assert!(report.comparison[1..]
            .iter()
            .all(|slot| slot.title == NO_MATCH_TITLE));
    }

    #[tokio::test]
    async fn below_threshold_candidates_become_no_match() {
        let amazon = Arc::new(
            StubExtractor::new(Platform::Amazon)
                .with_record(record(Platform::Amazon, "Acme Thunder Headphones", "Acme")),
        );
        let flipkart = Arc::new(
            StubExtractor::new(Platform::Flipkart)
                .with_candidates(vec![candidate("Stainless Steel Water Bottle")]),
        );
        let myntra = Arc::new(StubExtractor::new(Platform::Myntra));
        let engine = engine_with(vec![amazon, flipkart, myntra]);

        let report = engine.compare("https://www.amazon.in/dp/B0").await.unwrap();
        let flipkart_slot = report
            .comparison
            .iter()
            .find(|slot| slot.platform == Platform::Flipkart)
            .unwrap();
        assert_eq!(flipkart_slot.title, NO_MATCH_TITLE);
    }
}
