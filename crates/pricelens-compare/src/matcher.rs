//! Candidate scoring and best-match selection.

use pricelens_core::{ProductRecord, SearchCandidate};
use pricelens_scraper::clean;

use crate::similarity::jaccard_similarity;

/// Scoring weights for [`find_best_match`]. The defaults weight title
/// similarity heaviest, with smaller brand and price-proximity components.
#[derive(Debug, Clone, Copy)]
pub struct MatchWeights {
    pub title: f64,
    pub brand_in_title: f64,
    pub brand_similarity: f64,
    pub price_close: f64,
    pub price_near: f64,
    /// Scores at or below this are rejected as "no match".
    pub acceptance_threshold: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            title: 0.6,
            brand_in_title: 0.2,
            brand_similarity: 0.2,
            price_close: 0.1,
            price_near: 0.05,
            acceptance_threshold: 0.4,
        }
    }
}

/// Component breakdown for one scored candidate.
#[derive(Debug, Clone, Copy)]
pub struct MatchScore {
    pub title_similarity: f64,
    pub brand_bonus: f64,
    pub brand_similarity: f64,
    pub price_proximity_bonus: f64,
}

impl MatchScore {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.title_similarity + self.brand_bonus + self.brand_similarity
            + self.price_proximity_bonus
    }
}

/// Scores one candidate against the source record.
#[must_use]
pub fn score_candidate(
    source: &ProductRecord,
    candidate: &SearchCandidate,
    weights: &MatchWeights,
) -> MatchScore {
    let source_title = source.title.to_lowercase();
    let source_brand = source.brand.trim().to_lowercase();
    let candidate_title = candidate.title.to_lowercase();
    // Search cards carry no brand field; the first title token stands in.
    let candidate_brand = candidate_title
        .split_whitespace()
        .next()
        .unwrap_or_default();

    let title_similarity =
        jaccard_similarity(&source_title, &candidate_title) * weights.title;

    let mut brand_bonus = 0.0;
    let mut brand_similarity = 0.0;
    if !source_brand.is_empty() {
        if candidate_title.contains(&source_brand) {
            brand_bonus = weights.brand_in_title;
        }
        brand_similarity =
            jaccard_similarity(&source_brand, candidate_brand) * weights.brand_similarity;
    }

    let price_proximity_bonus = match (
        clean::parse_price_number(&source.price),
        clean::parse_price_number(&candidate.price),
    ) {
        (Some(source_price), Some(candidate_price)) if source_price > 0.0 => {
            let diff = (source_price - candidate_price).abs() / source_price;
            if diff < 0.3 {
                weights.price_close
            } else if diff < 0.5 {
                weights.price_near
            } else {
                0.0
            }
        }
        _ => 0.0,
    };

    MatchScore {
        title_similarity,
        brand_bonus,
        brand_similarity,
        price_proximity_bonus,
    }
}

/// Picks the best-scoring candidate, or `None` when nothing clears the
/// acceptance threshold. On equal scores the earliest candidate wins.
#[must_use]
pub fn find_best_match<'a>(
    source: &ProductRecord,
    candidates: &'a [SearchCandidate],
    weights: &MatchWeights,
) -> Option<&'a SearchCandidate> {
    let mut best: Option<(&SearchCandidate, f64)> = None;
    for candidate in candidates {
        if candidate.title.trim().is_empty() {
            continue;
        }
        let total = score_candidate(source, candidate, weights).total();
        match best {
            Some((_, best_total)) if total <= best_total => {}
            _ => best = Some((candidate, total)),
        }
    }
    best.filter(|(_, total)| *total > weights.acceptance_threshold)
        .map(|(candidate, _)| candidate)
}

// -------------------------------------------------------------------------
// tests
// -------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pricelens_core::Platform;

    use super::*;

    fn source(title: &str, brand: &str, price: &str) -> ProductRecord {
        ProductRecord {
            platform: Platform::Amazon,
            title: title.to_string(),
            brand: brand.to_string(),
            price: price.to_string(),
            original_price: None,
            image: String::new(),
            category: "General".to_string(),
            features: Vec::new(),
            rating: String::new(),
            reviews: String::new(),
            url: "https://www.amazon.in/dp/B0".to_string(),
            scraped_at: Utc::now(),
        }
    }

    fn candidate(title: &str, price: &str) -> SearchCandidate {
        SearchCandidate {
            title: title.to_string(),
            price: price.to_string(),
            image: "https://img/x.jpg".to_string(),
            link: "https://shop/x".to_string(),
        }
    }

    #[test]
    fn same_product_scores_above_threshold() {
        let source = source("Acme Thunder Wireless Headphones", "Acme", "\u{20b9}2499");
        let candidates = vec![candidate("Acme Thunder Wireless Headphones", "\u{20b9}2399")];
        let best = find_best_match(&source, &candidates, &MatchWeights::default());
        assert!(best.is_some());
    }

    #[test]
    fn reordered_marketplace_phrasing_still_matches() {
        let source = source("Levis Men Slim Fit Casual Shirt", "Levis", "\u{20b9}1499");
        let candidates = vec![
            candidate("Roadster Men Printed Round Neck T-shirt", "\u{20b9}499"),
            candidate("Levis Slim Fit Shirt Men Casual", "\u{20b9}1599"),
        ];
        let best = find_best_match(&source, &candidates, &MatchWeights::default()).unwrap();
        assert!(std::ptr::eq(best, &candidates[1]));
    }

    #[test]
    fn unrelated_products_are_rejected() {
        let source = source("Acme Thunder Wireless Headphones", "Acme", "\u{20b9}2499");
        let candidates = vec![candidate("Stainless Steel Water Bottle 1L", "\u{20b9}399")];
        assert!(find_best_match(&source, &candidates, &MatchWeights::default()).is_none());
    }

    #[test]
    fn empty_candidate_list_is_no_match() {
        let source = source("Acme Thunder", "Acme", "\u{20b9}2499");
        assert!(find_best_match(&source, &[], &MatchWeights::default()).is_none());
    }

    #[test]
    fn first_candidate_wins_ties() {
        let source = source("Acme Thunder Headphones", "Acme", "\u{20b9}2499");
        let candidates = vec![
            candidate("Acme Thunder Headphones", "\u{20b9}2499"),
            candidate("Acme Thunder Headphones", "\u{20b9}2499"),
        ];
        let best = find_best_match(&source, &candidates, &MatchWeights::default()).unwrap();
        assert!(std::ptr::eq(best, &candidates[0]));
    }

    #[test]
    fn price_proximity_adds_graded_bonus() {
        let weights = MatchWeights::default();
        let source = source("Acme Thunder", "Acme", "\u{20b9}1000");

        let close = score_candidate(&source, &candidate("Acme Thunder", "\u{20b9}1100"), &weights);
        assert!((close.price_proximity_bonus - 0.1).abs() < 1e-9);

        let near = score_candidate(&source, &candidate("Acme Thunder", "\u{20b9}1400"), &weights);
        assert!((near.price_proximity_bonus - 0.05).abs() < 1e-9);

        let far = score_candidate(&source, &candidate("Acme Thunder", "\u{20b9}9000"), &weights);
        assert!(far.price_proximity_bonus.abs() < 1e-9);

        let unparseable = score_candidate(&source, &candidate("Acme Thunder", "N/A"), &weights);
        assert!(unparseable.price_proximity_bonus.abs() < 1e-9);
    }

    #[test]
    fn brand_components_require_a_source_brand() {
        let weights = MatchWeights::default();
        let branded = source("Thunder Headphones", "Acme", "\u{20b9}999");
        let scored = score_candidate(&branded, &candidate("Acme Thunder Headphones", "N/A"), &weights);
        assert!((scored.brand_bonus - 0.2).abs() < 1e-9);
        assert!(scored.brand_similarity > 0.0);

        let unbranded = source("Thunder Headphones", "", "\u{20b9}999");
        let scored = score_candidate(&unbranded, &candidate("Acme Thunder Headphones", "N/A"), &weights);
        assert!(scored.brand_bonus.abs() < 1e-9);
        assert!(scored.brand_similarity.abs() < 1e-9);
    }

    #[test]
    fn perfect_match_total_is_capped_near_one() {
        let weights = MatchWeights::default();
        let source = source("Acme Thunder", "Acme", "\u{20b9}1000");
        let scored = score_candidate(&source, &candidate("Acme Thunder", "\u{20b9}1000"), &weights);
        assert!(scored.total() <= 1.1 + 1e-9);
        assert!(scored.total() > 0.9);
    }
}
