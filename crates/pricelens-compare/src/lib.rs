//! Cross-marketplace comparison: query synthesis, candidate matching, and
//! the orchestration that turns one product URL into a three-way price
//! comparison.

pub mod engine;
pub mod error;
pub mod matcher;
pub mod output;
pub mod query;
pub mod similarity;

pub use engine::ComparisonEngine;
pub use error::CompareError;
pub use matcher::{find_best_match, MatchWeights};
pub use output::{ComparisonReport, PlatformOffer};
pub use query::synthesize_query;
pub use similarity::jaccard_similarity;
