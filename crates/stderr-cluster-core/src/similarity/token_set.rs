//! Jaccard overlap of token sets.

use std::collections::HashSet;

use super::matrix::{build_symmetric, SimilarityMatrix};
use super::{PairwiseSimilarity, SimilarityMetric};
use crate::error::ClusterResult;

/// `|A ∩ B| / |A ∪ B|` over whitespace-separated tokens.
///
/// Two empty token sets are identical (1.0).
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSetSimilarity;

impl TokenSetSimilarity {
    /// Create a new TokenSetSimilarity.
    #[inline]
    pub fn new() -> Self {
        Self
    }

    fn token_set(text: &str) -> HashSet<&str> {
        text.split_whitespace().collect()
    }

    fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f32 {
        let union = a.union(b).count();
        if union == 0 {
            return 1.0;
        }
        let intersection = a.intersection(b).count();
        (intersection as f64 / union as f64) as f32
    }

    /// Similarity of a single pair.
    pub fn pair(a: &str, b: &str) -> f32 {
        Self::jaccard(&Self::token_set(a), &Self::token_set(b))
    }
}

impl PairwiseSimilarity for TokenSetSimilarity {
    fn metric(&self) -> SimilarityMetric {
        SimilarityMetric::TokenSetOverlap
    }

    fn compute(&self, texts: &[&str]) -> ClusterResult<SimilarityMatrix> {
        let sets: Vec<HashSet<&str>> = texts.iter().map(|t| Self::token_set(t)).collect();
        build_symmetric(sets.len(), 1.0, |i, j| Self::jaccard(&sets[i], &sets[j]))
    }
}
