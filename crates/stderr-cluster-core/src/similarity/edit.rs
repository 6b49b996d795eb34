//! Normalized Levenshtein similarity.

use super::matrix::{build_symmetric, SimilarityMatrix};
use super::{PairwiseSimilarity, SimilarityMetric};
use crate::error::ClusterResult;

/// `1 - levenshtein(a, b) / max(len(a), len(b))`, lengths in characters.
///
/// Two empty strings are identical (1.0); an empty string against a
/// non-empty one scores 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistanceSimilarity;

impl EditDistanceSimilarity {
    /// Create a new EditDistanceSimilarity.
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Similarity of a single pair.
    pub fn pair(a: &str, b: &str) -> f32 {
        let longest = a.chars().count().max(b.chars().count());
        if longest == 0 {
            return 1.0;
        }
        let distance = strsim::levenshtein(a, b);
        (1.0 - distance as f64 / longest as f64) as f32
    }
}

impl PairwiseSimilarity for EditDistanceSimilarity {
    fn metric(&self) -> SimilarityMetric {
        SimilarityMetric::EditDistance
    }

    fn compute(&self, texts: &[&str]) -> ClusterResult<SimilarityMatrix> {
        build_symmetric(texts.len(), 1.0, |i, j| Self::pair(texts[i], texts[j]))
    }
}
