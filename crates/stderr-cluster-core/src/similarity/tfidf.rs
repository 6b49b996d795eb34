//! TF-IDF weighted cosine similarity.
//!
//! Vectors are built over the vocabulary of the whole batch:
//!
//! ```text
//! tf(t, d)  = raw count of t in d
//! idf(t)    = ln((1 + n) / (1 + df(t))) + 1      (smoothed)
//! v(d)      = l2_normalize([tf(t, d) * idf(t) for t in vocabulary])
//! sim(a, b) = v(a) · v(b)
//! ```
//!
//! Only tokens of two or more characters enter the vocabulary. When the
//! vocabulary is empty every off-diagonal similarity is 0.0.

use std::collections::BTreeMap;

use super::matrix::{build_symmetric, SimilarityMatrix};
use super::{PairwiseSimilarity, SimilarityMetric};
use crate::error::ClusterResult;

/// Minimum characters for a token to count as a term.
pub const MIN_TERM_CHARS: usize = 2;

/// Sparse L2-normalized document vector, sorted by term index.
type SparseVector = Vec<(usize, f64)>;

/// Cosine similarity of TF-IDF vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfSimilarity;

impl TfIdfSimilarity {
    /// Create a new TfIdfSimilarity.
    #[inline]
    pub fn new() -> Self {
        Self
    }

    fn terms(text: &str) -> impl Iterator<Item = &str> {
        text.split_whitespace()
            .filter(|t| t.chars().count() >= MIN_TERM_CHARS)
    }

    /// Build the batch vocabulary (term -> column index, alphabetical).
    fn vocabulary(texts: &[&str]) -> BTreeMap<String, usize> {
        let mut terms: Vec<&str> = texts.iter().flat_map(|&t| Self::terms(t)).collect();
        terms.sort_unstable();
        terms.dedup();
        terms
            .into_iter()
            .enumerate()
            .map(|(index, term)| (term.to_string(), index))
            .collect()
    }

    fn vectorize(texts: &[&str], vocabulary: &BTreeMap<String, usize>) -> Vec<SparseVector> {
        let n_docs = texts.len() as f64;

        let counts: Vec<BTreeMap<usize, f64>> = texts
            .iter()
            .map(|text| {
                let mut tf = BTreeMap::new();
                for term in Self::terms(text) {
                    if let Some(&index) = vocabulary.get(term) {
                        *tf.entry(index).or_insert(0.0) += 1.0;
                    }
                }
                tf
            })
            .collect();

        let mut df = vec![0.0f64; vocabulary.len()];
        for tf in &counts {
            for &index in tf.keys() {
                df[index] += 1.0;
            }
        }
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n_docs) / (1.0 + d)).ln() + 1.0)
            .collect();

        counts
            .into_iter()
            .map(|tf| {
                let weighted: SparseVector =
                    tf.into_iter().map(|(index, c)| (index, c * idf[index])).collect();
                let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm == 0.0 {
                    return Vec::new();
                }
                weighted.into_iter().map(|(index, w)| (index, w / norm)).collect()
            })
            .collect()
    }

    fn cosine(a: &SparseVector, b: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut dot = 0.0f64;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dot += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        dot.clamp(0.0, 1.0) as f32
    }
}

impl PairwiseSimilarity for TfIdfSimilarity {
    fn metric(&self) -> SimilarityMetric {
        SimilarityMetric::TermWeightedCosine
    }

    fn compute(&self, texts: &[&str]) -> ClusterResult<SimilarityMatrix> {
        let vocabulary = Self::vocabulary(texts);
        if vocabulary.is_empty() {
            tracing::debug!(batch = texts.len(), "empty TF-IDF vocabulary");
            return build_symmetric(texts.len(), 1.0, |_, _| 0.0);
        }

        let vectors = Self::vectorize(texts, &vocabulary);
        build_symmetric(vectors.len(), 1.0, |i, j| Self::cosine(&vectors[i], &vectors[j]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_documents() {
        let m = TfIdfSimilarity::new()
            .compute(&["memory error", "memory error", "disk quota"])
            .expect("compute");
        assert!((m.get(0, 1).expect("cell") - 1.0).abs() < 1e-6);
        assert_eq!(m.get(0, 2), Some(0.0));
    }

    #[test]
    fn test_shared_rare_term_scores_higher_than_common_term() {
        // "error" appears everywhere, "quota" only in two documents
        let texts = [
            "error quota disk",
            "error quota user",
            "error memory killed",
            "error memory heap",
        ];
        let m = TfIdfSimilarity::new().compute(&texts).expect("compute");
        let rare = m.get(0, 1).expect("cell");
        let common = m.get(0, 2).expect("cell");
        assert!(rare > common, "rare={rare} common={common}");
        assert!(common > 0.0);
    }

    #[test]
    fn test_empty_vocabulary() {
        let m = TfIdfSimilarity::new().compute(&["", "a", "b c"]).expect("compute");
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(m.get(i, j), Some(expected));
            }
        }
    }

    #[test]
    fn test_empty_document_in_batch() {
        let m = TfIdfSimilarity::new().compute(&["", "memory error"]).expect("compute");
        assert_eq!(m.get(0, 0), Some(1.0));
        assert_eq!(m.get(0, 1), Some(0.0));
        assert!(m.is_symmetric());
    }

    #[test]
    fn test_known_value() {
        // n=2; idf(shared)=1, idf(unique)=ln(3/2)+1
        let m = TfIdfSimilarity::new()
            .compute(&["shared alpha", "shared beta"])
            .expect("compute");
        let u = (1.5f64).ln() + 1.0;
        let expected = 1.0 / (1.0 + u * u);
        let actual = f64::from(m.get(0, 1).expect("cell"));
        assert!((actual - expected).abs() < 1e-6, "expected {expected}, got {actual}");
        println!("[PASS] test_known_value - cos={actual:.6}");
    }
}
