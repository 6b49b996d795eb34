//! Embedding-based similarity via Relaxed Word Mover's Distance.
//!
//! Each message becomes a normalized bag of words (nBOW) over its content
//! tokens, each token mapped to a vector by a [`TokenEmbedder`]. The distance
//! between two messages is the relaxed transport cost
//!
//! ```text
//! rwmd(A, B) = Σ_i  w_i · min_j ‖a_i − b_j‖
//! dist(A, B) = max(rwmd(A, B), rwmd(B, A))
//! sim(A, B)  = 1 / (1 + dist(A, B))
//! ```
//!
//! which lower-bounds the exact Word Mover's Distance without solving a
//! transport problem. The diagonal is fixed at 1.0. A message with no
//! embeddable tokens is infinitely far from everything else (similarity 0.0).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

use super::matrix::{build_symmetric, SimilarityMatrix};
use super::{MetricInput, PairwiseSimilarity, SimilarityMetric};
use crate::error::{ClusterError, ClusterResult};
use crate::normalize::content_tokens;

/// Default dimension of [`HashedEmbedder`] vectors.
pub const DEFAULT_HASHED_DIMENSION: usize = 64;

// =============================================================================
// TokenEmbedder
// =============================================================================

/// Maps a token to a fixed-size vector.
pub trait TokenEmbedder: Send + Sync + fmt::Debug {
    /// Length of every vector returned by [`TokenEmbedder::embed`].
    fn dimension(&self) -> usize;

    /// Vector for `token`, or `None` if the token is out of vocabulary.
    fn embed(&self, token: &str) -> Option<Vec<f32>>;
}

/// Deterministic pseudo-embedding seeded by a SHA-256 of the token.
///
/// Each token gets a unit vector drawn from a ChaCha stream. Equal tokens map
/// to equal vectors; distinct tokens are nearly orthogonal. Used when no
/// pretrained vectors are configured.
#[derive(Debug, Clone)]
pub struct HashedEmbedder {
    dimension: usize,
}

impl HashedEmbedder {
    /// Create an embedder producing `dimension`-sized vectors.
    ///
    /// # Errors
    ///
    /// `ClusterError::InvalidParameter` if `dimension == 0`.
    pub fn new(dimension: usize) -> ClusterResult<Self> {
        if dimension == 0 {
            return Err(ClusterError::invalid_parameter(
                "embedding dimension must be > 0",
            ));
        }
        Ok(Self { dimension })
    }
}

impl Default for HashedEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_HASHED_DIMENSION,
        }
    }
}

impl TokenEmbedder for HashedEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, token: &str) -> Option<Vec<f32>> {
        let digest = Sha256::digest(token.as_bytes());
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&digest);
        let mut rng = ChaCha8Rng::from_seed(seed);
        let raw: Vec<f32> = (0..self.dimension)
            .map(|_| rng.gen_range(-1.0f32..1.0))
            .collect();
        let norm = raw.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            return Some(raw);
        }
        Some(raw.into_iter().map(|v| v / norm).collect())
    }
}

/// Word vectors loaded from a GloVe / word2vec text file.
///
/// Each line is `token v1 v2 ... vd`. A leading `count dim` header line, as
/// written by word2vec, is skipped.
#[derive(Debug, Clone, Default)]
pub struct PretrainedEmbedder {
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl PretrainedEmbedder {
    /// Load vectors from a file.
    ///
    /// # Errors
    ///
    /// - `ClusterError::Io` if the file cannot be read
    /// - `ClusterError::Embedding` on malformed lines or inconsistent dimensions
    pub fn from_path(path: impl AsRef<Path>) -> ClusterResult<Self> {
        let file = File::open(path.as_ref())?;
        let embedder = Self::from_reader(BufReader::new(file))?;
        tracing::info!(
            path = %path.as_ref().display(),
            tokens = embedder.len(),
            dimension = embedder.dimension,
            "loaded pretrained token vectors"
        );
        Ok(embedder)
    }

    /// Load vectors from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> ClusterResult<Self> {
        let mut dimension = 0usize;
        let mut vectors = HashMap::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let Some(token) = fields.next() else {
                continue;
            };
            let rest: Vec<&str> = fields.collect();

            if line_no == 0 && rest.len() == 1 && token.parse::<usize>().is_ok() {
                continue;
            }

            let values = rest
                .iter()
                .map(|v| v.parse::<f32>())
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|e| {
                    ClusterError::Embedding(format!("line {}: {}", line_no + 1, e))
                })?;

            if values.is_empty() {
                return Err(ClusterError::Embedding(format!(
                    "line {}: token '{}' has no vector",
                    line_no + 1,
                    token
                )));
            }
            if dimension == 0 {
                dimension = values.len();
            } else if values.len() != dimension {
                return Err(ClusterError::Embedding(format!(
                    "line {}: expected {} values, got {}",
                    line_no + 1,
                    dimension,
                    values.len()
                )));
            }
            vectors.insert(token.to_lowercase(), values);
        }

        Ok(Self { dimension, vectors })
    }

    /// Number of tokens with a vector.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether no vectors were loaded.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl TokenEmbedder for PretrainedEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, token: &str) -> Option<Vec<f32>> {
        self.vectors.get(token).cloned()
    }
}

// =============================================================================
// EmbeddingDistanceSimilarity
// =============================================================================

/// A message as weighted token vectors.
#[derive(Debug, Clone)]
struct WeightedBag {
    vectors: Vec<Vec<f32>>,
    weights: Vec<f32>,
}

impl WeightedBag {
    fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// `1 / (1 + rwmd)` similarity over raw message text.
///
/// Scores normally fall in `(0, 1]`. A message with no embeddable tokens
/// deliberately scores exactly 0.0 against every other message, which is
/// outside that range. With `eps < 1.0` such a message is noise unless
/// `min_points` is 1.
#[derive(Debug, Clone)]
pub struct EmbeddingDistanceSimilarity {
    embedder: Arc<dyn TokenEmbedder>,
}

impl EmbeddingDistanceSimilarity {
    /// Use the given token embedder.
    pub fn new(embedder: Arc<dyn TokenEmbedder>) -> Self {
        Self { embedder }
    }

    fn bag(&self, text: &str) -> WeightedBag {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for token in content_tokens(text) {
            *counts.entry(token).or_insert(0) += 1;
        }

        let mut vectors = Vec::with_capacity(counts.len());
        let mut weights = Vec::with_capacity(counts.len());
        for (token, count) in counts {
            if let Some(vector) = self.embedder.embed(&token) {
                vectors.push(vector);
                weights.push(count as f32);
            }
        }

        let total: f32 = weights.iter().sum();
        if total > 0.0 {
            weights.iter_mut().for_each(|w| *w /= total);
        }
        WeightedBag { vectors, weights }
    }

    fn euclidean(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt()
    }

    fn relaxed_cost(from: &WeightedBag, to: &WeightedBag) -> f32 {
        from.vectors
            .iter()
            .zip(&from.weights)
            .map(|(a, &w)| {
                let nearest = to
                    .vectors
                    .iter()
                    .map(|b| Self::euclidean(a, b))
                    .fold(f32::INFINITY, f32::min);
                w * nearest
            })
            .sum()
    }

    /// Symmetric relaxed WMD between two bags.
    fn distance(a: &WeightedBag, b: &WeightedBag) -> f32 {
        if a.is_empty() || b.is_empty() {
            return f32::INFINITY;
        }
        Self::relaxed_cost(a, b).max(Self::relaxed_cost(b, a))
    }

    /// Similarity of a single pair of raw messages.
    pub fn pair(&self, a: &str, b: &str) -> f32 {
        1.0 / (1.0 + Self::distance(&self.bag(a), &self.bag(b)))
    }
}

impl Default for EmbeddingDistanceSimilarity {
    fn default() -> Self {
        Self::new(Arc::new(HashedEmbedder::default()))
    }
}

impl PairwiseSimilarity for EmbeddingDistanceSimilarity {
    fn metric(&self) -> SimilarityMetric {
        SimilarityMetric::EmbeddingDistance
    }

    fn input(&self) -> MetricInput {
        MetricInput::Raw
    }

    fn compute(&self, texts: &[&str]) -> ClusterResult<SimilarityMatrix> {
        let bags: Vec<WeightedBag> = texts.iter().map(|t| self.bag(t)).collect();
        let unembeddable = bags.iter().filter(|b| b.is_empty()).count();
        if unembeddable > 0 {
            tracing::warn!(
                unembeddable,
                batch = texts.len(),
                "messages without embeddable tokens get similarity 0"
            );
        }
        build_symmetric(bags.len(), 1.0, |i, j| {
            1.0 / (1.0 + Self::distance(&bags[i], &bags[j]))
        })
    }
}
