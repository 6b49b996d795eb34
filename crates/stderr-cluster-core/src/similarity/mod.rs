//! Pairwise similarity over a batch of failure messages.
//!
//! Every metric implements [`PairwiseSimilarity`] and produces a
//! [`SimilarityMatrix`]; downstream clustering and summarization depend only
//! on the matrix, never on the metric that built it.
//!
//! | Metric                | Input      | Range  |
//! |-----------------------|------------|--------|
//! | `EditDistance`        | normalized | [0, 1] |
//! | `TokenSetOverlap`     | normalized | [0, 1] |
//! | `TermWeightedCosine`  | normalized | [0, 1] |
//! | `EmbeddingDistance`   | raw        | [0, 1] |
//!
//! # Example
//!
//! ```
//! use stderr_cluster_core::similarity::SimilarityMetric;
//!
//! let engine = SimilarityMetric::TokenSetOverlap.engine();
//! let matrix = engine.compute(&["a b", "a c"]).unwrap();
//! assert!((matrix.get(0, 1).unwrap() - 1.0 / 3.0).abs() < 1e-6);
//! ```

mod edit;
mod embedding;
mod matrix;
mod tfidf;
mod token_set;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, ClusterResult};
use crate::types::ErrorRecord;

pub use edit::EditDistanceSimilarity;
pub use embedding::{
    EmbeddingDistanceSimilarity, HashedEmbedder, PretrainedEmbedder, TokenEmbedder,
    DEFAULT_HASHED_DIMENSION,
};
pub use matrix::{build_symmetric, DistanceMatrix, SimilarityMatrix, SimilarityStats};
pub use tfidf::{TfIdfSimilarity, MIN_TERM_CHARS};
pub use token_set::TokenSetSimilarity;

// =============================================================================
// SimilarityMetric
// =============================================================================

/// Available similarity metrics.
///
/// Parses case-insensitively from its snake_case name or a common alias
/// (`levenshtein`, `jaccard`, `tfidf`, `wmd`, `embedding`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum SimilarityMetric {
    /// Normalized Levenshtein similarity.
    #[default]
    EditDistance,
    /// Jaccard overlap of token sets.
    TokenSetOverlap,
    /// Cosine of TF-IDF vectors.
    TermWeightedCosine,
    /// `1 / (1 + distance)` over token embeddings.
    EmbeddingDistance,
}

impl SimilarityMetric {
    /// All metrics, in declaration order.
    pub const ALL: [SimilarityMetric; 4] = [
        Self::EditDistance,
        Self::TokenSetOverlap,
        Self::TermWeightedCosine,
        Self::EmbeddingDistance,
    ];

    /// Canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EditDistance => "edit_distance",
            Self::TokenSetOverlap => "token_set_overlap",
            Self::TermWeightedCosine => "term_weighted_cosine",
            Self::EmbeddingDistance => "embedding_distance",
        }
    }

    /// Which text field of a record this metric reads.
    pub fn input(&self) -> MetricInput {
        match self {
            Self::EmbeddingDistance => MetricInput::Raw,
            _ => MetricInput::Normalized,
        }
    }

    /// Default engine for this metric.
    ///
    /// `EmbeddingDistance` uses a [`HashedEmbedder`]; construct
    /// [`EmbeddingDistanceSimilarity`] directly to use pretrained vectors.
    pub fn engine(&self) -> Box<dyn PairwiseSimilarity> {
        match self {
            Self::EditDistance => Box::new(EditDistanceSimilarity::new()),
            Self::TokenSetOverlap => Box::new(TokenSetSimilarity::new()),
            Self::TermWeightedCosine => Box::new(TfIdfSimilarity::new()),
            Self::EmbeddingDistance => Box::<EmbeddingDistanceSimilarity>::default(),
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityMetric {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "edit_distance" | "editdistance" | "levenshtein" => Ok(Self::EditDistance),
            "token_set_overlap" | "tokensetoverlap" | "jaccard" => Ok(Self::TokenSetOverlap),
            "term_weighted_cosine" | "termweightedcosine" | "tfidf" | "tf_idf" => {
                Ok(Self::TermWeightedCosine)
            }
            "embedding_distance" | "embeddingdistance" | "wmd" | "embedding" => {
                Ok(Self::EmbeddingDistance)
            }
            _ => Err(ClusterError::unknown_metric(s)),
        }
    }
}

impl TryFrom<String> for SimilarityMetric {
    type Error = ClusterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Text field a metric consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricInput {
    /// `ErrorRecord::normalized_text`.
    Normalized,
    /// `ErrorRecord::raw_text`.
    Raw,
}

// =============================================================================
// PairwiseSimilarity
// =============================================================================

/// A similarity metric over a batch of texts.
///
/// Implementations must return a square symmetric matrix whose diagonal is
/// the metric's self-similarity. [`build_symmetric`] guarantees both.
pub trait PairwiseSimilarity: Send + Sync + fmt::Debug {
    /// The metric this engine implements.
    fn metric(&self) -> SimilarityMetric;

    /// Which text field of a record this engine reads.
    fn input(&self) -> MetricInput {
        MetricInput::Normalized
    }

    /// Compute the similarity matrix for `texts`.
    fn compute(&self, texts: &[&str]) -> ClusterResult<SimilarityMatrix>;

    /// Compute the similarity matrix for records, selecting the text field
    /// given by [`PairwiseSimilarity::input`].
    fn compute_records(&self, records: &[ErrorRecord]) -> ClusterResult<SimilarityMatrix> {
        let input = self.input();
        let texts: Vec<&str> = records
            .iter()
            .map(|r| match input {
                MetricInput::Normalized => r.normalized_text.as_str(),
                MetricInput::Raw => r.raw_text.as_str(),
            })
            .collect();

        tracing::debug!(
            metric = %self.metric(),
            batch = texts.len(),
            "computing similarity matrix"
        );
        let matrix = self.compute(&texts)?;
        tracing::debug!(stats = ?matrix.stats(), "similarity matrix ready");
        Ok(matrix)
    }
}
