//! Pairwise similarity and distance matrices.
//!
//! Matrices are square and symmetric by construction: only the strict upper
//! triangle is computed (in parallel, one row per task), then mirrored.
//!
//! ```text
//!        j=0   j=1   j=2
//! i=0  [ 1.0 | s01 | s02 ]     computed: s01, s02, s12
//! i=1  [ s01 | 1.0 | s12 ]     mirrored: lower triangle
//! i=2  [ s02 | s12 | 1.0 ]     diagonal: metric self-similarity
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, ClusterResult};

// =============================================================================
// SimilarityMatrix
// =============================================================================

/// Square symmetric matrix of pairwise similarities for one batch.
///
/// Deserialization goes through [`SimilarityMatrix::from_rows`], so a
/// decoded matrix satisfies the same shape, finiteness and symmetry checks
/// as one built in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SimilarityRows")]
pub struct SimilarityMatrix {
    /// Row-major similarities, `similarities[i][j] == similarities[j][i]`.
    similarities: Vec<Vec<f32>>,
}

/// Unchecked wire form of [`SimilarityMatrix`].
#[derive(Deserialize)]
struct SimilarityRows {
    similarities: Vec<Vec<f32>>,
}

impl TryFrom<SimilarityRows> for SimilarityMatrix {
    type Error = ClusterError;

    fn try_from(rows: SimilarityRows) -> ClusterResult<Self> {
        Self::from_rows(rows.similarities)
    }
}

impl SimilarityMatrix {
    /// Build from explicit rows.
    ///
    /// # Errors
    ///
    /// - `ClusterError::DimensionMismatch` if any row length differs from the row count
    /// - `ClusterError::NonFiniteSimilarity` if any value is NaN or infinite
    /// - `ClusterError::InvalidParameter` if the rows are not symmetric
    pub fn from_rows(similarities: Vec<Vec<f32>>) -> ClusterResult<Self> {
        let n = similarities.len();
        for (i, row) in similarities.iter().enumerate() {
            if row.len() != n {
                return Err(ClusterError::DimensionMismatch {
                    expected: n,
                    actual: row.len(),
                });
            }
            for (j, &value) in row.iter().enumerate() {
                if !value.is_finite() {
                    return Err(ClusterError::NonFiniteSimilarity { i, j, value });
                }
            }
        }
        let matrix = Self { similarities };
        if !matrix.is_symmetric() {
            return Err(ClusterError::invalid_parameter(
                "similarity matrix must be symmetric",
            ));
        }
        Ok(matrix)
    }

    /// Number of records covered by the matrix.
    #[inline]
    pub fn size(&self) -> usize {
        self.similarities.len()
    }

    /// Check if matrix is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.similarities.is_empty()
    }

    /// Similarity between records `i` and `j`, if both are in range.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        self.similarities.get(i).and_then(|row| row.get(j).copied())
    }

    /// Row `i` of the matrix.
    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.similarities[i]
    }

    /// All rows.
    #[inline]
    pub fn rows(&self) -> &[Vec<f32>] {
        &self.similarities
    }

    /// Exact symmetry check.
    pub fn is_symmetric(&self) -> bool {
        let n = self.size();
        (0..n).all(|i| ((i + 1)..n).all(|j| self.similarities[i][j] == self.similarities[j][i]))
    }

    /// Convert to a distance matrix: `max(1 - similarity, 0)`.
    #[must_use]
    pub fn to_distance_matrix(&self) -> DistanceMatrix {
        let distances = self
            .similarities
            .par_iter()
            .map(|row| row.iter().map(|s| (1.0 - s).max(0.0)).collect())
            .collect();
        DistanceMatrix { distances }
    }

    /// Statistics over the strict upper triangle.
    #[must_use]
    pub fn stats(&self) -> SimilarityStats {
        let n = self.size();
        if n < 2 {
            return SimilarityStats::default();
        }

        let values: Vec<f32> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| self.similarities[i][j])
            .collect();

        let count = values.len() as f64;
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / count;
        let variance = values
            .iter()
            .map(|&v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / count;

        SimilarityStats {
            min,
            max,
            mean: mean as f32,
            std_dev: variance.sqrt() as f32,
            pair_count: values.len(),
        }
    }
}

/// Statistics about a similarity distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityStats {
    /// Minimum off-diagonal similarity.
    pub min: f32,
    /// Maximum off-diagonal similarity.
    pub max: f32,
    /// Mean off-diagonal similarity.
    pub mean: f32,
    /// Standard deviation.
    pub std_dev: f32,
    /// Number of distinct pairs.
    pub pair_count: usize,
}

// =============================================================================
// DistanceMatrix
// =============================================================================

/// Non-negative pairwise distances derived from a [`SimilarityMatrix`].
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    distances: Vec<Vec<f32>>,
}

impl DistanceMatrix {
    /// Number of records covered by the matrix.
    #[inline]
    pub fn size(&self) -> usize {
        self.distances.len()
    }

    /// Check if matrix is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Distance between records `i` and `j`. Panics if out of range.
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f32 {
        self.distances[i][j]
    }

    /// Distance between records `i` and `j`, if both are in range.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        self.distances.get(i).and_then(|row| row.get(j).copied())
    }

    /// Indices within `eps` of record `i`, including `i` itself, ascending.
    pub fn neighbors(&self, i: usize, eps: f32) -> Vec<usize> {
        self.distances[i]
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d <= eps)
            .map(|(j, _)| j)
            .collect()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Build a symmetric matrix from a pairwise function.
///
/// `pair(i, j)` is only called for `i < j`; the diagonal is set to `diagonal`.
/// Rows of the upper triangle are computed in parallel.
///
/// # Errors
///
/// `ClusterError::NonFiniteSimilarity` if `pair` returns NaN or infinity.
pub fn build_symmetric<F>(n: usize, diagonal: f32, pair: F) -> ClusterResult<SimilarityMatrix>
where
    F: Fn(usize, usize) -> f32 + Sync,
{
    let upper: Vec<Vec<f32>> = (0..n)
        .into_par_iter()
        .map(|i| ((i + 1)..n).map(|j| pair(i, j)).collect())
        .collect();

    let mut similarities = vec![vec![0.0f32; n]; n];
    for (i, row) in upper.into_iter().enumerate() {
        similarities[i][i] = diagonal;
        for (offset, value) in row.into_iter().enumerate() {
            let j = i + 1 + offset;
            if !value.is_finite() {
                return Err(ClusterError::NonFiniteSimilarity { i, j, value });
            }
            similarities[i][j] = value;
            similarities[j][i] = value;
        }
    }

    Ok(SimilarityMatrix { similarities })
}
