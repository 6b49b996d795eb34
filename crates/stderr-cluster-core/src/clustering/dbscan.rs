//! Density-based clustering over a precomputed distance matrix.
//!
//! # Semantics
//!
//! - Neighbourhood of `i`: every `j` (including `i`) with `dist(i, j) <= eps`.
//! - Core point: neighbourhood size `>= min_points`.
//! - Clusters grow from core points in ascending index order. A border point
//!   reachable from several clusters keeps the label of the first cluster
//!   that reaches it.
//! - Points reachable from no core point are [`NOISE`].
//!
//! Core-point determination is parallel (rayon); cluster growth is
//! sequential over a single label array.

use std::collections::VecDeque;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, ClusterResult};
use crate::similarity::{DistanceMatrix, SimilarityMatrix};
use crate::types::{ClusterLabel, NOISE};

/// Default neighbour radius.
pub const DEFAULT_EPS: f32 = 0.2;

/// Default minimum neighbourhood size.
pub const DEFAULT_MIN_POINTS: usize = 3;

/// Parameters for density-based clustering.
///
/// # Example
///
/// ```
/// use stderr_cluster_core::clustering::DbscanParams;
///
/// let params = DbscanParams::default().with_eps(0.3);
/// assert!(params.validate().is_ok());
/// assert!(params.with_min_points(0).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DbscanParams {
    /// Maximum distance between neighbours. Must be finite and > 0.
    pub eps: f32,

    /// Minimum neighbourhood size (self included) for a core point.
    pub min_points: usize,
}

impl Default for DbscanParams {
    fn default() -> Self {
        Self {
            eps: DEFAULT_EPS,
            min_points: DEFAULT_MIN_POINTS,
        }
    }
}

impl DbscanParams {
    /// Create params with explicit values.
    pub fn new(eps: f32, min_points: usize) -> Self {
        Self { eps, min_points }
    }

    /// Set neighbour radius.
    ///
    /// Value is NOT automatically clamped - use validate() to check.
    #[must_use]
    pub fn with_eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    /// Set minimum neighbourhood size.
    ///
    /// Value is NOT automatically clamped - use validate() to check.
    #[must_use]
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Validate parameters.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidParameter` if:
    /// - eps is NaN, infinite or <= 0
    /// - min_points < 1
    pub fn validate(&self) -> ClusterResult<()> {
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(ClusterError::invalid_parameter(format!(
                "eps must be a finite value > 0, got {}",
                self.eps
            )));
        }

        if self.min_points < 1 {
            return Err(ClusterError::invalid_parameter(format!(
                "min_points must be >= 1, got {}",
                self.min_points
            )));
        }

        Ok(())
    }
}

/// Assign a cluster label to every row of `sim`.
///
/// Converts `sim` to distances (`max(1 - s, 0)`) and runs DBSCAN with the
/// given parameters. Labels are dense from 0 in order of discovery.
///
/// # Errors
///
/// `ClusterError::InvalidParameter` if `eps` or `min_points` are invalid;
/// checked before any computation, including for empty input.
///
/// # Example
///
/// ```
/// use stderr_cluster_core::clustering::assign_clusters;
/// use stderr_cluster_core::similarity::SimilarityMatrix;
///
/// let sim = SimilarityMatrix::from_rows(vec![
///     vec![1.0, 0.9, 0.0],
///     vec![0.9, 1.0, 0.0],
///     vec![0.0, 0.0, 1.0],
/// ]).unwrap();
/// assert_eq!(assign_clusters(&sim, 0.2, 2).unwrap(), vec![0, 0, -1]);
/// ```
pub fn assign_clusters(
    sim: &SimilarityMatrix,
    eps: f32,
    min_points: usize,
) -> ClusterResult<Vec<ClusterLabel>> {
    let params = DbscanParams::new(eps, min_points);
    params.validate()?;
    Ok(dbscan(&sim.to_distance_matrix(), &params))
}

/// Run DBSCAN on a distance matrix with already-validated parameters.
pub fn dbscan(dist: &DistanceMatrix, params: &DbscanParams) -> Vec<ClusterLabel> {
    let n = dist.size();
    if n == 0 {
        return Vec::new();
    }

    let neighborhoods: Vec<Vec<usize>> = (0..n)
        .into_par_iter()
        .map(|i| dist.neighbors(i, params.eps))
        .collect();
    let is_core: Vec<bool> = neighborhoods
        .iter()
        .map(|nb| nb.len() >= params.min_points)
        .collect();

    let mut labels = vec![NOISE; n];
    let mut next_label: ClusterLabel = 0;

    for seed in 0..n {
        if labels[seed] != NOISE || !is_core[seed] {
            continue;
        }

        let label = next_label;
        next_label += 1;
        labels[seed] = label;

        let mut frontier: VecDeque<usize> = VecDeque::from([seed]);
        while let Some(point) = frontier.pop_front() {
            for &neighbor in &neighborhoods[point] {
                if labels[neighbor] != NOISE {
                    continue;
                }
                labels[neighbor] = label;
                if is_core[neighbor] {
                    frontier.push_back(neighbor);
                }
            }
        }
    }

    let noise = labels.iter().filter(|&&l| l == NOISE).count();
    tracing::debug!(
        points = n,
        clusters = next_label,
        noise,
        eps = params.eps,
        min_points = params.min_points,
        "dbscan complete"
    );
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Block-diagonal similarity: `groups[k]` points with `within` similarity.
    fn blocks(groups: &[usize], within: f32) -> SimilarityMatrix {
        let n: usize = groups.iter().sum();
        let mut owner = Vec::with_capacity(n);
        for (g, &size) in groups.iter().enumerate() {
            owner.extend(std::iter::repeat(g).take(size));
        }
        let rows = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| {
                        if i == j {
                            1.0
                        } else if owner[i] == owner[j] {
                            within
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();
        SimilarityMatrix::from_rows(rows).expect("valid blocks")
    }

    // =========================================================================
    // PARAMETER VALIDATION
    // =========================================================================

    #[test]
    fn test_defaults() {
        let params = DbscanParams::default();
        assert_eq!(params.eps, 0.2);
        assert_eq!(params.min_points, 3);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_eps() {
        let sim = blocks(&[2], 1.0);
        for eps in [0.0, -0.1, f32::NAN, f32::INFINITY] {
            let err = assign_clusters(&sim, eps, 2).unwrap_err();
            assert!(matches!(err, ClusterError::InvalidParameter { .. }), "eps={eps}");
        }
    }

    #[test]
    fn test_rejects_zero_min_points_even_when_empty() {
        let empty = SimilarityMatrix::from_rows(Vec::new()).expect("empty");
        assert!(assign_clusters(&empty, 0.2, 0).is_err());
        assert_eq!(assign_clusters(&empty, 0.2, 3).expect("ok"), Vec::<ClusterLabel>::new());
    }

    // =========================================================================
    // EDGE CASES
    // =========================================================================

    #[test]
    fn test_single_point() {
        let sim = blocks(&[1], 1.0);
        assert_eq!(assign_clusters(&sim, 0.2, 2).unwrap(), vec![NOISE]);
        assert_eq!(assign_clusters(&sim, 0.2, 1).unwrap(), vec![0]);
    }

    #[test]
    fn test_point_counts_itself() {
        // two identical points form a cluster with min_points = 2
        let sim = blocks(&[2], 1.0);
        assert_eq!(assign_clusters(&sim, 0.2, 2).unwrap(), vec![0, 0]);
        assert_eq!(assign_clusters(&sim, 0.2, 3).unwrap(), vec![NOISE, NOISE]);
    }

    #[test]
    fn test_eps_boundary_is_inclusive() {
        let sim = SimilarityMatrix::from_rows(vec![vec![1.0, 0.75], vec![0.75, 1.0]]).unwrap();
        assert_eq!(assign_clusters(&sim, 0.25, 2).unwrap(), vec![0, 0]);
        assert_eq!(assign_clusters(&sim, 0.2, 2).unwrap(), vec![NOISE, NOISE]);
    }

    // =========================================================================
    // CLUSTER STRUCTURE
    // =========================================================================

    #[test]
    fn test_two_clusters_and_noise() {
        let sim = blocks(&[3, 1, 4], 0.9);
        let labels = assign_clusters(&sim, 0.2, 3).unwrap();
        assert_eq!(labels, vec![0, 0, 0, NOISE, 1, 1, 1, 1]);
        println!("[PASS] test_two_clusters_and_noise - labels={labels:?}");
    }

    #[test]
    fn test_chain_reachability() {
        // 0-1-2-3 chained at distance 0.05, ends not directly connected
        let mut rows = vec![vec![0.0f32; 4]; 4];
        for i in 0..4 {
            rows[i][i] = 1.0;
            if i + 1 < 4 {
                rows[i][i + 1] = 0.95;
                rows[i + 1][i] = 0.95;
            }
        }
        let sim = SimilarityMatrix::from_rows(rows).unwrap();
        // interior points have 3 neighbours (self + 2); ends have 2
        assert_eq!(assign_clusters(&sim, 0.1, 3).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_border_point_goes_to_first_cluster() {
        // 0,1,2 tight; 4,5,6 tight; 3 is a border point of both
        let n = 7;
        let mut rows = vec![vec![0.0f32; n]; n];
        for i in 0..n {
            rows[i][i] = 1.0;
        }
        let mut link = |a: usize, b: usize| {
            rows[a][b] = 0.95;
            rows[b][a] = 0.95;
        };
        for (a, b) in [(0, 1), (0, 2), (1, 2), (4, 5), (4, 6), (5, 6), (2, 3), (3, 4)] {
            link(a, b);
        }
        let sim = SimilarityMatrix::from_rows(rows).unwrap();
        // only 2 and 4 have four neighbours; 3 borders both and joins cluster 0
        let strict = assign_clusters(&sim, 0.1, 4).unwrap();
        assert_eq!(strict, vec![0, 0, 0, 0, 1, 1, 1]);

        // every point is core at 3 and the bridge merges both groups
        let loose = assign_clusters(&sim, 0.1, 3).unwrap();
        assert_eq!(loose, vec![0; 7]);
    }

    #[test]
    fn test_deterministic() {
        let sim = blocks(&[4, 2, 5, 1], 0.85);
        let a = assign_clusters(&sim, 0.2, 3).unwrap();
        let b = assign_clusters(&sim, 0.2, 3).unwrap();
        assert_eq!(a, b);
    }
}
