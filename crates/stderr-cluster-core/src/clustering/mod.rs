//! Cluster assignment over a similarity matrix.
//!
//! # Key Types
//!
//! - [`ClusterAlgorithm`]: density-based (default) or greedy leader grouping
//! - [`DbscanParams`]: `eps` / `min_points` for the density-based algorithm
//! - [`assign_clusters`]: DBSCAN over `max(1 - sim, 0)`
//! - [`leader_clusters`]: threshold grouping against each group's founder
//!
//! Neither algorithm looks at text; both depend only on the matrix.

mod dbscan;
mod leader;

use serde::{Deserialize, Serialize};

use crate::error::ClusterResult;
use crate::similarity::SimilarityMatrix;
use crate::types::ClusterLabel;

pub use dbscan::{assign_clusters, dbscan, DbscanParams, DEFAULT_EPS, DEFAULT_MIN_POINTS};
pub use leader::{leader_clusters, validate_cutoff, DEFAULT_LEADER_CUTOFF};

/// Clustering algorithm applied to the similarity matrix.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClusterAlgorithm {
    /// DBSCAN with the engine's `eps` and `min_points`.
    #[default]
    Dbscan,
    /// Greedy grouping: join the first group whose founder scores above `cutoff`.
    Leader {
        /// Similarity a record must strictly exceed to join a group.
        #[serde(default = "default_cutoff")]
        cutoff: f32,
    },
}

fn default_cutoff() -> f32 {
    DEFAULT_LEADER_CUTOFF
}

impl ClusterAlgorithm {
    /// Leader grouping with the production cutoff.
    pub fn leader() -> Self {
        Self::Leader {
            cutoff: DEFAULT_LEADER_CUTOFF,
        }
    }

    /// Label every row of `sim`.
    ///
    /// `params` supplies `eps`/`min_points`; leader grouping ignores it.
    pub fn assign(
        &self,
        sim: &SimilarityMatrix,
        params: &DbscanParams,
    ) -> ClusterResult<Vec<ClusterLabel>> {
        match *self {
            Self::Dbscan => assign_clusters(sim, params.eps, params.min_points),
            Self::Leader { cutoff } => leader_clusters(sim, cutoff),
        }
    }
}
