//! Greedy leader clustering.
//!
//! Records are visited in ascending index order. Each record joins the first
//! existing group whose founder it is strictly more similar to than `cutoff`;
//! otherwise it founds a new group. Every record gets a label, labels are
//! dense `0..k` in founding order, and there is no noise.
//!
//! Similarities come from the engine's configured metric, like DBSCAN. With
//! the default configuration that is edit distance over *normalized* text,
//! not an indel ratio over the raw truncated message. Scores therefore
//! differ from a raw-text ratio, and messages that differ only in paths or
//! numbers score 1.0 here. Pick another metric through
//! [`EngineConfig::metric`](crate::config::EngineConfig::metric) to change
//! what "similar to the founder" means.

use crate::error::{ClusterError, ClusterResult};
use crate::similarity::SimilarityMatrix;
use crate::types::ClusterLabel;

/// Production cutoff for leader grouping.
pub const DEFAULT_LEADER_CUTOFF: f32 = 0.8;

/// Check a leader cutoff.
///
/// # Errors
///
/// `ClusterError::InvalidParameter` if `cutoff` is not within [0.0, 1.0].
pub fn validate_cutoff(cutoff: f32) -> ClusterResult<()> {
    if !(0.0..=1.0).contains(&cutoff) {
        return Err(ClusterError::invalid_parameter(format!(
            "leader cutoff must be in [0.0, 1.0], got {}",
            cutoff
        )));
    }
    Ok(())
}

/// Group rows of `sim` by similarity to each group's founder.
///
/// # Example
///
/// ```
/// use stderr_cluster_core::clustering::leader_clusters;
/// use stderr_cluster_core::similarity::SimilarityMatrix;
///
/// let sim = SimilarityMatrix::from_rows(vec![
///     vec![1.0, 0.9, 0.1],
///     vec![0.9, 1.0, 0.1],
///     vec![0.1, 0.1, 1.0],
/// ]).unwrap();
/// assert_eq!(leader_clusters(&sim, 0.8).unwrap(), vec![0, 0, 1]);
/// ```
pub fn leader_clusters(sim: &SimilarityMatrix, cutoff: f32) -> ClusterResult<Vec<ClusterLabel>> {
    validate_cutoff(cutoff)?;

    let mut founders: Vec<usize> = Vec::new();
    let mut labels = Vec::with_capacity(sim.size());

    for i in 0..sim.size() {
        let row = sim.row(i);
        let joined = founders.iter().position(|&f| row[f] > cutoff);
        let group = match joined {
            Some(group) => group,
            None => {
                founders.push(i);
                founders.len() - 1
            }
        };
        labels.push(group as ClusterLabel);
    }

    tracing::debug!(
        points = sim.size(),
        groups = founders.len(),
        cutoff,
        "leader grouping complete"
    );
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_range() {
        assert!(validate_cutoff(0.0).is_ok());
        assert!(validate_cutoff(1.0).is_ok());
        assert!(validate_cutoff(1.1).is_err());
        assert!(validate_cutoff(f32::NAN).is_err());
    }

    #[test]
    fn test_compares_against_founder_only() {
        // 1 is close to 0 and 2, but 2 is not close to founder 0
        let sim = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.9, 0.5],
            vec![0.9, 1.0, 0.9],
            vec![0.5, 0.9, 1.0],
        ])
        .unwrap();
        assert_eq!(leader_clusters(&sim, 0.8).unwrap(), vec![0, 0, 1]);
    }

    #[test]
    fn test_strictly_greater() {
        let sim = SimilarityMatrix::from_rows(vec![vec![1.0, 0.8], vec![0.8, 1.0]]).unwrap();
        assert_eq!(leader_clusters(&sim, 0.8).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_first_matching_group_wins() {
        let sim = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.1, 0.85],
            vec![0.1, 1.0, 0.95],
            vec![0.85, 0.95, 1.0],
        ])
        .unwrap();
        assert_eq!(leader_clusters(&sim, 0.8).unwrap(), vec![0, 1, 0]);
    }

    #[test]
    fn test_empty() {
        let sim = SimilarityMatrix::from_rows(Vec::new()).unwrap();
        assert!(leader_clusters(&sim, 0.8).unwrap().is_empty());
    }
}
