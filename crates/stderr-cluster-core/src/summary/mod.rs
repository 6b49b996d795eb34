//! Per-cluster aggregates.
//!
//! For every non-noise label a [`ClusterSummary`] records the member count,
//! a representative message (the matrix medoid), the most recent occurrence
//! and the highest-ranked tool version. Noise records never contribute.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ClusterError, ClusterResult};
use crate::similarity::SimilarityMatrix;
use crate::types::{ClusterLabel, ErrorRecord};
use crate::version::sortable_key;

/// Aggregate view of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Cluster label (never noise).
    pub cluster_id: ClusterLabel,
    /// Number of member records.
    pub count: usize,
    /// Raw text of the medoid member.
    pub representative_text: String,
    /// Identity of the medoid member.
    pub representative_id: Uuid,
    /// Latest member timestamp.
    pub last_seen: DateTime<Utc>,
    /// Highest member version, `None` if no member has one.
    pub latest_version: Option<String>,
}

/// A summary annotated with the grouping key of its batch (e.g. a tool id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedSummary {
    /// Grouping key.
    pub group: String,
    /// The cluster summary.
    #[serde(flatten)]
    pub summary: ClusterSummary,
}

/// Summarize every non-noise cluster.
///
/// Output is ordered by `count` descending, then `cluster_id` ascending.
///
/// # Errors
///
/// `ClusterError::DimensionMismatch` if `labels` or `sim` do not cover
/// exactly the records.
pub fn summarize(
    records: &[ErrorRecord],
    labels: &[ClusterLabel],
    sim: &SimilarityMatrix,
) -> ClusterResult<Vec<ClusterSummary>> {
    if labels.len() != records.len() {
        return Err(ClusterError::DimensionMismatch {
            expected: records.len(),
            actual: labels.len(),
        });
    }
    if sim.size() != records.len() {
        return Err(ClusterError::DimensionMismatch {
            expected: records.len(),
            actual: sim.size(),
        });
    }

    let mut members: BTreeMap<ClusterLabel, Vec<usize>> = BTreeMap::new();
    for (index, &label) in labels.iter().enumerate() {
        if label >= 0 {
            members.entry(label).or_default().push(index);
        }
    }

    let mut summaries: Vec<ClusterSummary> = members
        .into_iter()
        .filter_map(|(cluster_id, indices)| summarize_cluster(records, sim, cluster_id, &indices))
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then(a.cluster_id.cmp(&b.cluster_id)));
    Ok(summaries)
}

fn summarize_cluster(
    records: &[ErrorRecord],
    sim: &SimilarityMatrix,
    cluster_id: ClusterLabel,
    indices: &[usize],
) -> Option<ClusterSummary> {
    let medoid = medoid(sim, indices)?;
    let last_seen = indices.iter().map(|&i| records[i].timestamp).max()?;
    let latest_version = latest_version(records, indices);

    Some(ClusterSummary {
        cluster_id,
        count: indices.len(),
        representative_text: records[medoid].raw_text.clone(),
        representative_id: records[medoid].identity,
        last_seen,
        latest_version,
    })
}

/// Member with the greatest summed similarity to the other members.
///
/// Ties go to the lowest record index.
pub fn medoid(sim: &SimilarityMatrix, indices: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for &i in indices {
        let row = sim.row(i);
        let total: f64 = indices
            .iter()
            .filter(|&&j| j != i)
            .map(|&j| f64::from(row[j]))
            .sum();
        let better = match best {
            None => true,
            Some((best_i, best_total)) => total > best_total || (total == best_total && i < best_i),
        };
        if better {
            best = Some((i, total));
        }
    }
    best.map(|(i, _)| i)
}

/// Version of the member with the greatest sortable key.
///
/// Ties go to the lowest record index. Members without a usable version sort
/// lowest; if none has one the result is `None`.
fn latest_version(records: &[ErrorRecord], indices: &[usize]) -> Option<String> {
    let mut best: Option<(usize, _)> = None;
    for &i in indices {
        let key = sortable_key(records[i].version.as_deref());
        let better = match &best {
            None => true,
            Some((best_i, best_key)) => key > *best_key || (key == *best_key && i < *best_i),
        };
        if better {
            best = Some((i, key));
        }
    }
    let (index, key) = best?;
    if key.is_missing() {
        return None;
    }
    records[index].version.clone()
}
