//! Failure records as they enter and leave the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::normalize::normalize;

/// Cluster label assigned to a record. [`NOISE`] marks unclustered records.
pub type ClusterLabel = i32;

/// Label for records not reachable from any cluster.
pub const NOISE: ClusterLabel = -1;

// =============================================================================
// RawRecord
// =============================================================================

/// A failed execution as delivered by the record-acquisition layer.
///
/// Either stream may be absent; [`prepare_records`] picks the message text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Opaque row id used to map labels back to source rows.
    pub identity: Uuid,
    /// Captured standard error.
    #[serde(default)]
    pub stderr: Option<String>,
    /// Captured standard output, used when stderr is blank.
    #[serde(default)]
    pub stdout: Option<String>,
    /// When the execution happened.
    pub timestamp: DateTime<Utc>,
    /// Version of the tool that produced the failure.
    #[serde(default)]
    pub version: Option<String>,
}

impl RawRecord {
    /// The message text: stderr when non-blank, else stdout when non-blank.
    pub fn message(&self) -> Option<&str> {
        [self.stderr.as_deref(), self.stdout.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
    }
}

// =============================================================================
// ErrorRecord
// =============================================================================

/// One observed failure occurrence with its normalized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Opaque row id.
    pub identity: Uuid,
    /// Original message.
    pub raw_text: String,
    /// Space-joined canonical tokens, derived from `raw_text`.
    pub normalized_text: String,
    /// When the occurrence happened.
    pub timestamp: DateTime<Utc>,
    /// Producing tool version, free-form.
    pub version: Option<String>,
}

impl ErrorRecord {
    /// Create a record, normalizing `raw_text` once.
    pub fn new(
        identity: Uuid,
        raw_text: impl Into<String>,
        timestamp: DateTime<Utc>,
        version: Option<String>,
    ) -> Self {
        let raw_text = raw_text.into();
        let normalized_text = normalize(&raw_text);
        Self {
            identity,
            raw_text,
            normalized_text,
            timestamp,
            version,
        }
    }

    /// Create a record with a fresh random identity.
    pub fn with_random_id(
        raw_text: impl Into<String>,
        timestamp: DateTime<Utc>,
        version: Option<String>,
    ) -> Self {
        Self::new(Uuid::new_v4(), raw_text, timestamp, version)
    }
}

/// A record annotated with its cluster label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredRecord {
    /// The input record.
    #[serde(flatten)]
    pub record: ErrorRecord,
    /// Assigned cluster, or [`NOISE`].
    pub cluster_id: ClusterLabel,
}

impl ClusteredRecord {
    /// Whether the record was left unclustered.
    #[inline]
    pub fn is_noise(&self) -> bool {
        self.cluster_id == NOISE
    }
}

// =============================================================================
// Preparation
// =============================================================================

/// Keep only the last `max_lines` lines of `text`.
///
/// Text with fewer than `max_lines` newlines is returned unchanged.
pub fn truncate_lines(text: &str, max_lines: usize) -> &str {
    if text.matches('\n').count() < max_lines {
        return text;
    }
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .filter(|&start| start < text.len())
        .collect();
    match line_starts.len().checked_sub(max_lines) {
        Some(skip) if skip > 0 => text[line_starts[skip]..].trim_end_matches('\n'),
        _ => text.trim_end_matches('\n'),
    }
}

/// Turn acquisition rows into engine records.
///
/// Rows without message text are dropped; message text is truncated to its
/// last `max_lines` lines before normalization.
pub fn prepare_records(raws: Vec<RawRecord>, max_lines: usize) -> Vec<ErrorRecord> {
    let total = raws.len();
    let records: Vec<ErrorRecord> = raws
        .into_iter()
        .filter_map(|raw| {
            let text = truncate_lines(raw.message()?, max_lines).to_string();
            Some(ErrorRecord::new(raw.identity, text, raw.timestamp, raw.version))
        })
        .collect();

    let dropped = total - records.len();
    if dropped > 0 {
        tracing::debug!(total, dropped, "dropped rows without message text");
    }
    records
}
