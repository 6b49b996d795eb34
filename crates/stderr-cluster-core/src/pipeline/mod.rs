//! Batch clustering pipeline.
//!
//! ```text
//! ErrorRecord[] ─> SimilarityMatrix ─> labels ─> ClusterSummary[]
//!                  (metric)            (algorithm)
//! ```
//!
//! Each call to [`ClusteringEngine::run`] is an independent, stateless batch.
//! [`ClusteringEngine::run_grouped`] runs several batches in parallel.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::EngineConfig;
use crate::error::{ClusterError, ClusterResult};
use crate::similarity::{
    EmbeddingDistanceSimilarity, PairwiseSimilarity, PretrainedEmbedder, SimilarityMetric,
};
use crate::summary::{summarize, ClusterSummary, GroupedSummary};
use crate::types::{prepare_records, ClusterLabel, ClusteredRecord, ErrorRecord, RawRecord};

// =============================================================================
// Outcomes
// =============================================================================

/// Result of clustering one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Input records in input order, each with its label.
    pub records: Vec<ClusteredRecord>,
    /// One summary per non-noise cluster, largest first.
    pub summaries: Vec<ClusterSummary>,
    /// Number of records labeled noise.
    pub noise_count: usize,
}

impl BatchOutcome {
    /// Labels in input order.
    pub fn labels(&self) -> Vec<ClusterLabel> {
        self.records.iter().map(|r| r.cluster_id).collect()
    }

    /// Number of clusters found.
    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.summaries.len()
    }
}

/// Result of clustering one group of a grouped run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOutcome {
    /// Grouping key (e.g. tool id).
    pub group: String,
    /// Batch result for the group.
    pub outcome: BatchOutcome,
}

impl GroupOutcome {
    /// Summaries annotated with the group key.
    pub fn grouped_summaries(&self) -> Vec<GroupedSummary> {
        self.outcome
            .summaries
            .iter()
            .cloned()
            .map(|summary| GroupedSummary {
                group: self.group.clone(),
                summary,
            })
            .collect()
    }
}

// =============================================================================
// ClusteringEngine
// =============================================================================

/// Stateless clustering engine bound to one configuration.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use stderr_cluster_core::{ClusteringEngine, EngineConfig, ErrorRecord};
///
/// let engine = ClusteringEngine::new(EngineConfig::default().with_min_points(2)).unwrap();
/// let now = Utc::now();
/// let records = vec![
///     ErrorRecord::with_random_id("Killed: out of memory", now, None),
///     ErrorRecord::with_random_id("Killed: out of memory", now, None),
///     ErrorRecord::with_random_id("Segmentation fault", now, None),
/// ];
/// let outcome = engine.run(records).unwrap();
/// assert_eq!(outcome.labels(), vec![0, 0, -1]);
/// assert_eq!(outcome.summaries[0].count, 2);
/// ```
#[derive(Debug)]
pub struct ClusteringEngine {
    config: EngineConfig,
    similarity: Box<dyn PairwiseSimilarity>,
}

impl ClusteringEngine {
    /// Validate `config` and build the configured similarity metric.
    ///
    /// # Errors
    ///
    /// - `ClusterError::InvalidParameter` if the configuration is invalid
    /// - `ClusterError::Io` / `ClusterError::Embedding` if configured word
    ///   vectors cannot be loaded
    pub fn new(config: EngineConfig) -> ClusterResult<Self> {
        config.validate()?;
        let similarity: Box<dyn PairwiseSimilarity> =
            match (config.metric, config.embedding_vectors.as_ref()) {
                (SimilarityMetric::EmbeddingDistance, Some(path)) => {
                    let embedder = PretrainedEmbedder::from_path(path)?;
                    Box::new(EmbeddingDistanceSimilarity::new(Arc::new(embedder)))
                }
                (metric, _) => metric.engine(),
            };
        Ok(Self { config, similarity })
    }

    /// Use a caller-supplied similarity engine instead of the configured metric.
    ///
    /// # Errors
    ///
    /// `ClusterError::InvalidParameter` if the configuration is invalid.
    pub fn with_similarity(
        config: EngineConfig,
        similarity: Box<dyn PairwiseSimilarity>,
    ) -> ClusterResult<Self> {
        config.validate()?;
        Ok(Self { config, similarity })
    }

    /// The configuration this engine runs with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The metric of the similarity engine in use.
    pub fn metric(&self) -> SimilarityMetric {
        self.similarity.metric()
    }

    /// Prepare acquisition rows and cluster them as one batch.
    pub fn run_raw(&self, raws: Vec<RawRecord>) -> ClusterResult<BatchOutcome> {
        self.run(prepare_records(raws, self.config.max_text_lines))
    }

    /// Cluster one batch of records.
    ///
    /// # Errors
    ///
    /// - `ClusterError::MissingField` if a record has blank `raw_text`
    /// - `ClusterError::NonFiniteSimilarity` if the metric misbehaves
    #[instrument(skip(self, records), fields(batch = records.len(), metric = %self.similarity.metric()), level = "debug")]
    pub fn run(&self, records: Vec<ErrorRecord>) -> ClusterResult<BatchOutcome> {
        if let Some(index) = records.iter().position(|r| r.raw_text.trim().is_empty()) {
            return Err(ClusterError::MissingField {
                index,
                field: "raw_text",
            });
        }
        if records.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let sim = self.similarity.compute_records(&records)?;
        let labels = self
            .config
            .algorithm
            .assign(&sim, &self.config.dbscan_params())?;
        let summaries = summarize(&records, &labels, &sim)?;

        let noise_count = labels.iter().filter(|&&l| l < 0).count();
        tracing::info!(
            batch = records.len(),
            clusters = summaries.len(),
            noise = noise_count,
            "batch clustered"
        );

        let records = records
            .into_iter()
            .zip(labels)
            .map(|(record, cluster_id)| ClusteredRecord { record, cluster_id })
            .collect();

        Ok(BatchOutcome {
            records,
            summaries,
            noise_count,
        })
    }

    /// Cluster independent groups in parallel.
    ///
    /// Results are returned in input order. The first failing group aborts
    /// the whole run.
    #[instrument(skip(self, groups), fields(groups = groups.len()), level = "debug")]
    pub fn run_grouped(
        &self,
        groups: Vec<(String, Vec<ErrorRecord>)>,
    ) -> ClusterResult<Vec<GroupOutcome>> {
        let outcomes = groups
            .into_par_iter()
            .map(|(group, records)| {
                self.run(records)
                    .map(|outcome| GroupOutcome { group, outcome })
            })
            .collect::<ClusterResult<Vec<_>>>()?;

        tracing::info!(
            groups = outcomes.len(),
            clusters = outcomes.iter().map(|g| g.outcome.cluster_count()).sum::<usize>(),
            "grouped run complete"
        );
        Ok(outcomes)
    }
}
