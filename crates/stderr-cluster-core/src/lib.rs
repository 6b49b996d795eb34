//! Stderr Cluster Core Library
//!
//! Groups free-text tool failure messages so that many superficially
//! different occurrences of the same error collapse into a few
//! representative clusters.
//!
//! # Architecture
//!
//! Data flows strictly downstream, each stage producing a new artifact:
//!
//! ```text
//! RawRecord ─> ErrorRecord ─> SimilarityMatrix ─> labels ─> ClusterSummary
//!  (types)     (normalize)     (similarity)     (clustering)   (summary)
//! ```
//!
//! - [`version`]: sortable keys for free-form version strings
//! - [`normalize`]: lowercase, tokenize, drop stop words, lemmatize
//! - [`similarity`]: edit distance, token-set overlap, TF-IDF cosine and
//!   embedding distance, all behind [`similarity::PairwiseSimilarity`]
//! - [`clustering`]: DBSCAN over `1 - similarity`, or greedy leader grouping
//! - [`summary`]: per-cluster count, medoid, last seen and latest version
//! - [`pipeline`]: [`ClusteringEngine`] wiring the stages together
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use stderr_cluster_core::{ClusteringEngine, EngineConfig, ErrorRecord, SimilarityMetric};
//!
//! let config = EngineConfig::default()
//!     .with_metric(SimilarityMetric::TokenSetOverlap)
//!     .with_min_points(2);
//! let engine = ClusteringEngine::new(config).unwrap();
//!
//! let now = Utc::now();
//! let outcome = engine
//!     .run(vec![
//!         ErrorRecord::with_random_id("Error: /tmp/a.fa is not a FASTA file", now, None),
//!         ErrorRecord::with_random_id("Error: /tmp/b.fa is not a FASTA file", now, None),
//!     ])
//!     .unwrap();
//! assert_eq!(outcome.summaries.len(), 1);
//! ```

pub mod clustering;
pub mod config;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod similarity;
pub mod summary;
pub mod types;
pub mod version;

// Re-exports for convenience
pub use clustering::{assign_clusters, ClusterAlgorithm, DbscanParams};
pub use config::EngineConfig;
pub use error::{ClusterError, ClusterResult};
pub use normalize::normalize;
pub use pipeline::{BatchOutcome, ClusteringEngine, GroupOutcome};
pub use similarity::{PairwiseSimilarity, SimilarityMatrix, SimilarityMetric};
pub use summary::{summarize, ClusterSummary, GroupedSummary};
pub use types::{prepare_records, ClusterLabel, ClusteredRecord, ErrorRecord, RawRecord, NOISE};
pub use version::{compare_versions, sortable_key, SortableVersion};
