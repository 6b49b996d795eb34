//! Engine configuration.
//!
//! Values come from, in increasing priority:
//! 1. [`EngineConfig::default`]
//! 2. an optional configuration file (TOML, JSON, ...)
//! 3. environment variables prefixed `STDERR_CLUSTER__`, e.g.
//!    `STDERR_CLUSTER__METRIC=tfidf` or `STDERR_CLUSTER__ALGORITHM__KIND=leader`
//!
//! Every loaded configuration is validated before it is returned.

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::clustering::{
    validate_cutoff, ClusterAlgorithm, DbscanParams, DEFAULT_EPS, DEFAULT_MIN_POINTS,
};
use crate::error::{ClusterError, ClusterResult};
use crate::similarity::SimilarityMetric;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "STDERR_CLUSTER";

/// Lines of message text kept per record.
pub const DEFAULT_MAX_TEXT_LINES: usize = 15;

/// Settings for one clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Similarity metric.
    pub metric: SimilarityMetric,
    /// DBSCAN neighbour radius, in distance units (`1 - similarity`).
    pub eps: f32,
    /// DBSCAN minimum neighbourhood size, self included.
    pub min_points: usize,
    /// Clustering algorithm.
    pub algorithm: ClusterAlgorithm,
    /// Keep only the last N lines of each message.
    pub max_text_lines: usize,
    /// Word-vector text file for the embedding metric.
    pub embedding_vectors: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            metric: SimilarityMetric::EditDistance,
            eps: DEFAULT_EPS,
            min_points: DEFAULT_MIN_POINTS,
            algorithm: ClusterAlgorithm::Dbscan,
            max_text_lines: DEFAULT_MAX_TEXT_LINES,
            embedding_vectors: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from `path` (if it exists) and the environment.
    ///
    /// The file format is inferred from the extension.
    ///
    /// # Errors
    ///
    /// - `ClusterError::Config` if a source cannot be read or deserialized
    /// - `ClusterError::UnknownMetric` / `InvalidParameter` from validation
    pub fn load(path: impl AsRef<Path>) -> ClusterResult<Self> {
        let path = path.as_ref();
        let builder = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        let settings = builder.build()?;
        if let Ok(name) = settings.get_string("metric") {
            name.parse::<SimilarityMetric>()?;
        }

        let config: EngineConfig = settings.try_deserialize()?;
        config.validate()?;

        tracing::info!(
            path = %path.display(),
            metric = %config.metric,
            eps = config.eps,
            min_points = config.min_points,
            "engine configuration loaded"
        );
        Ok(config)
    }

    /// Validate settings.
    ///
    /// Fails fast with descriptive error messages.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidParameter` if:
    /// - eps is not finite or <= 0
    /// - min_points < 1
    /// - max_text_lines < 1
    /// - the leader cutoff is outside [0.0, 1.0]
    pub fn validate(&self) -> ClusterResult<()> {
        self.dbscan_params().validate()?;

        if self.max_text_lines < 1 {
            return Err(ClusterError::invalid_parameter(format!(
                "max_text_lines must be >= 1, got {}",
                self.max_text_lines
            )));
        }

        if let ClusterAlgorithm::Leader { cutoff } = self.algorithm {
            validate_cutoff(cutoff)?;
        }

        Ok(())
    }

    /// DBSCAN parameters derived from this configuration.
    pub fn dbscan_params(&self) -> DbscanParams {
        DbscanParams::new(self.eps, self.min_points)
    }

    /// Set similarity metric.
    #[must_use]
    pub fn with_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
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

    /// Set clustering algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: ClusterAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set per-message line limit.
    ///
    /// Value is NOT automatically clamped - use validate() to check.
    #[must_use]
    pub fn with_max_text_lines(mut self, lines: usize) -> Self {
        self.max_text_lines = lines;
        self
    }

    /// Set word-vector file for the embedding metric.
    #[must_use]
    pub fn with_embedding_vectors(mut self, path: impl Into<PathBuf>) -> Self {
        self.embedding_vectors = Some(path.into());
        self
    }
}
