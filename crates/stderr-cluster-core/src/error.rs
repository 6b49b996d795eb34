//! Error types for stderr-cluster-core.
//!
//! This module defines the central error type [`ClusterError`] used throughout
//! the crate, along with the [`ClusterResult<T>`] type alias.
//!
//! Only configuration and input-shape problems are errors. Degenerate inputs
//! (empty normalized text, empty token sets, empty vocabulary, malformed
//! version strings) are resolved with fallback values and never reach here.
//!
//! # Examples
//!
//! ```rust
//! use stderr_cluster_core::ClusterError;
//!
//! let err = ClusterError::invalid_parameter("eps must be > 0, got 0");
//! assert!(err.to_string().contains("eps"));
//! ```

use thiserror::Error;

/// Top-level error type for clustering operations.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// A numeric parameter is outside its allowed range.
    ///
    /// # When This Occurs
    ///
    /// - `eps` is zero, negative, NaN or infinite
    /// - `min_points` is 0
    /// - leader `cutoff` outside [0.0, 1.0]
    /// - `max_text_lines` is 0
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the violated constraint
        message: String,
    },

    /// A similarity metric name was not recognised.
    #[error("Unknown similarity metric '{name}'; expected one of edit_distance, token_set_overlap, term_weighted_cosine, embedding_distance")]
    UnknownMetric {
        /// The name that failed to parse
        name: String,
    },

    /// A record reached the engine without a required field.
    #[error("Record {index} is missing required field '{field}'")]
    MissingField {
        /// Position of the record in the batch
        index: usize,
        /// Name of the missing field
        field: &'static str,
    },

    /// Two inputs that must describe the same batch have different sizes.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length (usually the batch size)
        expected: usize,
        /// Length actually provided
        actual: usize,
    },

    /// A metric produced NaN or infinity for a pair of records.
    #[error("Similarity between records {i} and {j} is not finite: {value}")]
    NonFiniteSimilarity {
        /// Row index
        i: usize,
        /// Column index
        j: usize,
        /// Offending value
        value: f32,
    },

    /// Pretrained token vectors could not be loaded.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Configuration could not be loaded or deserialized.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClusterError {
    /// Create an [`ClusterError::InvalidParameter`] from any message.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create an [`ClusterError::UnknownMetric`] for the given name.
    pub fn unknown_metric(name: impl Into<String>) -> Self {
        Self::UnknownMetric { name: name.into() }
    }

    /// Whether this error comes from configuration rather than input data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. } | Self::UnknownMetric { .. } | Self::Config(_)
        )
    }
}

impl From<config::ConfigError> for ClusterError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result alias for clustering operations.
pub type ClusterResult<T> = Result<T, ClusterError>;
