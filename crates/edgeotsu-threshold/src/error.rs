//! Error types for edgeotsu-threshold

use thiserror::Error;

/// Errors that can occur while computing or applying a threshold
#[derive(Debug, Error)]
pub enum ThresholdError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] edgeotsu_core::Error),

    /// Fewer than two non-empty buckets: no bimodal split exists
    #[error("degenerate histogram: {non_empty} non-empty bucket(s)")]
    DegenerateHistogram { non_empty: usize },

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for threshold operations
pub type ThresholdResult<T> = Result<T, ThresholdError>;
