//! Error types for edgeotsu-core
//!
//! Provides a unified error type for all operations in the core crate.
//! Reductions (histograms, pixel counts) fail with one specific variant
//! rather than returning partial results.

use thiserror::Error;

/// edgeotsu core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid raster dimensions
    #[error("invalid raster dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// Index out of bounds
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Raster geometry mismatch
    #[error("dimension mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The region holds no valid samples at the requested resolution
    #[error("region contains no valid samples")]
    EmptyRegion,

    /// A reduction would touch more pixels than the configured budget allows
    #[error("reduction of {requested} pixels exceeds budget of {max} pixels")]
    ResourceBudgetExceeded { requested: u64, max: u64 },

    /// The operation was cancelled through its [`CancelToken`](crate::CancelToken)
    #[error("operation cancelled")]
    Cancelled,

    /// The deadline attached to the [`CancelToken`](crate::CancelToken) passed
    #[error("operation timed out")]
    TimedOut,
}

/// Result type alias for edgeotsu core operations
pub type Result<T> = std::result::Result<T, Error>;
