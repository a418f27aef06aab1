//! Error types for the test framework

use thiserror::Error;

/// Errors that can occur while building test fixtures
#[derive(Debug, Error)]
pub enum TestError {
    /// Invalid scene description
    #[error("invalid scene: {0}")]
    InvalidScene(String),

    /// Core error while assembling a raster or mask
    #[error("core error: {0}")]
    Core(#[from] edgeotsu_core::Error),
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;
