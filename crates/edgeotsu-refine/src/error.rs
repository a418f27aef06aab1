//! Error types for edgeotsu-refine
//!
//! Reductions can fail in either histogram pass; those errors carry the
//! [`Pass`] they came from so callers can tell a bad region from a bad
//! edge buffer.

use edgeotsu_filter::FilterError;
use edgeotsu_region::RegionError;
use edgeotsu_threshold::ThresholdError;
use std::fmt;
use thiserror::Error;

/// Histogram pass of the refinement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Histogram over the whole region
    Global,
    /// Histogram over the edge buffer
    Adaptive,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Global => write!(f, "global"),
            Pass::Adaptive => write!(f, "adaptive"),
        }
    }
}

/// Errors that can occur while refining a threshold
#[derive(Debug, Error)]
pub enum RefineError {
    /// No valid samples were available to a pass
    #[error("{pass} pass: region contains no valid samples")]
    EmptyRegion { pass: Pass },

    /// The samples of a pass fell into fewer than two buckets
    #[error("{pass} pass: degenerate histogram with {non_empty} non-empty bucket(s)")]
    DegenerateHistogram { pass: Pass, non_empty: usize },

    /// Invalid configuration or input
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A reduction would exceed the pixel budget
    #[error("reduction of {requested} pixels exceeds budget of {max} pixels")]
    ResourceBudgetExceeded { requested: u64, max: u64 },

    /// The run was cancelled
    #[error("refinement cancelled")]
    Cancelled,

    /// The run passed its deadline
    #[error("refinement timed out")]
    TimedOut,

    /// Core library error
    #[error("core error: {0}")]
    Core(edgeotsu_core::Error),

    /// Classification error
    #[error("threshold error: {0}")]
    Threshold(#[from] ThresholdError),

    /// Edge detection error
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// Edge filtering or buffering error
    #[error("region error: {0}")]
    Region(#[from] RegionError),
}

impl From<edgeotsu_core::Error> for RefineError {
    fn from(err: edgeotsu_core::Error) -> Self {
        use edgeotsu_core::Error as E;
        match err {
            E::ResourceBudgetExceeded { requested, max } => {
                RefineError::ResourceBudgetExceeded { requested, max }
            }
            E::Cancelled => RefineError::Cancelled,
            E::TimedOut => RefineError::TimedOut,
            E::InvalidParameter(msg) => RefineError::InvalidParameter(msg),
            other => RefineError::Core(other),
        }
    }
}

impl RefineError {
    /// Tag a reduction error with the pass it occurred in.
    pub(crate) fn in_pass(pass: Pass, err: edgeotsu_core::Error) -> Self {
        match err {
            edgeotsu_core::Error::EmptyRegion => RefineError::EmptyRegion { pass },
            other => other.into(),
        }
    }

    /// Tag a threshold error with the pass it occurred in.
    pub(crate) fn threshold_in_pass(pass: Pass, err: ThresholdError) -> Self {
        match err {
            ThresholdError::DegenerateHistogram { non_empty } => {
                RefineError::DegenerateHistogram { pass, non_empty }
            }
            ThresholdError::Core(e) => Self::in_pass(pass, e),
            ThresholdError::InvalidParameters(msg) => RefineError::InvalidParameter(msg),
        }
    }

    /// The pass a reduction error belongs to, if any
    pub fn pass(&self) -> Option<Pass> {
        match self {
            RefineError::EmptyRegion { pass } | RefineError::DegenerateHistogram { pass, .. } => {
                Some(*pass)
            }
            _ => None,
        }
    }
}

/// Result type for refinement operations
pub type RefineResult<T> = Result<T, RefineError>;
