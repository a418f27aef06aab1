//! edgeotsu-refine - Edge-guided adaptive Otsu refinement
//!
//! Ties the other crates together into the two-pass pipeline:
//!
//! - [`RefineConfig`] - Validated, serde-backed run parameters
//! - [`Band`] / [`BandStack`] - Polarization band selection
//! - [`AdaptiveRefiner`] - The pipeline, producing a [`RefineOutput`]
//! - [`RefineError`] - Errors tagged with the failing [`Pass`]

pub mod bands;
pub mod config;
pub mod error;
pub mod pipeline;

pub use bands::BandStack;
pub use config::{Band, MIN_RESOLUTION, RefineConfig};
pub use error::{Pass, RefineError, RefineResult};
pub use pipeline::{AdaptiveRefiner, RefineOutput, RefineState};
