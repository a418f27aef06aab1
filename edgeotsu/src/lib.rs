//! edgeotsu - Edge-guided adaptive Otsu thresholding
//!
//! Splits a single-band raster (e.g. radar backscatter in dB) into two
//! classes. A global Otsu threshold gives a first classification; its
//! boundaries, cleaned of short fragments and buffered, select the samples
//! for a second, adaptive Otsu threshold.
//!
//! # Example
//!
//! ```
//! use edgeotsu::{AdaptiveRefiner, GeoTransform, Raster, RefineConfig, Region};
//!
//! let gt = GeoTransform::with_pixel_size(30.0).unwrap();
//! let raster = Raster::from_fn(64, 64, gt, |x, y| {
//!     let base = if x < 32 { -20.0 } else { -5.0 };
//!     base + ((x + 3 * y) % 4) as f32
//! })
//! .unwrap();
//!
//! let out = AdaptiveRefiner::new(RefineConfig::default())
//!     .unwrap()
//!     .run_raster(&raster, &Region::Full)
//!     .unwrap();
//! assert_eq!(out.classification.count_ones(), 32 * 64);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use edgeotsu_core::*;

// Pipeline entry points
pub use edgeotsu_refine::{
    AdaptiveRefiner, Band, BandStack, Pass, RefineConfig, RefineError, RefineOutput,
    RefineResult, RefineState,
};

// Re-export stage crates as modules to avoid name conflicts
pub use edgeotsu_filter as filter;
pub use edgeotsu_refine as refine;
pub use edgeotsu_region as region;
pub use edgeotsu_threshold as threshold;
