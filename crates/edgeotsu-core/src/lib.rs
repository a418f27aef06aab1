//! edgeotsu core - Basic data structures for edge-guided thresholding
//!
//! This crate provides the data structures shared by every stage of the
//! edge-guided Otsu pipeline:
//!
//! - [`Raster`] / [`RasterMut`] - Single-band `f32` grid with no-data
//! - [`GeoTransform`] - Mapping between pixel and physical coordinates
//! - [`BinaryMask`] / [`BinaryMaskMut`] - 0/1/no-data masks on a raster grid
//! - [`Region`] - Geometric boundary restricting reductions
//! - [`EdgeClasses`] - Weak/strong labelling of edge cells
//! - [`Histogram`] - Bucketed histogram produced by a region reduction
//! - [`ReductionContext`] - Pixel budget and cancellation for reductions

pub mod budget;
pub mod classes;
pub mod error;
pub mod histogram;
pub mod mask;
pub mod maybe_rayon;
pub mod raster;
pub mod region;

pub use budget::{CancelToken, DEFAULT_MAX_PIXELS, ReductionBudget, ReductionContext};
pub use classes::{EdgeClass, EdgeClasses};
pub use error::{Error, Result};
pub use histogram::{
    Histogram, HistogramOptions, MAX_BUCKETS, build_histogram, build_histogram_masked,
    count_samples, subsample_factor,
};
pub use mask::{BinaryMask, BinaryMaskMut, MASK_NODATA};
pub use raster::{GeoTransform, Raster, RasterMut};
pub use region::{PixelBounds, Region};
