//! edgeotsu-threshold - Histogram thresholding
//!
//! - [`otsu_threshold`] / [`between_class_variance`] - Otsu's method on a
//!   bucketed [`Histogram`](edgeotsu_core::Histogram)
//! - [`apply_threshold`] / [`apply_threshold_in`] - classify a raster into a
//!   [`BinaryMask`](edgeotsu_core::BinaryMask)

pub mod error;
pub mod mask;
pub mod otsu;

pub use error::{ThresholdError, ThresholdResult};
pub use mask::{apply_threshold, apply_threshold_in};
pub use otsu::{Threshold, between_class_variance, otsu_threshold};
