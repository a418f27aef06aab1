//! edgeotsu-filter - Smoothing and edge detection
//!
//! - [`Kernel`] - Convolution kernels (Gaussian, Sobel)
//! - [`gaussian_smooth`] / [`convolve_separable_masked`] - Normalized
//!   convolution that ignores no-data
//! - [`canny`] / [`canny_mask`] - Canny edge detection producing an
//!   [`EdgeMap`]

pub mod convolve;
pub mod edge;
pub mod error;
pub mod kernel;

pub use convolve::{convolve_separable_masked, gaussian_smooth};
pub use edge::{CannyOptions, EdgeMap, canny, canny_mask, gradient_magnitude};
pub use error::{FilterError, FilterResult};
pub use kernel::Kernel;
