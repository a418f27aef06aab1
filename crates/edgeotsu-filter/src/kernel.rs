//! Convolution kernels
//!
//! Defines the kernel structure used by masked smoothing and the Sobel
//! gradient. A kernel is a small row-major grid of weights with an origin
//! (center) cell.

use crate::{FilterError, FilterResult};

/// A 2D convolution kernel
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    /// Width of the kernel
    width: u32,
    /// Height of the kernel
    height: u32,
    /// X coordinate of the center
    cx: u32,
    /// Y coordinate of the center
    cy: u32,
    /// Kernel data (row-major order)
    data: Vec<f32>,
}

impl Kernel {
    /// Create a zero kernel with the center at the middle cell.
    pub fn new(width: u32, height: u32) -> FilterResult<Self> {
        if width == 0 || height == 0 {
            return Err(FilterError::InvalidKernel(format!(
                "kernel dimensions must be positive, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            cx: width / 2,
            cy: height / 2,
            data: vec![0.0; (width * height) as usize],
        })
    }

    /// Create a kernel from a slice of values.
    pub fn from_slice(width: u32, height: u32, data: &[f32]) -> FilterResult<Self> {
        let mut kernel = Self::new(width, height)?;
        if data.len() != kernel.data.len() {
            return Err(FilterError::InvalidKernel(format!(
                "expected {} values for a {width}x{height} kernel, got {}",
                kernel.data.len(),
                data.len()
            )));
        }
        kernel.data.copy_from_slice(data);
        Ok(kernel)
    }

    /// Create a normalized horizontal Gaussian kernel.
    ///
    /// The radius is `ceil(3 * sigma)`; `sigma == 0` gives the identity
    /// kernel `[1]`. Use [`transpose`](Self::transpose) for the vertical pass.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidParameters`] if `sigma` is negative or
    /// not finite.
    pub fn gaussian_1d(sigma: f64) -> FilterResult<Self> {
        if !(sigma.is_finite() && sigma >= 0.0) {
            return Err(FilterError::InvalidParameters(format!(
                "sigma must be finite and >= 0, got {sigma}"
            )));
        }
        if sigma == 0.0 {
            return Self::from_slice(1, 1, &[1.0]);
        }
        let radius = (3.0 * sigma).ceil() as i32;
        let values: Vec<f32> = (-radius..=radius)
            .map(|i| (-(i * i) as f64 / (2.0 * sigma * sigma)).exp() as f32)
            .collect();
        let mut kernel = Self::from_slice(values.len() as u32, 1, &values)?;
        kernel.normalize();
        Ok(kernel)
    }

    /// Sobel kernel for the horizontal derivative (x grows to the right).
    pub fn sobel_horizontal() -> Self {
        Self {
            width: 3,
            height: 3,
            cx: 1,
            cy: 1,
            data: vec![-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0],
        }
    }

    /// Sobel kernel for the vertical derivative (y grows downward).
    pub fn sobel_vertical() -> Self {
        Self::sobel_horizontal().transpose()
    }

    /// Get the kernel width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the kernel height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the center X coordinate.
    #[inline]
    pub fn center_x(&self) -> u32 {
        self.cx
    }

    /// Get the center Y coordinate.
    #[inline]
    pub fn center_y(&self) -> u32 {
        self.cy
    }

    /// Set the center coordinates.
    pub fn set_center(&mut self, cx: u32, cy: u32) -> FilterResult<()> {
        if cx >= self.width || cy >= self.height {
            return Err(FilterError::InvalidKernel(format!(
                "center ({cx}, {cy}) outside {}x{} kernel",
                self.width, self.height
            )));
        }
        self.cx = cx;
        self.cy = cy;
        Ok(())
    }

    /// Get the kernel data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Get a value at (x, y).
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[(y * self.width + x) as usize])
    }

    /// Set a value at (x, y); out-of-range coordinates are ignored.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = value;
        }
    }

    /// Normalize the kernel so that values sum to 1.
    ///
    /// A kernel summing to zero is left unchanged.
    pub fn normalize(&mut self) {
        let sum = self.sum();
        if sum.abs() > f32::EPSILON {
            for v in &mut self.data {
                *v /= sum;
            }
        }
    }

    /// Get the sum of all kernel values.
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    /// Swap rows and columns, including the center.
    pub fn transpose(&self) -> Self {
        let mut data = vec![0.0; self.data.len()];
        for y in 0..self.height {
            for x in 0..self.width {
                data[(x * self.height + y) as usize] = self.data[(y * self.width + x) as usize];
            }
        }
        Self {
            width: self.height,
            height: self.width,
            cx: self.cy,
            cy: self.cx,
            data,
        }
    }
}
