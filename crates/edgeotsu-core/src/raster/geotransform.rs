//! North-up affine georeferencing for rasters

use crate::error::{Error, Result};

/// Maps pixel coordinates to physical (map) coordinates.
///
/// Rasters are north-up with square pixels:
/// ```text
/// x = origin_x + col * pixel_size
/// y = origin_y - row * pixel_size
/// ```
/// `(origin_x, origin_y)` is the upper-left corner of pixel `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel size in physical units (distance per pixel)
    pub pixel_size: f64,
}

impl GeoTransform {
    /// Create a new transform.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `pixel_size` is not a positive
    /// finite number or the origin is not finite.
    pub fn new(origin_x: f64, origin_y: f64, pixel_size: f64) -> Result<Self> {
        if !(pixel_size.is_finite() && pixel_size > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "pixel size must be positive and finite, got {pixel_size}"
            )));
        }
        if !origin_x.is_finite() || !origin_y.is_finite() {
            return Err(Error::InvalidParameter(
                "geotransform origin must be finite".to_string(),
            ));
        }
        Ok(Self {
            origin_x,
            origin_y,
            pixel_size,
        })
    }

    /// Transform anchored at the origin with the given pixel size.
    pub fn with_pixel_size(pixel_size: f64) -> Result<Self> {
        Self::new(0.0, 0.0, pixel_size)
    }

    /// Physical coordinates of the center of pixel `(col, row)`.
    #[inline]
    pub fn cell_center(&self, col: u32, row: u32) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_size,
            self.origin_y - (row as f64 + 0.5) * self.pixel_size,
        )
    }

    /// Fractional pixel coordinates `(col, row)` of a physical point.
    #[inline]
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_size,
            (self.origin_y - y) / self.pixel_size,
        )
    }
}

impl Default for GeoTransform {
    /// Unit pixels anchored at the origin.
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            pixel_size: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_center_roundtrip() {
        let gt = GeoTransform::new(500.0, 1000.0, 30.0).unwrap();
        let (x, y) = gt.cell_center(2, 3);
        assert_eq!((x, y), (575.0, 895.0));

        let (col, row) = gt.to_pixel(x, y);
        assert_eq!((col, row), (2.5, 3.5));
    }

    #[test]
    fn test_invalid_pixel_size() {
        assert!(GeoTransform::new(0.0, 0.0, 0.0).is_err());
        assert!(GeoTransform::new(0.0, 0.0, -10.0).is_err());
        assert!(GeoTransform::new(0.0, 0.0, f64::NAN).is_err());
        assert!(GeoTransform::new(f64::INFINITY, 0.0, 10.0).is_err());
    }
}
