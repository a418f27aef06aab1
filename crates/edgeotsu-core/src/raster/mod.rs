//! Raster - Single-band floating-point grid
//!
//! `Raster` is a 2D array of `f32` samples over a georeferenced extent,
//! typically radar backscatter in dB.
//!
//! # No-data
//!
//! A cell is *no-data* when its value is non-finite (NaN or ±inf) or when it
//! equals the raster's declared no-data value. No-data cells are skipped by
//! every reduction and propagated unchanged by every per-cell transform.
//!
//! # Ownership model
//!
//! `Raster` uses `Arc` for cheap cloning (shared ownership). To modify
//! samples, convert to [`RasterMut`] via [`Raster::try_into_mut`] or
//! [`Raster::to_mut`], then convert back with `Into<Raster>`.
//!
//! # Examples
//!
//! ```
//! use edgeotsu_core::{GeoTransform, Raster};
//!
//! let gt = GeoTransform::with_pixel_size(30.0).unwrap();
//! let mut raster = Raster::new(100, 100, gt).unwrap().to_mut();
//! raster.set(10, 20, -14.5).unwrap();
//! raster.set_nodata(11, 20).unwrap();
//!
//! let raster: edgeotsu_core::Raster = raster.into();
//! assert_eq!(raster.get(10, 20), Some(-14.5));
//! assert_eq!(raster.get(11, 20), None);
//! assert_eq!(raster.resolution(), 30.0);
//! ```

mod geotransform;

pub use geotransform::GeoTransform;

use crate::error::{Error, Result};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct RasterData {
    width: u32,
    height: u32,
    transform: GeoTransform,
    /// Coordinate reference identifier (e.g. "EPSG:32633"), if known
    crs: Option<String>,
    /// Declared no-data value, in addition to non-finite samples
    nodata: Option<f32>,
    /// Samples, row-major with no padding
    data: Vec<f32>,
}

impl RasterData {
    #[inline]
    fn is_valid_value(&self, value: f32) -> bool {
        value.is_finite() && self.nodata.is_none_or(|nd| value != nd)
    }
}

/// Immutable single-band raster
///
/// Data is stored in row-major order with no padding. The sample at (x, y)
/// is at index `y * width + x`.
#[derive(Debug, Clone)]
pub struct Raster {
    inner: Arc<RasterData>,
}

impl Raster {
    /// Create a new raster with all samples set to zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32, transform: GeoTransform) -> Result<Self> {
        Self::filled(width, height, 0.0, transform)
    }

    /// Create a new raster with all samples set to `value`.
    pub fn filled(width: u32, height: u32, value: f32, transform: GeoTransform) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let size = (width as usize) * (height as usize);
        Ok(Self::from_parts(width, height, vec![value; size], transform))
    }

    /// Create a raster from row-major samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions are zero or `data.len()` does not
    /// equal `width * height`.
    pub fn from_data(
        width: u32,
        height: u32,
        data: Vec<f32>,
        transform: GeoTransform,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            return Err(Error::InvalidParameter(format!(
                "data length {} doesn't match {}x{} = {}",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self::from_parts(width, height, data, transform))
    }

    /// Create a raster by evaluating `f(x, y)` for every cell.
    pub fn from_fn<F>(width: u32, height: u32, transform: GeoTransform, mut f: F) -> Result<Self>
    where
        F: FnMut(u32, u32) -> f32,
    {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let mut data = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Ok(Self::from_parts(width, height, data, transform))
    }

    fn from_parts(width: u32, height: u32, data: Vec<f32>, transform: GeoTransform) -> Self {
        Raster {
            inner: Arc::new(RasterData {
                width,
                height,
                transform,
                crs: None,
                nodata: None,
                data,
            }),
        }
    }

    /// Width in pixels
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Height in pixels
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Dimensions as (width, height)
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.inner.width, self.inner.height)
    }

    /// Georeferencing of the grid
    #[inline]
    pub fn transform(&self) -> &GeoTransform {
        &self.inner.transform
    }

    /// Distance per pixel, in the units of the coordinate reference
    #[inline]
    pub fn resolution(&self) -> f64 {
        self.inner.transform.pixel_size
    }

    /// Coordinate reference identifier, if known
    pub fn crs(&self) -> Option<&str> {
        self.inner.crs.as_deref()
    }

    /// Declared no-data value, if any
    #[inline]
    pub fn nodata_value(&self) -> Option<f32> {
        self.inner.nodata
    }

    /// Raw samples (no-data cells included)
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.inner.data
    }

    /// Raw samples of row `y`
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[f32] {
        let w = self.inner.width as usize;
        let start = (y as usize) * w;
        &self.inner.data[start..start + w]
    }

    /// Whether `value` counts as valid data for this raster
    #[inline]
    pub fn is_valid_value(&self, value: f32) -> bool {
        self.inner.is_valid_value(value)
    }

    /// Whether the cell at (x, y) holds valid data.
    ///
    /// Out-of-bounds coordinates are reported as invalid.
    #[inline]
    pub fn is_valid(&self, x: u32, y: u32) -> bool {
        self.get(x, y).is_some()
    }

    /// Get the sample at (x, y).
    ///
    /// Returns `None` for out-of-bounds coordinates and for no-data cells.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.inner.width || y >= self.inner.height {
            return None;
        }
        let v = self.inner.data[(y as usize) * (self.inner.width as usize) + (x as usize)];
        self.inner.is_valid_value(v).then_some(v)
    }

    /// Get the raw sample at (x, y) without bounds checking.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[inline]
    pub fn get_unchecked(&self, x: u32, y: u32) -> f32 {
        self.inner.data[(y as usize) * (self.inner.width as usize) + (x as usize)]
    }

    /// Number of valid (non-no-data) samples
    pub fn valid_count(&self) -> u64 {
        self.inner
            .data
            .iter()
            .filter(|&&v| self.inner.is_valid_value(v))
            .count() as u64
    }

    /// Minimum and maximum over valid samples, or `None` if there are none.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.inner
            .data
            .iter()
            .copied()
            .filter(|&v| self.inner.is_valid_value(v))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Whether `other` covers the same grid (size and georeferencing).
    pub fn same_geometry(&self, other: &Raster) -> bool {
        self.dimensions() == other.dimensions() && self.transform() == other.transform()
    }

    /// Try to get mutable access to the samples.
    ///
    /// Succeeds only if there is exactly one reference to the data.
    pub fn try_into_mut(self) -> std::result::Result<RasterMut, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(data) => Ok(RasterMut { inner: data }),
            Err(arc) => Err(Raster { inner: arc }),
        }
    }

    /// Create a mutable copy of this raster.
    pub fn to_mut(&self) -> RasterMut {
        RasterMut {
            inner: (*self.inner).clone(),
        }
    }
}

/// Mutable raster
///
/// Allows modification of samples and metadata. Convert back to an
/// immutable [`Raster`] using `Into<Raster>`.
#[derive(Debug)]
pub struct RasterMut {
    inner: RasterData,
}

impl RasterMut {
    /// Width in pixels
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Height in pixels
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Set the sample at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if coordinates are out of range.
    pub fn set(&mut self, x: u32, y: u32, value: f32) -> Result<()> {
        let idx = self.index(x, y)?;
        self.inner.data[idx] = value;
        Ok(())
    }

    /// Mark the cell at (x, y) as no-data.
    ///
    /// Writes the declared no-data value, or NaN when none is declared.
    pub fn set_nodata(&mut self, x: u32, y: u32) -> Result<()> {
        let idx = self.index(x, y)?;
        self.inner.data[idx] = self.inner.nodata.unwrap_or(f32::NAN);
        Ok(())
    }

    /// Declare a no-data value.
    pub fn set_nodata_value(&mut self, nodata: Option<f32>) {
        self.inner.nodata = nodata;
    }

    /// Set the coordinate reference identifier.
    pub fn set_crs(&mut self, crs: Option<String>) {
        self.inner.crs = crs;
    }

    /// Replace the georeferencing.
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.inner.transform = transform;
    }

    /// Mutable access to the raw samples
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.inner.data
    }

    fn index(&self, x: u32, y: u32) -> Result<usize> {
        let idx = (y as usize) * (self.inner.width as usize) + (x as usize);
        if x >= self.inner.width || y >= self.inner.height {
            return Err(Error::IndexOutOfBounds {
                index: idx,
                len: self.inner.data.len(),
            });
        }
        Ok(idx)
    }
}

impl From<RasterMut> for Raster {
    fn from(raster_mut: RasterMut) -> Self {
        Raster {
            inner: Arc::new(raster_mut.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gt() -> GeoTransform {
        GeoTransform::with_pixel_size(10.0).unwrap()
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(Raster::new(0, 10, gt()).is_err());
        assert!(Raster::new(10, 0, gt()).is_err());
    }

    #[test]
    fn test_from_data_length_mismatch() {
        let result = Raster::from_data(3, 3, vec![0.0; 8], gt());
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_nodata_detection() {
        let mut r = Raster::from_data(3, 1, vec![1.0, -9999.0, f32::NAN], gt())
            .unwrap()
            .to_mut();
        r.set_nodata_value(Some(-9999.0));
        let r: Raster = r.into();

        assert_eq!(r.get(0, 0), Some(1.0));
        assert_eq!(r.get(1, 0), None);
        assert_eq!(r.get(2, 0), None);
        assert_eq!(r.valid_count(), 1);
        assert_eq!(r.min_max(), Some((1.0, 1.0)));
    }

    #[test]
    fn test_set_nodata_uses_declared_value() {
        let mut r = Raster::new(2, 2, gt()).unwrap().to_mut();
        r.set_nodata_value(Some(-1.0));
        r.set_nodata(1, 1).unwrap();
        let r: Raster = r.into();
        assert_eq!(r.get_unchecked(1, 1), -1.0);
        assert!(!r.is_valid(1, 1));
        assert!(r.is_valid(0, 0));
    }

    #[test]
    fn test_out_of_bounds() {
        let r = Raster::new(4, 4, gt()).unwrap();
        assert_eq!(r.get(4, 0), None);
        let mut m = r.to_mut();
        assert!(matches!(
            m.set(0, 4, 1.0),
            Err(Error::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_try_into_mut_shared() {
        let r = Raster::new(2, 2, gt()).unwrap();
        let shared = r.clone();
        assert!(r.try_into_mut().is_err());
        assert!(shared.try_into_mut().is_ok());
    }

    #[test]
    fn test_from_fn_row_major() {
        let r = Raster::from_fn(3, 2, gt(), |x, y| (y * 3 + x) as f32).unwrap();
        assert_eq!(r.row(1), &[3.0, 4.0, 5.0]);
        assert_eq!(r.resolution(), 10.0);
    }
}
