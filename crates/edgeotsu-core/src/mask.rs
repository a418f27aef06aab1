//! Binary masks with no-data
//!
//! [`BinaryMask`] is the common representation of edge masks, buffer masks
//! and classification masks. Each cell is `0`, `1` or no-data. A mask shares
//! the georeferencing of the raster it was derived from.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use std::sync::Arc;

/// Cell value marking no-data in a [`BinaryMask`]
pub const MASK_NODATA: u8 = u8::MAX;

#[derive(Debug, Clone, PartialEq)]
struct MaskData {
    width: u32,
    height: u32,
    transform: GeoTransform,
    /// One byte per cell: 0, 1 or [`MASK_NODATA`]
    data: Vec<u8>,
}

/// Immutable binary raster
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    inner: Arc<MaskData>,
}

impl BinaryMask {
    /// Create an all-zero mask with the given geometry.
    pub fn new(width: u32, height: u32, transform: GeoTransform) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let size = (width as usize) * (height as usize);
        Ok(BinaryMask {
            inner: Arc::new(MaskData {
                width,
                height,
                transform,
                data: vec![0; size],
            }),
        })
    }

    /// Create an all-zero mask on the grid of `raster`, carrying its
    /// no-data cells.
    pub fn zeros_like(raster: &Raster) -> Self {
        let data = raster
            .data()
            .iter()
            .map(|&v| if raster.is_valid_value(v) { 0 } else { MASK_NODATA })
            .collect();
        BinaryMask {
            inner: Arc::new(MaskData {
                width: raster.width(),
                height: raster.height(),
                transform: *raster.transform(),
                data,
            }),
        }
    }

    /// Create a mask from raw cell values.
    ///
    /// # Errors
    ///
    /// Returns an error if the length does not match the dimensions or if a
    /// value is neither 0, 1 nor [`MASK_NODATA`].
    pub fn from_data(
        width: u32,
        height: u32,
        data: Vec<u8>,
        transform: GeoTransform,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            return Err(Error::InvalidParameter(format!(
                "mask length {} doesn't match {}x{} = {}",
                data.len(),
                width,
                height,
                expected
            )));
        }
        if let Some(bad) = data.iter().find(|&&v| v > 1 && v != MASK_NODATA) {
            return Err(Error::InvalidParameter(format!(
                "mask value {bad} is not 0, 1 or no-data"
            )));
        }
        Ok(BinaryMask {
            inner: Arc::new(MaskData {
                width,
                height,
                transform,
                data,
            }),
        })
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

    /// Raw cell values
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.inner.data
    }

    /// Cell value at (x, y): `Some(0)`, `Some(1)` or `Some(MASK_NODATA)`.
    ///
    /// Returns `None` for out-of-bounds coordinates.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.inner.width || y >= self.inner.height {
            return None;
        }
        Some(self.inner.data[(y as usize) * (self.inner.width as usize) + (x as usize)])
    }

    /// Whether (x, y) is inside the mask and set to 1
    #[inline]
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.get(x, y) == Some(1)
    }

    /// Whether (x, y) is inside the mask and no-data
    #[inline]
    pub fn is_nodata(&self, x: u32, y: u32) -> bool {
        self.get(x, y) == Some(MASK_NODATA)
    }

    /// Number of cells set to 1
    pub fn count_ones(&self) -> u64 {
        self.inner.data.iter().filter(|&&v| v == 1).count() as u64
    }

    /// Number of no-data cells
    pub fn count_nodata(&self) -> u64 {
        self.inner.data.iter().filter(|&&v| v == MASK_NODATA).count() as u64
    }

    /// Whether `self` and `other` cover the same grid
    pub fn same_geometry(&self, other: &BinaryMask) -> bool {
        self.dimensions() == other.dimensions() && self.transform() == other.transform()
    }

    /// Whether `self` lies on the grid of `raster`
    pub fn matches_raster(&self, raster: &Raster) -> bool {
        self.dimensions() == raster.dimensions() && self.transform() == raster.transform()
    }

    /// Whether every set cell of `self` is also set in `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the grids differ.
    pub fn is_subset_of(&self, other: &BinaryMask) -> Result<bool> {
        self.check_same_size(other)?;
        Ok(self
            .inner
            .data
            .iter()
            .zip(other.inner.data.iter())
            .all(|(&a, &b)| a != 1 || b == 1))
    }

    /// Create a mutable copy of this mask.
    pub fn to_mut(&self) -> BinaryMaskMut {
        BinaryMaskMut {
            inner: (*self.inner).clone(),
        }
    }

    fn check_same_size(&self, other: &BinaryMask) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            });
        }
        Ok(())
    }
}

/// Mutable binary mask
#[derive(Debug)]
pub struct BinaryMaskMut {
    inner: MaskData,
}

impl BinaryMaskMut {
    /// Set the cell at (x, y) to 0 or 1 (any non-zero value stores 1).
    pub fn set(&mut self, x: u32, y: u32, on: bool) -> Result<()> {
        let idx = self.index(x, y)?;
        self.inner.data[idx] = on as u8;
        Ok(())
    }

    /// Mark the cell at (x, y) as no-data.
    pub fn set_nodata(&mut self, x: u32, y: u32) -> Result<()> {
        let idx = self.index(x, y)?;
        self.inner.data[idx] = MASK_NODATA;
        Ok(())
    }

    /// Mutable access to the raw cell values.
    ///
    /// Callers must only store 0, 1 or [`MASK_NODATA`].
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
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

impl From<BinaryMaskMut> for BinaryMask {
    fn from(mask_mut: BinaryMaskMut) -> Self {
        BinaryMask {
            inner: Arc::new(mask_mut.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_like_carries_nodata() {
        let raster = Raster::from_data(
            2,
            2,
            vec![1.0, f32::NAN, 3.0, 4.0],
            GeoTransform::default(),
        )
        .unwrap();
        let mask = BinaryMask::zeros_like(&raster);
        assert_eq!(mask.data(), &[0, MASK_NODATA, 0, 0]);
        assert!(mask.matches_raster(&raster));
        assert_eq!(mask.count_nodata(), 1);
    }

    #[test]
    fn test_from_data_rejects_bad_values() {
        let r = BinaryMask::from_data(2, 1, vec![0, 2], GeoTransform::default());
        assert!(r.is_err());
    }

    #[test]
    fn test_subset() {
        let gt = GeoTransform::default();
        let a = BinaryMask::from_data(3, 1, vec![1, 0, 0], gt).unwrap();
        let b = BinaryMask::from_data(3, 1, vec![1, 1, 0], gt).unwrap();
        assert!(a.is_subset_of(&b).unwrap());
        assert!(!b.is_subset_of(&a).unwrap());

        let c = BinaryMask::new(2, 2, gt).unwrap();
        assert!(a.is_subset_of(&c).is_err());
    }

    #[test]
    fn test_set_and_count() {
        let mut m = BinaryMask::new(3, 3, GeoTransform::default())
            .unwrap()
            .to_mut();
        m.set(1, 1, true).unwrap();
        m.set_nodata(2, 2).unwrap();
        assert!(m.set(3, 0, true).is_err());
        let m: BinaryMask = m.into();
        assert!(m.is_set(1, 1));
        assert!(m.is_nodata(2, 2));
        assert_eq!(m.count_ones(), 1);
    }
}
