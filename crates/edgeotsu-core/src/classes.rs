//! Classified edge grids
//!
//! An [`EdgeClasses`] grid labels every cell of an edge raster as not an
//! edge, a weak edge, a strong edge, or no-data. Connectivity filtering joins
//! neighboring edge cells only when they carry the same class.

use crate::error::{Error, Result};
use crate::mask::{BinaryMask, MASK_NODATA};
use crate::raster::GeoTransform;

/// Class of one cell in an edge grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EdgeClass {
    /// Not an edge
    #[default]
    None,
    /// Edge with strength below the weak-edge cutoff
    Weak,
    /// Edge at or above the weak-edge cutoff
    Strong,
    /// No-data
    NoData,
}

impl EdgeClass {
    /// Whether the cell is an edge of either class
    #[inline]
    pub fn is_edge(self) -> bool {
        matches!(self, EdgeClass::Weak | EdgeClass::Strong)
    }
}

/// Grid of [`EdgeClass`] values sharing a raster's geometry
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeClasses {
    width: u32,
    height: u32,
    transform: GeoTransform,
    data: Vec<EdgeClass>,
}

impl EdgeClasses {
    /// Create a grid from row-major classes.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions are zero or do not match the data.
    pub fn new(
        width: u32,
        height: u32,
        data: Vec<EdgeClass>,
        transform: GeoTransform,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            return Err(Error::InvalidParameter(format!(
                "class grid length {} doesn't match {}x{} = {}",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            transform,
            data,
        })
    }

    /// Grid where set mask cells are edges of `class`
    pub fn from_mask(mask: &BinaryMask, class: EdgeClass) -> Self {
        let data = mask
            .data()
            .iter()
            .map(|&v| match v {
                1 => class,
                MASK_NODATA => EdgeClass::NoData,
                _ => EdgeClass::None,
            })
            .collect();
        Self {
            width: mask.width(),
            height: mask.height(),
            transform: *mask.transform(),
            data,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Row-major classes
    #[inline]
    pub fn data(&self) -> &[EdgeClass] {
        &self.data
    }

    /// Class at (x, y), or `None` outside the grid
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<EdgeClass> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[(y as usize) * (self.width as usize) + (x as usize)])
    }

    /// Number of cells of the given class
    pub fn count(&self, class: EdgeClass) -> u64 {
        self.data.iter().filter(|&&c| c == class).count() as u64
    }

    /// Number of edge cells of either class
    pub fn edge_count(&self) -> u64 {
        self.data.iter().filter(|c| c.is_edge()).count() as u64
    }

    /// Mask of edge cells, carrying no-data
    pub fn to_mask(&self) -> Result<BinaryMask> {
        let data = self
            .data
            .iter()
            .map(|c| match c {
                EdgeClass::Weak | EdgeClass::Strong => 1,
                EdgeClass::NoData => MASK_NODATA,
                EdgeClass::None => 0,
            })
            .collect();
        BinaryMask::from_data(self.width, self.height, data, self.transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_round_trip_keeps_nodata() {
        let gt = GeoTransform::default();
        let mask = BinaryMask::from_data(3, 1, vec![1, 0, MASK_NODATA], gt).unwrap();
        let classes = EdgeClasses::from_mask(&mask, EdgeClass::Strong);
        assert_eq!(
            classes.data(),
            &[EdgeClass::Strong, EdgeClass::None, EdgeClass::NoData]
        );
        assert_eq!(classes.edge_count(), 1);
        assert_eq!(classes.to_mask().unwrap(), mask);
    }

    #[test]
    fn test_length_mismatch() {
        let r = EdgeClasses::new(2, 2, vec![EdgeClass::None; 3], GeoTransform::default());
        assert!(r.is_err());
    }
}
