//! Regions - geometric boundaries that restrict reductions
//!
//! A [`Region`] is expressed in the physical coordinate space of the raster
//! it is applied to. A cell belongs to a region when its center lies inside
//! the region's boundary.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};

/// Clipped pixel rectangle `[x0, x1) × [y0, y1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelBounds {
    /// Width in pixels
    #[inline]
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    /// Height in pixels
    #[inline]
    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    /// Number of pixels visited when sampling every `factor`-th row and column
    pub fn sampled_count(&self, factor: u32) -> u64 {
        let factor = factor.max(1);
        u64::from(self.width().div_ceil(factor)) * u64::from(self.height().div_ceil(factor))
    }
}

/// Geometric boundary used to restrict reductions
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    /// The whole raster
    Full,
    /// Axis-aligned rectangle in physical coordinates
    Rect {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },
    /// Closed polygon ring in physical coordinates (even-odd rule)
    Polygon(Vec<(f64, f64)>),
}

impl Region {
    /// Create a rectangular region.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if a coordinate is not finite or
    /// the rectangle is empty.
    pub fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidParameter(
                "region coordinates must be finite".to_string(),
            ));
        }
        if min_x >= max_x || min_y >= max_y {
            return Err(Error::InvalidParameter(format!(
                "empty region rectangle: x {min_x}..{max_x}, y {min_y}..{max_y}"
            )));
        }
        Ok(Region::Rect {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Create a polygon region from its vertices.
    ///
    /// The ring is closed implicitly; a repeated closing vertex is accepted.
    pub fn polygon(vertices: Vec<(f64, f64)>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(Error::InvalidParameter(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if !vertices.iter().all(|(x, y)| x.is_finite() && y.is_finite()) {
            return Err(Error::InvalidParameter(
                "polygon vertices must be finite".to_string(),
            ));
        }
        Ok(Region::Polygon(vertices))
    }

    /// Whether the physical point (x, y) lies inside the region
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        match self {
            Region::Full => true,
            Region::Rect {
                min_x,
                min_y,
                max_x,
                max_y,
            } => x >= *min_x && x < *max_x && y >= *min_y && y < *max_y,
            Region::Polygon(ring) => point_in_ring(ring, x, y),
        }
    }

    /// Whether the center of cell (col, row) lies inside the region
    #[inline]
    pub fn contains_cell(&self, transform: &GeoTransform, col: u32, row: u32) -> bool {
        match self {
            Region::Full => true,
            _ => {
                let (x, y) = transform.cell_center(col, row);
                self.contains_point(x, y)
            }
        }
    }

    /// Pixel bounding box of the region clipped to `raster`.
    ///
    /// Returns `None` if the region does not overlap the raster.
    pub fn pixel_bounds(&self, raster: &Raster) -> Option<PixelBounds> {
        let (w, h) = raster.dimensions();
        let (min_x, min_y, max_x, max_y) = match self {
            Region::Full => {
                return Some(PixelBounds {
                    x0: 0,
                    y0: 0,
                    x1: w,
                    y1: h,
                });
            }
            Region::Rect {
                min_x,
                min_y,
                max_x,
                max_y,
            } => (*min_x, *min_y, *max_x, *max_y),
            Region::Polygon(ring) => ring.iter().fold(
                (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
                |(ax, ay, bx, by), &(x, y)| (ax.min(x), ay.min(y), bx.max(x), by.max(y)),
            ),
        };

        // y grows downward in pixel space, so max_y maps to the top row
        let gt = raster.transform();
        let (c0, r0) = gt.to_pixel(min_x, max_y);
        let (c1, r1) = gt.to_pixel(max_x, min_y);
        let x0 = c0.floor().max(0.0);
        let y0 = r0.floor().max(0.0);
        let x1 = c1.ceil().min(w as f64);
        let y1 = r1.ceil().min(h as f64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(PixelBounds {
            x0: x0 as u32,
            y0: y0 as u32,
            x1: x1 as u32,
            y1: y1 as u32,
        })
    }
}

/// Even-odd point-in-polygon test
fn point_in_ring(ring: &[(f64, f64)], x: f64, y: f64) -> bool {
    let mut inside = false;
    let n = ring.len();
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster_10x10() -> Raster {
        // 10x10 pixels of 30 m, upper-left corner at (0, 300)
        Raster::new(10, 10, GeoTransform::new(0.0, 300.0, 30.0).unwrap()).unwrap()
    }

    #[test]
    fn test_full_bounds() {
        let r = raster_10x10();
        let b = Region::Full.pixel_bounds(&r).unwrap();
        assert_eq!((b.x0, b.y0, b.x1, b.y1), (0, 0, 10, 10));
        assert_eq!(b.sampled_count(1), 100);
        assert_eq!(b.sampled_count(3), 16);
    }

    #[test]
    fn test_rect_bounds_clipped() {
        let r = raster_10x10();
        let region = Region::rect(-100.0, 200.0, 90.0, 1000.0).unwrap();
        let b = region.pixel_bounds(&r).unwrap();
        assert_eq!((b.x0, b.y0, b.x1, b.y1), (0, 0, 3, 4));
    }

    #[test]
    fn test_rect_outside_raster() {
        let r = raster_10x10();
        let region = Region::rect(1000.0, 1000.0, 2000.0, 2000.0).unwrap();
        assert!(region.pixel_bounds(&r).is_none());
    }

    #[test]
    fn test_polygon_contains() {
        let tri = Region::polygon(vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]).unwrap();
        assert!(tri.contains_point(2.0, 2.0));
        assert!(!tri.contains_point(8.0, 8.0));
        assert!(!tri.contains_point(-1.0, 2.0));
    }

    #[test]
    fn test_contains_cell_uses_center() {
        let r = raster_10x10();
        // Covers only the left half of the first column's cells
        let region = Region::rect(0.0, 0.0, 14.0, 300.0).unwrap();
        assert!(!region.contains_cell(r.transform(), 0, 0));
        let region = Region::rect(0.0, 0.0, 16.0, 300.0).unwrap();
        assert!(region.contains_cell(r.transform(), 0, 0));
    }

    #[test]
    fn test_invalid_regions() {
        assert!(Region::rect(1.0, 0.0, 1.0, 5.0).is_err());
        assert!(Region::rect(f64::NAN, 0.0, 1.0, 5.0).is_err());
        assert!(Region::polygon(vec![(0.0, 0.0), (1.0, 1.0)]).is_err());
    }
}
