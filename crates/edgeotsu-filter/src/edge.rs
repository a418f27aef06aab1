//! Canny edge detection
//!
//! Stages:
//!
//! 1. Gaussian smoothing over valid cells ([`gaussian_smooth`])
//! 2. Unnormalized 3x3 Sobel gradient; no-data and out-of-raster neighbors
//!    take the center value
//! 3. Non-maximum suppression along the gradient direction quantized to four
//!    sectors (ties, up to rounding, are kept)
//! 4. Hysteresis: magnitude `>= high` is an edge, `< low` is discarded, and
//!    anything in between is kept only when 8-connected to an edge
//!
//! The result is an [`EdgeMap`] holding the gradient magnitude at edge cells
//! and 0 elsewhere.

use crate::convolve::gaussian_smooth;
use crate::kernel::Kernel;
use crate::{FilterError, FilterResult};
use edgeotsu_core::maybe_rayon::*;
use edgeotsu_core::{BinaryMask, EdgeClass, EdgeClasses, MASK_NODATA, Raster};

/// Options for [`canny`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyOptions {
    /// Gaussian standard deviation in pixels; 0 disables smoothing
    pub sigma: f64,
    /// Hysteresis high threshold
    pub high: f64,
    /// Hysteresis low threshold
    pub low: f64,
}

impl Default for CannyOptions {
    fn default() -> Self {
        Self {
            sigma: 0.5,
            high: 1.0,
            low: 0.5,
        }
    }
}

impl CannyOptions {
    pub fn new(sigma: f64, high: f64, low: f64) -> Self {
        Self { sigma, high, low }
    }

    /// Check that `0 <= low <= high` and `sigma >= 0`.
    pub fn validate(&self) -> FilterResult<()> {
        if !(self.sigma.is_finite() && self.sigma >= 0.0) {
            return Err(FilterError::InvalidParameters(format!(
                "canny sigma must be finite and >= 0, got {}",
                self.sigma
            )));
        }
        if !(self.low.is_finite() && self.high.is_finite()) {
            return Err(FilterError::InvalidParameters(
                "canny thresholds must be finite".to_string(),
            ));
        }
        if self.low < 0.0 || self.low > self.high {
            return Err(FilterError::InvalidParameters(format!(
                "canny thresholds need 0 <= low <= high, got low {} high {}",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

/// Edge-strength raster produced by [`canny`]
///
/// Edge cells hold their gradient magnitude (always > 0), other valid cells
/// hold 0, and no-data cells of the input stay no-data.
#[derive(Debug, Clone)]
pub struct EdgeMap {
    strength: Raster,
}

impl EdgeMap {
    /// The underlying strength raster
    #[inline]
    pub fn strength(&self) -> &Raster {
        &self.strength
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.strength.dimensions()
    }

    /// Strength at (x, y), or `None` for no-data and out-of-bounds cells
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        self.strength.get(x, y)
    }

    /// Whether (x, y) is an edge cell
    #[inline]
    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        self.get(x, y).is_some_and(|s| s > 0.0)
    }

    /// Number of edge cells
    pub fn edge_count(&self) -> u64 {
        self.strength.data().iter().filter(|&&s| s > 0.0).count() as u64
    }

    /// Binary edge mask, carrying no-data
    pub fn to_mask(&self) -> FilterResult<BinaryMask> {
        let data = self
            .strength
            .data()
            .iter()
            .map(|&s| {
                if !self.strength.is_valid_value(s) {
                    MASK_NODATA
                } else {
                    u8::from(s > 0.0)
                }
            })
            .collect();
        let (w, h) = self.dimensions();
        Ok(BinaryMask::from_data(w, h, data, *self.strength.transform())?)
    }

    /// Label each edge cell weak (strength `< cutoff`) or strong.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidParameters`] if `cutoff` is not finite.
    pub fn weak_strong_classes(&self, cutoff: f64) -> FilterResult<EdgeClasses> {
        if !cutoff.is_finite() {
            return Err(FilterError::InvalidParameters(format!(
                "weak edge cutoff must be finite, got {cutoff}"
            )));
        }
        let data = self
            .strength
            .data()
            .iter()
            .map(|&s| {
                if !self.strength.is_valid_value(s) {
                    EdgeClass::NoData
                } else if s <= 0.0 {
                    EdgeClass::None
                } else if (s as f64) < cutoff {
                    EdgeClass::Weak
                } else {
                    EdgeClass::Strong
                }
            })
            .collect();
        let (w, h) = self.dimensions();
        Ok(EdgeClasses::new(w, h, data, *self.strength.transform())?)
    }
}

/// Relative slack under which two magnitudes count as tied in suppression.
/// Smoothed values are `f32`, so mirror-image magnitudes agree only to a few
/// `f32` ulps.
const TIE_TOLERANCE: f64 = 4.0 * f32::EPSILON as f64;

/// Gradient components and magnitude, row-major
struct Gradient {
    gx: Vec<f64>,
    gy: Vec<f64>,
    magnitude: Vec<f64>,
}

/// Detect edges in `raster`.
///
/// # Errors
///
/// Returns [`FilterError::InvalidParameters`] for invalid options.
pub fn canny(raster: &Raster, options: &CannyOptions) -> FilterResult<EdgeMap> {
    options.validate()?;

    let smoothed = gaussian_smooth(raster, options.sigma)?;
    let grad = sobel(&smoothed);
    let (w, h) = raster.dimensions();
    let valid: Vec<bool> = raster
        .data()
        .iter()
        .map(|&v| raster.is_valid_value(v))
        .collect();

    let maxima = non_max_suppression(&grad, &valid, w as usize, h as usize);
    let edges = hysteresis(&grad.magnitude, &maxima, w as usize, h as usize, options);

    let data: Vec<f32> = (0..edges.len())
        .map(|i| {
            if !valid[i] {
                f32::NAN
            } else if edges[i] {
                grad.magnitude[i] as f32
            } else {
                0.0
            }
        })
        .collect();
    let strength = Raster::from_data(w, h, data, *raster.transform())?;
    let edge_map = EdgeMap { strength };
    log::debug!(
        "canny: {} edge cells in {}x{} (sigma {}, low {}, high {})",
        edge_map.edge_count(),
        w,
        h,
        options.sigma,
        options.low,
        options.high
    );
    Ok(edge_map)
}

/// Detect the boundaries of a binary classification.
///
/// Set cells count as 1, clear cells as 0; no-data cells carry no weight.
pub fn canny_mask(mask: &BinaryMask, options: &CannyOptions) -> FilterResult<EdgeMap> {
    let data = mask
        .data()
        .iter()
        .map(|&v| match v {
            MASK_NODATA => f32::NAN,
            v => v as f32,
        })
        .collect();
    let (w, h) = mask.dimensions();
    let raster = Raster::from_data(w, h, data, *mask.transform())?;
    canny(&raster, options)
}

/// Sobel gradient magnitude of `raster`, no-data preserved.
pub fn gradient_magnitude(raster: &Raster) -> FilterResult<Raster> {
    let grad = sobel(raster);
    let data = raster
        .data()
        .iter()
        .zip(&grad.magnitude)
        .map(|(&v, &m)| if raster.is_valid_value(v) { m as f32 } else { f32::NAN })
        .collect();
    let (w, h) = raster.dimensions();
    Ok(Raster::from_data(w, h, data, *raster.transform())?)
}

fn sobel(raster: &Raster) -> Gradient {
    let kx = Kernel::sobel_horizontal();
    let ky = Kernel::sobel_vertical();
    let (w, h) = raster.dimensions();

    let rows: Vec<Vec<(f64, f64)>> = (0..h)
        .into_par_iter()
        .map(|y| {
            (0..w)
                .map(|x| {
                    let Some(center) = raster.get(x, y) else {
                        return (0.0, 0.0);
                    };
                    let mut gx = 0.0;
                    let mut gy = 0.0;
                    for j in 0..3u32 {
                        for i in 0..3u32 {
                            let nx = x as i64 + i as i64 - 1;
                            let ny = y as i64 + j as i64 - 1;
                            let v = if nx < 0 || ny < 0 {
                                center
                            } else {
                                raster.get(nx as u32, ny as u32).unwrap_or(center)
                            };
                            let v = v as f64;
                            gx += kx.get(i, j).unwrap_or(0.0) as f64 * v;
                            gy += ky.get(i, j).unwrap_or(0.0) as f64 * v;
                        }
                    }
                    (gx, gy)
                })
                .collect()
        })
        .collect();

    let n = (w as usize) * (h as usize);
    let mut grad = Gradient {
        gx: Vec::with_capacity(n),
        gy: Vec::with_capacity(n),
        magnitude: Vec::with_capacity(n),
    };
    for (gx, gy) in rows.into_iter().flatten() {
        grad.gx.push(gx);
        grad.gy.push(gy);
        grad.magnitude.push(gx.hypot(gy));
    }
    grad
}

/// Neighbor offsets along the gradient direction, quantized to 4 sectors
fn direction_offsets(gx: f64, gy: f64) -> (i64, i64) {
    let mut angle = gy.atan2(gx).to_degrees();
    if angle < 0.0 {
        angle += 180.0;
    }
    if !(22.5..157.5).contains(&angle) {
        (1, 0)
    } else if angle < 67.5 {
        (1, 1)
    } else if angle < 112.5 {
        (0, 1)
    } else {
        (-1, 1)
    }
}

fn non_max_suppression(grad: &Gradient, valid: &[bool], w: usize, h: usize) -> Vec<bool> {
    let mag_at = |x: i64, y: i64| -> f64 {
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            return 0.0;
        }
        let i = y as usize * w + x as usize;
        if valid[i] { grad.magnitude[i] } else { 0.0 }
    };

    let rows: Vec<Vec<bool>> = (0..h)
        .into_par_iter()
        .map(|y| {
            (0..w)
                .map(|x| {
                    let i = y * w + x;
                    let m = grad.magnitude[i];
                    if !valid[i] || m <= 0.0 {
                        return false;
                    }
                    let (dx, dy) = direction_offsets(grad.gx[i], grad.gy[i]);
                    let (xi, yi) = (x as i64, y as i64);
                    let floor = m * (1.0 + TIE_TOLERANCE);
                    floor >= mag_at(xi + dx, yi + dy) && floor >= mag_at(xi - dx, yi - dy)
                })
                .collect()
        })
        .collect();
    rows.concat()
}

fn hysteresis(
    magnitude: &[f64],
    maxima: &[bool],
    w: usize,
    h: usize,
    options: &CannyOptions,
) -> Vec<bool> {
    let candidate: Vec<bool> = maxima
        .iter()
        .zip(magnitude)
        .map(|(&m, &g)| m && g >= options.low)
        .collect();
    let mut edges = vec![false; candidate.len()];
    let mut stack: Vec<usize> = Vec::new();
    for (i, &c) in candidate.iter().enumerate() {
        if c && magnitude[i] >= options.high {
            edges[i] = true;
            stack.push(i);
        }
    }

    while let Some(i) = stack.pop() {
        let (x, y) = ((i % w) as i64, (i / w) as i64);
        for dy in -1..=1i64 {
            for dx in -1..=1i64 {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                    continue;
                }
                let n = ny as usize * w + nx as usize;
                if candidate[n] && !edges[n] {
                    edges[n] = true;
                    stack.push(n);
                }
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeotsu_core::GeoTransform;

    fn step(width: u32, height: u32, at: u32) -> Raster {
        Raster::from_fn(width, height, GeoTransform::default(), |x, _| {
            if x < at { 0.0 } else { 1.0 }
        })
        .unwrap()
    }

    #[test]
    fn test_vertical_step() {
        let r = step(10, 6, 5);
        let opts = CannyOptions::new(0.0, 1.0, 0.5);
        let edges = canny(&r, &opts).unwrap();
        // Unsmoothed step: columns 4 and 5 share the maximum magnitude 4
        for y in 1..5 {
            assert_eq!(edges.get(4, y), Some(4.0));
            assert_eq!(edges.get(5, y), Some(4.0));
            assert!(!edges.is_edge(3, y));
            assert!(!edges.is_edge(6, y));
        }
        assert!(!edges.is_edge(0, 0));
    }

    #[test]
    fn test_smoothed_step_keeps_both_columns() {
        let r = step(32, 32, 16);
        let edges = canny(&r, &CannyOptions::default()).unwrap();
        assert_eq!(edges.edge_count(), 64);
        for y in 0..32 {
            assert!(edges.is_edge(15, y) && edges.is_edge(16, y), "row {y}");
        }
    }

    #[test]
    fn test_flat_has_no_edges() {
        let r = Raster::filled(8, 8, -12.0, GeoTransform::default()).unwrap();
        let edges = canny(&r, &CannyOptions::default()).unwrap();
        assert_eq!(edges.edge_count(), 0);
    }

    #[test]
    fn test_hysteresis_drops_isolated_weak() {
        let mag = vec![0.0, 0.7, 0.0, 2.0, 0.7, 0.0];
        let maxima = vec![false, true, false, true, true, false];
        let opts = CannyOptions::new(0.0, 1.0, 0.5);
        // 6x1 row: index 1 is weak and isolated, index 4 is weak next to strong 3
        let edges = hysteresis(&mag, &maxima, 6, 1, &opts);
        assert_eq!(edges, vec![false, false, false, true, true, false]);
    }

    #[test]
    fn test_direction_sectors() {
        assert_eq!(direction_offsets(1.0, 0.0), (1, 0));
        assert_eq!(direction_offsets(-1.0, 0.0), (1, 0));
        assert_eq!(direction_offsets(1.0, 1.0), (1, 1));
        assert_eq!(direction_offsets(0.0, 1.0), (0, 1));
        assert_eq!(direction_offsets(0.0, -1.0), (0, 1));
        assert_eq!(direction_offsets(-1.0, 1.0), (-1, 1));
    }

    #[test]
    fn test_nodata_preserved_and_classes() {
        let mut r = step(10, 6, 5).to_mut();
        r.set_nodata(0, 0).unwrap();
        let r: Raster = r.into();
        let edges = canny(&r, &CannyOptions::new(0.0, 1.0, 0.5)).unwrap();
        assert_eq!(edges.get(0, 0), None);

        let classes = edges.weak_strong_classes(5.0).unwrap();
        assert_eq!(classes.get(0, 0), Some(EdgeClass::NoData));
        assert_eq!(classes.get(4, 2), Some(EdgeClass::Weak));
        assert_eq!(classes.get(1, 2), Some(EdgeClass::None));
        let classes = edges.weak_strong_classes(0.05).unwrap();
        assert_eq!(classes.get(4, 2), Some(EdgeClass::Strong));

        let mask = edges.to_mask().unwrap();
        assert_eq!(mask.get(0, 0), Some(MASK_NODATA));
        assert_eq!(mask.get(5, 3), Some(1));
    }

    #[test]
    fn test_invalid_options() {
        let r = step(4, 4, 2);
        assert!(canny(&r, &CannyOptions::new(-1.0, 1.0, 0.5)).is_err());
        assert!(canny(&r, &CannyOptions::new(0.5, 0.5, 1.0)).is_err());
        assert!(canny(&r, &CannyOptions::new(0.5, 1.0, -0.1)).is_err());
    }

    #[test]
    fn test_canny_mask_square() {
        let gt = GeoTransform::default();
        let mut m = BinaryMask::new(12, 12, gt).unwrap().to_mut();
        for y in 4..8 {
            for x in 4..8 {
                m.set(x, y, true).unwrap();
            }
        }
        let m: BinaryMask = m.into();
        let edges = canny_mask(&m, &CannyOptions::default()).unwrap();
        assert!(edges.edge_count() > 0);
        assert!(!edges.is_edge(0, 0));
        assert!(!edges.is_edge(11, 11));
    }
}
