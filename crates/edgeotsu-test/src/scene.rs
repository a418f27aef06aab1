//! Deterministic synthetic scenes
//!
//! Regression tests run on generated rasters rather than image files. Noise
//! comes from a fixed-seed linear congruential generator, so every scene is
//! reproducible bit for bit.

use crate::error::{TestError, TestResult};
use edgeotsu_core::{BinaryMask, GeoTransform, MASK_NODATA, Raster};

/// Simple linear congruential generator for reproducible noise
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        // LCG parameters from Numerical Recipes
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state
    }

    /// Uniform sample in `[0, 1)` from the high 53 bits
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform sample in `[lo, hi)`
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Triangular sample on `(center - half_width, center + half_width)`
    ///
    /// Sum of two uniforms: bounded support, single peak at `center`.
    pub fn triangular(&mut self, center: f64, half_width: f64) -> f64 {
        center + half_width * (self.next_f64() + self.next_f64() - 1.0)
    }
}

/// Two-class scene split vertically at the middle column
///
/// Columns left of `width / 2` draw from a triangular distribution around
/// `left_mean`, the rest around `right_mean`.
#[derive(Debug, Clone)]
pub struct SplitScene {
    pub width: u32,
    pub height: u32,
    /// Pixel size in physical units
    pub resolution: f64,
    pub left_mean: f64,
    pub right_mean: f64,
    /// Half-width of each class distribution
    pub spread: f64,
    pub seed: u64,
}

impl Default for SplitScene {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            resolution: 30.0,
            left_mean: -20.0,
            right_mean: -5.0,
            spread: 8.0,
            seed: 42,
        }
    }
}

impl SplitScene {
    /// Generate the raster
    pub fn build(&self) -> TestResult<Raster> {
        if self.width < 2 {
            return Err(TestError::InvalidScene(format!(
                "split scene needs at least 2 columns, got {}",
                self.width
            )));
        }
        let gt = GeoTransform::new(0.0, self.height as f64 * self.resolution, self.resolution)?;
        let mut rng = Lcg::new(self.seed);
        let half = self.width / 2;
        let raster = Raster::from_fn(self.width, self.height, gt, |x, _| {
            let center = if x < half {
                self.left_mean
            } else {
                self.right_mean
            };
            rng.triangular(center, self.spread) as f32
        })?;
        Ok(raster)
    }
}

/// Square scene with a centered disk of one class on a background of another
///
/// # Arguments
///
/// * `size` - Width and height in pixels
/// * `radius` - Disk radius in pixels
/// * `inside` / `outside` - Class centers
/// * `spread` - Half-width of each class distribution
/// * `seed` - Noise seed
pub fn disk_scene(
    size: u32,
    radius: f64,
    inside: f64,
    outside: f64,
    spread: f64,
    seed: u64,
) -> TestResult<Raster> {
    if !(radius > 0.0) {
        return Err(TestError::InvalidScene(format!(
            "disk radius must be positive, got {radius}"
        )));
    }
    let gt = GeoTransform::new(0.0, size as f64 * 10.0, 10.0)?;
    let c = size as f64 / 2.0;
    let mut rng = Lcg::new(seed);
    let raster = Raster::from_fn(size, size, gt, |x, y| {
        let dx = x as f64 + 0.5 - c;
        let dy = y as f64 + 0.5 - c;
        let center = if dx * dx + dy * dy < radius * radius {
            inside
        } else {
            outside
        };
        rng.triangular(center, spread) as f32
    })?;
    Ok(raster)
}

/// Build a mask from rows of text
///
/// `#` or `1` is set, `.` or `0` is clear, `x` is no-data. All rows must have
/// the same length.
pub fn mask_from_ascii(rows: &[&str], transform: GeoTransform) -> TestResult<BinaryMask> {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |r| r.chars().count()) as u32;
    let mut data = Vec::with_capacity((width * height) as usize);
    for (y, row) in rows.iter().enumerate() {
        if row.chars().count() as u32 != width {
            return Err(TestError::InvalidScene(format!(
                "row {y} has length {}, expected {width}",
                row.chars().count()
            )));
        }
        for ch in row.chars() {
            data.push(match ch {
                '#' | '1' => 1,
                '.' | '0' => 0,
                'x' => MASK_NODATA,
                other => {
                    return Err(TestError::InvalidScene(format!(
                        "unexpected mask character {other:?}"
                    )));
                }
            });
        }
    }
    Ok(BinaryMask::from_data(width, height, data, transform)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcg_reproducible() {
        let mut a = Lcg::new(7);
        let mut b = Lcg::new(7);
        for _ in 0..100 {
            let v = a.next_f64();
            assert_eq!(v, b.next_f64());
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_triangular_bounds() {
        let mut rng = Lcg::new(1);
        for _ in 0..1000 {
            let v = rng.triangular(-20.0, 8.0);
            assert!(v > -28.0 && v < -12.0);
        }
    }

    #[test]
    fn test_split_scene_classes() {
        let scene = SplitScene {
            width: 8,
            height: 4,
            ..SplitScene::default()
        };
        let raster = scene.build().unwrap();
        assert_eq!(raster.dimensions(), (8, 4));
        assert_eq!(raster.resolution(), 30.0);
        assert!(raster.get(0, 0).unwrap() < -12.0);
        assert!(raster.get(7, 3).unwrap() > -13.0);
    }

    #[test]
    fn test_mask_from_ascii() {
        let m = mask_from_ascii(&["#.x", "..#"], GeoTransform::default()).unwrap();
        assert_eq!(m.data(), &[1, 0, MASK_NODATA, 0, 0, 1]);
        assert!(mask_from_ascii(&["#.", "#"], GeoTransform::default()).is_err());
        assert!(mask_from_ascii(&["#?"], GeoTransform::default()).is_err());
    }
}
