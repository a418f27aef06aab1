//! Histogram reduction over a region
//!
//! Builds a bucketed histogram of raster samples inside a [`Region`],
//! optionally restricted by a sampling [`BinaryMask`]. Each histogram
//! reduction is a materialization point: the pixel budget and the cancel
//! token of the [`ReductionContext`] are checked before any sample is read,
//! and the cancel token is polled again while rows are scanned.
//!
//! Bucket means are the bucket midpoints, so they are strictly increasing
//! regardless of which buckets are populated.

use crate::budget::ReductionContext;
use crate::error::{Error, Result};
use crate::mask::BinaryMask;
use crate::raster::Raster;
use crate::region::{PixelBounds, Region};

/// Largest number of buckets a single histogram may hold
pub const MAX_BUCKETS: usize = 1 << 20;

/// Sampled rows between two cancellation checks
const ROWS_PER_CHECK: u32 = 64;

/// Options for histogram reduction
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramOptions {
    /// Number of buckets when `bucket_width` is not fixed
    pub bucket_count: u32,
    /// Fixed bucket width; derived from the value range when `None`
    pub bucket_width: Option<f64>,
    /// Fixed lower bound; the smallest sample when `None`
    pub min: Option<f64>,
    /// Fixed upper bound; the largest sample when `None`
    pub max: Option<f64>,
    /// Reduction scale in physical units per pixel; native when `None`
    pub resolution: Option<f64>,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            bucket_count: 255,
            bucket_width: None,
            min: None,
            max: None,
            resolution: None,
        }
    }
}

impl HistogramOptions {
    /// Options with `bucket_count` buckets over the sample range
    pub fn with_buckets(bucket_count: u32) -> Self {
        Self {
            bucket_count,
            ..Self::default()
        }
    }

    /// Set the reduction resolution
    pub fn at_resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Fix the value range covered by the buckets
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.bucket_width.is_none() && self.bucket_count == 0 {
            return Err(Error::InvalidParameter(
                "bucket count must be >= 1".to_string(),
            ));
        }
        if let Some(w) = self.bucket_width
            && !(w.is_finite() && w > 0.0)
        {
            return Err(Error::InvalidParameter(format!(
                "bucket width must be positive and finite, got {w}"
            )));
        }
        if let (Some(lo), Some(hi)) = (self.min, self.max)
            && !(lo.is_finite() && hi.is_finite() && lo <= hi)
        {
            return Err(Error::InvalidParameter(format!(
                "invalid histogram range {lo}..{hi}"
            )));
        }
        if let Some(r) = self.resolution
            && !(r.is_finite() && r > 0.0)
        {
            return Err(Error::InvalidParameter(format!(
                "resolution must be positive and finite, got {r}"
            )));
        }
        Ok(())
    }
}

/// Bucketed histogram of `(mean, count)` pairs
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    means: Vec<f64>,
    counts: Vec<u64>,
    /// Nominal bucket width (0 for a single-bucket histogram)
    bucket_width: f64,
}

impl Histogram {
    /// Create a histogram from explicit buckets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the slices are empty, differ in
    /// length, hold non-finite means, or the means are not strictly increasing.
    pub fn from_buckets(means: Vec<f64>, counts: Vec<u64>) -> Result<Self> {
        if means.is_empty() || means.len() != counts.len() {
            return Err(Error::InvalidParameter(format!(
                "histogram needs matching non-empty means/counts, got {} and {}",
                means.len(),
                counts.len()
            )));
        }
        if !means.iter().all(|m| m.is_finite()) {
            return Err(Error::InvalidParameter(
                "bucket means must be finite".to_string(),
            ));
        }
        if means.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidParameter(
                "bucket means must be strictly increasing".to_string(),
            ));
        }
        let bucket_width = if means.len() > 1 {
            (means[means.len() - 1] - means[0]) / (means.len() - 1) as f64
        } else {
            0.0
        };
        Ok(Self {
            means,
            counts,
            bucket_width,
        })
    }

    /// Number of buckets
    #[inline]
    pub fn len(&self) -> usize {
        self.means.len()
    }

    /// Whether there are no buckets; never true for a histogram built by
    /// [`from_buckets`](Self::from_buckets) or the histogram reductions
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// Bucket means, strictly increasing
    #[inline]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Bucket counts
    #[inline]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Nominal bucket width
    #[inline]
    pub fn bucket_width(&self) -> f64 {
        self.bucket_width
    }

    /// Lower edge of the first bucket
    #[inline]
    pub fn min(&self) -> f64 {
        self.means[0] - 0.5 * self.bucket_width
    }

    /// Iterate over `(mean, count)` pairs
    pub fn buckets(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.means.iter().copied().zip(self.counts.iter().copied())
    }

    /// Total number of samples
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Number of buckets holding at least one sample
    pub fn non_empty_buckets(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Count-weighted mean of the bucket means, or `None` when empty
    pub fn mean_value(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let sum: f64 = self.buckets().map(|(m, c)| m * c as f64).sum();
        Some(sum / total as f64)
    }
}

/// Subsampling factor for reducing a raster of native resolution
/// `native` at `resolution`.
///
/// Resolutions finer than the native grid use every pixel.
pub fn subsample_factor(native: f64, resolution: f64) -> u32 {
    let ratio = (resolution / native).round();
    if ratio.is_finite() && ratio > 1.0 {
        ratio.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

/// Build a histogram of all valid samples of `raster` inside `region`.
///
/// # Errors
///
/// - [`Error::InvalidParameter`] for inconsistent options
/// - [`Error::ResourceBudgetExceeded`] if the region is over budget
/// - [`Error::EmptyRegion`] if no valid sample lies in the region
/// - [`Error::Cancelled`] / [`Error::TimedOut`] if the context fires
pub fn build_histogram(
    raster: &Raster,
    region: &Region,
    options: &HistogramOptions,
    ctx: &ReductionContext,
) -> Result<Histogram> {
    let samples = collect_samples(raster, region, None, options, ctx)?;
    bucketize(&samples, options)
}

/// Build a histogram restricted to the cells set in `mask`.
///
/// Cells where the mask is 0 or no-data are skipped.
///
/// # Errors
///
/// As [`build_histogram`], plus [`Error::DimensionMismatch`] if `mask` is
/// not on the grid of `raster`.
pub fn build_histogram_masked(
    raster: &Raster,
    region: &Region,
    mask: &BinaryMask,
    options: &HistogramOptions,
    ctx: &ReductionContext,
) -> Result<Histogram> {
    let samples = collect_samples(raster, region, Some(mask), options, ctx)?;
    bucketize(&samples, options)
}

/// Count the valid samples of `raster` inside `region` (and `mask`, if given)
/// at the options' resolution.
///
/// This is the pixel-count reduction; it is guarded like a histogram.
pub fn count_samples(
    raster: &Raster,
    region: &Region,
    mask: Option<&BinaryMask>,
    options: &HistogramOptions,
    ctx: &ReductionContext,
) -> Result<u64> {
    options.validate()?;
    let Some((bounds, factor)) = prepare(raster, region, mask, options, ctx)? else {
        return Ok(0);
    };
    let mut count = 0u64;
    scan(raster, region, mask, bounds, factor, ctx, |_| count += 1)?;
    Ok(count)
}

fn collect_samples(
    raster: &Raster,
    region: &Region,
    mask: Option<&BinaryMask>,
    options: &HistogramOptions,
    ctx: &ReductionContext,
) -> Result<Vec<f32>> {
    options.validate()?;
    let Some((bounds, factor)) = prepare(raster, region, mask, options, ctx)? else {
        return Err(Error::EmptyRegion);
    };
    let mut samples = Vec::new();
    scan(raster, region, mask, bounds, factor, ctx, |v| samples.push(v))?;
    if samples.is_empty() {
        return Err(Error::EmptyRegion);
    }
    log::debug!(
        "reduced {} samples from {}x{} px bounds at factor {}",
        samples.len(),
        bounds.width(),
        bounds.height(),
        factor
    );
    Ok(samples)
}

/// Validate geometry and run the materialization checkpoint.
///
/// Returns `None` when the region does not overlap the raster.
fn prepare(
    raster: &Raster,
    region: &Region,
    mask: Option<&BinaryMask>,
    options: &HistogramOptions,
    ctx: &ReductionContext,
) -> Result<Option<(PixelBounds, u32)>> {
    if let Some(mask) = mask
        && mask.dimensions() != raster.dimensions()
    {
        return Err(Error::DimensionMismatch {
            expected: raster.dimensions(),
            actual: mask.dimensions(),
        });
    }
    let factor = options
        .resolution
        .map_or(1, |r| subsample_factor(raster.resolution(), r));
    let Some(bounds) = region.pixel_bounds(raster) else {
        ctx.cancel.check()?;
        return Ok(None);
    };
    ctx.checkpoint(bounds.sampled_count(factor))?;
    Ok(Some((bounds, factor)))
}

fn scan<F>(
    raster: &Raster,
    region: &Region,
    mask: Option<&BinaryMask>,
    bounds: PixelBounds,
    factor: u32,
    ctx: &ReductionContext,
    mut visit: F,
) -> Result<()>
where
    F: FnMut(f32),
{
    let gt = raster.transform();
    for (i, y) in (bounds.y0..bounds.y1).step_by(factor as usize).enumerate() {
        if i as u32 % ROWS_PER_CHECK == 0 {
            ctx.cancel.check()?;
        }
        let row = raster.row(y);
        for x in (bounds.x0..bounds.x1).step_by(factor as usize) {
            let v = row[x as usize];
            if !raster.is_valid_value(v) {
                continue;
            }
            if mask.is_some_and(|m| !m.is_set(x, y)) {
                continue;
            }
            if !region.contains_cell(gt, x, y) {
                continue;
            }
            visit(v);
        }
    }
    Ok(())
}

fn bucketize(samples: &[f32], options: &HistogramOptions) -> Result<Histogram> {
    let (smin, smax) = samples
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &v| {
            (lo.min(v as f64), hi.max(v as f64))
        });
    let lo = options.min.unwrap_or(smin);
    let hi = options.max.unwrap_or(smax).max(lo);

    let (n, width) = match options.bucket_width {
        Some(w) => {
            let n = ((hi - lo) / w).floor() + 1.0;
            if n > MAX_BUCKETS as f64 {
                return Err(Error::InvalidParameter(format!(
                    "bucket width {w} over {lo}..{hi} needs more than {MAX_BUCKETS} buckets"
                )));
            }
            (n as usize, w)
        }
        None if hi > lo => {
            let n = options.bucket_count as usize;
            (n, (hi - lo) / n as f64)
        }
        None => (1, 0.0),
    };

    if n == 1 {
        let mean = if width > 0.0 { lo + 0.5 * width } else { lo };
        return Ok(Histogram {
            means: vec![mean],
            counts: vec![samples.len() as u64],
            bucket_width: width,
        });
    }

    let mut counts = vec![0u64; n];
    let last = (n - 1) as f64;
    for &v in samples {
        // Out-of-range samples fall into the end buckets so that the total
        // always equals the number of valid samples.
        let idx = ((v as f64 - lo) / width).floor().clamp(0.0, last) as usize;
        counts[idx] += 1;
    }
    let means = (0..n).map(|i| lo + (i as f64 + 0.5) * width).collect();
    Ok(Histogram {
        means,
        counts,
        bucket_width: width,
    })
}
