//! Edge-guided adaptive thresholding
//!
//! The refiner runs two Otsu passes. The global pass thresholds the whole
//! region; its classification is only used to find class boundaries. Edges
//! of that classification are cleaned of short fragments and buffered, and
//! the adaptive pass thresholds again using only samples near the
//! boundaries, where both classes are represented in similar proportion.
//!
//! ```text
//! GlobalPass -> PreliminaryClassified -> EdgesDetected -> EdgesFiltered
//!            -> Buffered -> AdaptivePass -> Done
//! ```
//!
//! Histogram reductions and the edge pixel count are materialization
//! points: each checks the pixel budget and the cancel token before reading
//! any pixel. Every other stage is a pure transform of the previous result.

use crate::bands::BandStack;
use crate::config::RefineConfig;
use crate::error::{Pass, RefineError, RefineResult};
use edgeotsu_core::{
    BinaryMask, CancelToken, Histogram, HistogramOptions, Raster, ReductionBudget,
    ReductionContext, Region, build_histogram, build_histogram_masked, count_samples,
};
use edgeotsu_filter::canny_mask;
use edgeotsu_region::{buffer_edges, filter_edges};
use edgeotsu_threshold::{Threshold, apply_threshold_in, otsu_threshold};
use log::{debug, info, warn};
use std::fmt;

/// Adaptive samples below this count give an unreliable threshold
const SMALL_ADAPTIVE_SAMPLE: u64 = 100;

/// Stage of a refinement run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineState {
    GlobalPass,
    PreliminaryClassified,
    EdgesDetected,
    EdgesFiltered,
    Buffered,
    AdaptivePass,
    Done,
}

impl fmt::Display for RefineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefineState::GlobalPass => "global pass",
            RefineState::PreliminaryClassified => "preliminary classified",
            RefineState::EdgesDetected => "edges detected",
            RefineState::EdgesFiltered => "edges filtered",
            RefineState::Buffered => "buffered",
            RefineState::AdaptivePass => "adaptive pass",
            RefineState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of a completed refinement
#[derive(Debug, Clone)]
pub struct RefineOutput {
    /// Otsu threshold of the whole region
    pub global_threshold: Threshold,
    /// Otsu threshold of the edge buffer
    pub adaptive_threshold: Threshold,
    /// Final classification at the adaptive threshold
    pub classification: BinaryMask,
    /// Filtered edges of the preliminary classification
    pub edges: BinaryMask,
    /// Sampling mask of the adaptive pass
    pub buffer: BinaryMask,
    /// Histogram of the global pass
    pub global_histogram: Histogram,
    /// Histogram of the edge buffer samples
    pub adaptive_histogram: Histogram,
    /// States visited, in order
    pub trace: Vec<RefineState>,
}

impl RefineOutput {
    /// Adaptive minus global threshold
    pub fn threshold_shift(&self) -> f64 {
        self.adaptive_threshold.value - self.global_threshold.value
    }
}

/// Records state transitions of one run
struct Trace {
    states: Vec<RefineState>,
    cancel: CancelToken,
}

impl Trace {
    fn new(cancel: CancelToken) -> Self {
        Self {
            states: Vec::with_capacity(7),
            cancel,
        }
    }

    /// Move to `next`, stopping if the run was cancelled.
    fn enter(&mut self, next: RefineState) -> RefineResult<()> {
        self.cancel.check()?;
        match self.states.last() {
            Some(prev) => debug!("refine: {prev} -> {next}"),
            None => debug!("refine: start -> {next}"),
        }
        self.states.push(next);
        Ok(())
    }
}

/// Two-pass edge-guided Otsu thresholding
///
/// # Examples
///
/// ```
/// use edgeotsu_core::{GeoTransform, Raster, Region};
/// use edgeotsu_refine::{AdaptiveRefiner, RefineConfig};
///
/// // Dark left half, bright right half, with a little texture
/// let gt = GeoTransform::with_pixel_size(30.0).unwrap();
/// let raster = Raster::from_fn(64, 64, gt, |x, y| {
///     let base = if x < 32 { -20.0 } else { -5.0 };
///     base + ((x * 7 + y * 13) % 5) as f32 * 0.5
/// })
/// .unwrap();
///
/// let refiner = AdaptiveRefiner::new(RefineConfig::default()).unwrap();
/// let out = refiner.run_raster(&raster, &Region::Full).unwrap();
/// assert!(out.adaptive_threshold.value > -19.0 && out.adaptive_threshold.value < -5.0);
/// assert!(out.classification.is_set(0, 0));
/// assert!(!out.classification.is_set(63, 0));
/// ```
#[derive(Debug, Clone)]
pub struct AdaptiveRefiner {
    config: RefineConfig,
    cancel: CancelToken,
}

impl AdaptiveRefiner {
    /// Create a refiner after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::InvalidParameter`] for an invalid configuration.
    pub fn new(config: RefineConfig) -> RefineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelToken::new(),
        })
    }

    /// Use `cancel` to stop runs from another thread or after a deadline.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &RefineConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Refine the configured band of `bands` inside `region`.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::InvalidParameter`] if the band is missing, and
    /// otherwise fails as [`run_raster`](Self::run_raster).
    pub fn run(&self, bands: &BandStack, region: &Region) -> RefineResult<RefineOutput> {
        let raster = bands.select(self.config.band)?;
        debug!("refine: using band {}", self.config.band);
        self.run_raster(raster, region)
    }

    /// Refine a single raster inside `region`.
    ///
    /// # Errors
    ///
    /// - [`RefineError::EmptyRegion`] if a pass has no valid samples
    /// - [`RefineError::DegenerateHistogram`] if a pass has a single value
    /// - [`RefineError::ResourceBudgetExceeded`] if a reduction is over budget
    /// - [`RefineError::Cancelled`] / [`RefineError::TimedOut`] if the cancel
    ///   token fires
    pub fn run_raster(&self, raster: &Raster, region: &Region) -> RefineResult<RefineOutput> {
        let config = &self.config;
        let ctx = ReductionContext::new(
            ReductionBudget::new(config.max_pixels),
            self.cancel.clone(),
        );
        let hist_options = config.histogram_options();
        let mut trace = Trace::new(self.cancel.clone());

        trace.enter(RefineState::GlobalPass)?;
        let global_histogram = build_histogram(raster, region, &hist_options, &ctx)
            .map_err(|e| RefineError::in_pass(Pass::Global, e))?;
        let global_threshold = otsu_threshold(&global_histogram)
            .map_err(|e| RefineError::threshold_in_pass(Pass::Global, e))?;
        info!(
            "global threshold {:.4} from {} samples",
            global_threshold.value,
            global_histogram.total()
        );

        trace.enter(RefineState::PreliminaryClassified)?;
        let preliminary = apply_threshold_in(raster, region, global_threshold.value)?;

        trace.enter(RefineState::EdgesDetected)?;
        let edge_map = canny_mask(&preliminary, &config.canny_options())?;

        trace.enter(RefineState::EdgesFiltered)?;
        let classes = edge_map.weak_strong_classes(config.canny_lt)?;
        let edges = filter_edges(&classes, &config.filter_options())?;
        let edge_pixels = count_edge_pixels(raster, region, &edges, config, &ctx)?;
        debug!(
            "refine: {} of {} edge pixels survive filtering",
            edge_pixels,
            edge_map.edge_count()
        );
        if edge_pixels == 0 {
            warn!("no edges survived filtering; the adaptive pass has nothing to sample");
        }

        trace.enter(RefineState::Buffered)?;
        let buffer = buffer_edges(
            &edges,
            config.edge_buffer,
            raster.resolution(),
            config.nodata_distance,
        )?;

        trace.enter(RefineState::AdaptivePass)?;
        let adaptive_histogram =
            build_histogram_masked(raster, region, &buffer, &hist_options, &ctx)
                .map_err(|e| RefineError::in_pass(Pass::Adaptive, e))?;
        if adaptive_histogram.total() < SMALL_ADAPTIVE_SAMPLE {
            warn!(
                "adaptive pass sampled only {} pixels",
                adaptive_histogram.total()
            );
        }
        let adaptive_threshold = otsu_threshold(&adaptive_histogram)
            .map_err(|e| RefineError::threshold_in_pass(Pass::Adaptive, e))?;
        info!(
            "adaptive threshold {:.4} from {} samples (global {:.4})",
            adaptive_threshold.value,
            adaptive_histogram.total(),
            global_threshold.value
        );

        let classification = apply_threshold_in(raster, region, adaptive_threshold.value)?;
        trace.enter(RefineState::Done)?;

        Ok(RefineOutput {
            global_threshold,
            adaptive_threshold,
            classification,
            edges,
            buffer,
            global_histogram,
            adaptive_histogram,
            trace: trace.states,
        })
    }
}

/// Pixel-count reduction over the filtered edges at native resolution
fn count_edge_pixels(
    raster: &Raster,
    region: &Region,
    edges: &BinaryMask,
    config: &RefineConfig,
    ctx: &ReductionContext,
) -> RefineResult<u64> {
    let options = HistogramOptions::with_buckets(config.bucket_count);
    Ok(count_samples(raster, region, Some(edges), &options, ctx)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeotsu_core::GeoTransform;

    fn split(width: u32, height: u32) -> Raster {
        let gt = GeoTransform::new(0.0, height as f64 * 30.0, 30.0).unwrap();
        Raster::from_fn(width, height, gt, |x, y| {
            let base = if x < width / 2 { -20.0 } else { -5.0 };
            base + ((x * 7 + y * 13) % 5) as f32 * 0.5
        })
        .unwrap()
    }

    #[test]
    fn test_trace_visits_every_state() {
        let refiner = AdaptiveRefiner::new(RefineConfig::default()).unwrap();
        let out = refiner.run_raster(&split(48, 48), &Region::Full).unwrap();
        assert_eq!(
            out.trace,
            vec![
                RefineState::GlobalPass,
                RefineState::PreliminaryClassified,
                RefineState::EdgesDetected,
                RefineState::EdgesFiltered,
                RefineState::Buffered,
                RefineState::AdaptivePass,
                RefineState::Done,
            ]
        );
        assert!(out.edges.is_subset_of(&out.buffer).unwrap());
        assert!(out.adaptive_histogram.total() < out.global_histogram.total());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = AdaptiveRefiner::new(RefineConfig::default().with_resolution(1.0)).unwrap_err();
        assert!(matches!(err, RefineError::InvalidParameter(_)));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let refiner = AdaptiveRefiner::new(RefineConfig::default())
            .unwrap()
            .with_cancel_token(token);
        let err = refiner.run_raster(&split(16, 16), &Region::Full).unwrap_err();
        assert!(matches!(err, RefineError::Cancelled));
    }
}
