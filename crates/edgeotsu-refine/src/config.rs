//! Refinement configuration
//!
//! [`RefineConfig`] collects every tunable of the pipeline. It is plain data
//! with serde support, so a run can be described in JSON:
//!
//! ```
//! use edgeotsu_refine::{Band, RefineConfig};
//!
//! let config = RefineConfig::from_json(r#"{ "band": "VH", "edge_buffer": 90.0 }"#).unwrap();
//! assert_eq!(config.band, Band::VH);
//! assert_eq!(config.edge_length, 25);
//! ```

use crate::error::{RefineError, RefineResult};
use edgeotsu_core::{DEFAULT_MAX_PIXELS, HistogramOptions, MAX_BUCKETS};
use edgeotsu_filter::CannyOptions;
use edgeotsu_region::{EdgeFilterOptions, NoDataDistance};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Finest reduction scale accepted, in physical units per pixel
pub const MIN_RESOLUTION: f64 = 10.0;

/// Radar polarization band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Band {
    #[default]
    VV,
    VH,
    HH,
    HV,
}

impl Band {
    /// All bands in declaration order
    pub const ALL: [Band; 4] = [Band::VV, Band::VH, Band::HH, Band::HV];

    pub fn as_str(self) -> &'static str {
        match self {
            Band::VV => "VV",
            Band::VH => "VH",
            Band::HH => "HH",
            Band::HV => "HV",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Band {
    type Err = RefineError;

    /// Parse a band name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Band::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                RefineError::InvalidParameter(format!(
                    "unknown band {s:?}, expected one of VV, VH, HH, HV"
                ))
            })
    }
}

/// Parameters of an [`AdaptiveRefiner`](crate::AdaptiveRefiner) run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Minimum connected edge pixel count
    pub edge_length: u32,
    /// Buffer distance around edges, in physical units
    pub edge_buffer: f64,
    /// Cap on the counted size of an edge component
    pub connected_pixels: u32,
    /// Canny hysteresis high threshold
    pub canny_threshold: f64,
    /// Canny Gaussian sigma in pixels
    pub canny_sigma: f64,
    /// Canny hysteresis low threshold, also the weak edge cutoff
    pub canny_lt: f64,
    /// Reduction scale in physical units per pixel
    pub resolution: f64,
    pub band: Band,
    pub bucket_count: u32,
    pub nodata_distance: NoDataDistance,
    /// Maximum pixels visited by one reduction
    pub max_pixels: u64,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            edge_length: 25,
            edge_buffer: 60.0,
            connected_pixels: 100,
            canny_threshold: 1.0,
            canny_sigma: 0.5,
            canny_lt: 0.05,
            resolution: 30.0,
            band: Band::VV,
            bucket_count: 255,
            nodata_distance: NoDataDistance::Transparent,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl RefineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::InvalidParameter`] if the JSON is malformed or
    /// the resulting configuration fails [`validate`](Self::validate).
    pub fn from_json(json: &str) -> RefineResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RefineError::InvalidParameter(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> RefineResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RefineError::InvalidParameter(format!("config: {e}")))
    }

    pub fn with_edge_length(mut self, edge_length: u32) -> Self {
        self.edge_length = edge_length;
        self
    }

    pub fn with_edge_buffer(mut self, edge_buffer: f64) -> Self {
        self.edge_buffer = edge_buffer;
        self
    }

    pub fn with_connected_pixels(mut self, connected_pixels: u32) -> Self {
        self.connected_pixels = connected_pixels;
        self
    }

    pub fn with_canny(mut self, threshold: f64, sigma: f64, lt: f64) -> Self {
        self.canny_threshold = threshold;
        self.canny_sigma = sigma;
        self.canny_lt = lt;
        self
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_band(mut self, band: Band) -> Self {
        self.band = band;
        self
    }

    pub fn with_bucket_count(mut self, bucket_count: u32) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    pub fn with_nodata_distance(mut self, nodata_distance: NoDataDistance) -> Self {
        self.nodata_distance = nodata_distance;
        self
    }

    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    /// Check every parameter before any pixel is touched.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> RefineResult<()> {
        let invalid = |msg: String| Err(RefineError::InvalidParameter(msg));

        if !(self.resolution.is_finite() && self.resolution >= MIN_RESOLUTION) {
            return invalid(format!(
                "resolution must be >= {MIN_RESOLUTION}, got {}",
                self.resolution
            ));
        }
        if !(self.edge_buffer.is_finite() && self.edge_buffer >= 0.0) {
            return invalid(format!(
                "edge_buffer must be finite and >= 0, got {}",
                self.edge_buffer
            ));
        }
        if self.connected_pixels == 0 {
            return invalid("connected_pixels must be >= 1".to_string());
        }
        if self.edge_length > self.connected_pixels {
            return invalid(format!(
                "edge_length {} exceeds connected_pixels {}",
                self.edge_length, self.connected_pixels
            ));
        }
        if !(self.canny_threshold.is_finite() && self.canny_threshold >= 0.0) {
            return invalid(format!(
                "canny_threshold must be finite and >= 0, got {}",
                self.canny_threshold
            ));
        }
        if !(self.canny_sigma.is_finite() && self.canny_sigma >= 0.0) {
            return invalid(format!(
                "canny_sigma must be finite and >= 0, got {}",
                self.canny_sigma
            ));
        }
        if !(self.canny_lt.is_finite() && self.canny_lt >= 0.0) {
            return invalid(format!(
                "canny_lt must be finite and >= 0, got {}",
                self.canny_lt
            ));
        }
        if self.canny_lt > self.canny_threshold {
            return invalid(format!(
                "canny_lt {} exceeds canny_threshold {}",
                self.canny_lt, self.canny_threshold
            ));
        }
        if self.bucket_count == 0 || self.bucket_count as usize > MAX_BUCKETS {
            return invalid(format!(
                "bucket_count must be in 1..={MAX_BUCKETS}, got {}",
                self.bucket_count
            ));
        }
        if self.max_pixels == 0 {
            return invalid("max_pixels must be >= 1".to_string());
        }
        Ok(())
    }

    /// Canny options: high `canny_threshold`, low `canny_lt`.
    pub fn canny_options(&self) -> CannyOptions {
        CannyOptions::new(self.canny_sigma, self.canny_threshold, self.canny_lt)
    }

    pub fn filter_options(&self) -> EdgeFilterOptions {
        EdgeFilterOptions::new(self.edge_length, self.connected_pixels)
    }

    /// Histogram options for both passes
    pub fn histogram_options(&self) -> HistogramOptions {
        HistogramOptions::with_buckets(self.bucket_count).at_resolution(self.resolution)
    }
}
