//! Threshold masks
//!
//! Per-cell classification of a raster against a scalar threshold:
//! a cell is `1` when its value is strictly below the threshold, `0`
//! otherwise, and no-data cells stay no-data.

use crate::error::{ThresholdError, ThresholdResult};
use edgeotsu_core::maybe_rayon::*;
use edgeotsu_core::{BinaryMask, MASK_NODATA, Raster, Region};

/// Classify every cell of `raster` against `threshold`.
///
/// # Errors
///
/// Returns [`ThresholdError::InvalidParameters`] if `threshold` is not finite.
pub fn apply_threshold(raster: &Raster, threshold: f64) -> ThresholdResult<BinaryMask> {
    apply_threshold_in(raster, &Region::Full, threshold)
}

/// Classify the cells of `raster` inside `region`.
///
/// Cells outside the region become no-data, so the mask footprint never
/// exceeds the raster's valid footprint.
///
/// # Errors
///
/// Returns [`ThresholdError::InvalidParameters`] if `threshold` is not finite.
pub fn apply_threshold_in(
    raster: &Raster,
    region: &Region,
    threshold: f64,
) -> ThresholdResult<BinaryMask> {
    if !threshold.is_finite() {
        return Err(ThresholdError::InvalidParameters(format!(
            "threshold must be finite, got {threshold}"
        )));
    }
    let (w, h) = raster.dimensions();
    let gt = raster.transform();

    let rows: Vec<Vec<u8>> = (0..h)
        .into_par_iter()
        .map(|y| {
            raster
                .row(y)
                .iter()
                .enumerate()
                .map(|(x, &v)| {
                    if !raster.is_valid_value(v) || !region.contains_cell(gt, x as u32, y) {
                        MASK_NODATA
                    } else {
                        u8::from((v as f64) < threshold)
                    }
                })
                .collect()
        })
        .collect();

    let mask = BinaryMask::from_data(w, h, rows.concat(), *gt)?;
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeotsu_core::GeoTransform;

    #[test]
    fn test_strictly_below() {
        let raster = Raster::from_data(
            4,
            1,
            vec![-20.0, -12.5, -5.0, f32::NAN],
            GeoTransform::default(),
        )
        .unwrap();
        let mask = apply_threshold(&raster, -12.5).unwrap();
        assert_eq!(mask.data(), &[1, 0, 0, MASK_NODATA]);
        assert!(mask.matches_raster(&raster));
    }

    #[test]
    fn test_region_clips_footprint() {
        let gt = GeoTransform::new(0.0, 2.0, 1.0).unwrap();
        let raster = Raster::filled(4, 2, -30.0, gt).unwrap();
        let left = Region::rect(0.0, 0.0, 2.0, 2.0).unwrap();
        let mask = apply_threshold_in(&raster, &left, 0.0).unwrap();
        assert_eq!(
            mask.data(),
            &[1, 1, MASK_NODATA, MASK_NODATA, 1, 1, MASK_NODATA, MASK_NODATA]
        );
    }

    #[test]
    fn test_nonfinite_threshold() {
        let raster = Raster::new(2, 2, GeoTransform::default()).unwrap();
        assert!(apply_threshold(&raster, f64::NAN).is_err());
    }
}
