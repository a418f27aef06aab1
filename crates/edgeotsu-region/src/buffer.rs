//! Edge buffering
//!
//! Grows the filtered edge set into a band of cells lying within a physical
//! distance of some edge. The adaptive histogram is computed over this band.

use crate::distance::{DistanceField, barrier_distance, euclidean_distance};
use crate::error::{RegionError, RegionResult};
use edgeotsu_core::{BinaryMask, MASK_NODATA};
use serde::{Deserialize, Serialize};

/// How no-data cells affect buffer distances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataDistance {
    /// Distances pass straight through no-data cells
    #[default]
    Transparent,
    /// Distances are measured along paths that avoid no-data cells
    Barrier,
}

impl NoDataDistance {
    /// Distance field of `edges` under this policy
    pub fn distance_field(self, edges: &BinaryMask) -> DistanceField {
        match self {
            NoDataDistance::Transparent => euclidean_distance(edges),
            NoDataDistance::Barrier => barrier_distance(edges),
        }
    }
}

/// Buffer distance in pixels for a physical `distance` at `resolution`.
///
/// # Errors
///
/// Returns [`RegionError::InvalidParameters`] if `distance` is negative or
/// not finite, or `resolution` is not positive.
pub fn buffer_pixels(distance: f64, resolution: f64) -> RegionResult<f64> {
    if !(distance.is_finite() && distance >= 0.0) {
        return Err(RegionError::InvalidParameters(format!(
            "buffer distance must be finite and >= 0, got {distance}"
        )));
    }
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(RegionError::InvalidParameters(format!(
            "resolution must be finite and > 0, got {resolution}"
        )));
    }
    Ok(distance / resolution)
}

/// Set every cell lying strictly within `distance` (physical units) of an
/// edge cell.
///
/// Edge cells themselves are always set, so a zero distance returns the
/// edge set unchanged. No-data cells of `edges` stay no-data.
///
/// # Arguments
///
/// * `edges` - Filtered edge mask
/// * `distance` - Buffer radius in the units of `resolution`
/// * `resolution` - Physical size of one pixel
/// * `nodata` - Whether no-data cells block distance paths
///
/// # Errors
///
/// See [`buffer_pixels`].
pub fn buffer_edges(
    edges: &BinaryMask,
    distance: f64,
    resolution: f64,
    nodata: NoDataDistance,
) -> RegionResult<BinaryMask> {
    let radius = buffer_pixels(distance, resolution)?;
    let field = nodata.distance_field(edges);

    let data: Vec<u8> = edges
        .data()
        .iter()
        .zip(field.distances())
        .map(|(&e, &d)| {
            if e == MASK_NODATA {
                MASK_NODATA
            } else if d == 0.0 || d < radius {
                1
            } else {
                0
            }
        })
        .collect();

    let buffered = BinaryMask::from_data(edges.width(), edges.height(), data, *edges.transform())?;
    log::debug!(
        "buffered {} edge cells to {} cells (radius {:.2} px, {:?})",
        edges.count_ones(),
        buffered.count_ones(),
        radius,
        nodata
    );
    Ok(buffered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeotsu_core::GeoTransform;

    fn line_mask() -> BinaryMask {
        // Vertical edge in column 4 of a 9x5 grid
        let mut data = vec![0u8; 45];
        for y in 0..5 {
            data[y * 9 + 4] = 1;
        }
        BinaryMask::from_data(9, 5, data, GeoTransform::default()).unwrap()
    }

    #[test]
    fn test_zero_distance_is_identity() {
        let edges = line_mask();
        let b = buffer_edges(&edges, 0.0, 30.0, NoDataDistance::Transparent).unwrap();
        assert_eq!(b, edges);
    }

    #[test]
    fn test_strict_radius() {
        let edges = line_mask();
        // 60 m at 30 m is 2 px; only columns at distance 0 and 1 qualify
        let b = buffer_edges(&edges, 60.0, 30.0, NoDataDistance::Transparent).unwrap();
        assert_eq!(b.count_ones(), 15);
        assert!(b.is_set(3, 0) && b.is_set(5, 4));
        assert!(!b.is_set(2, 0));
    }

    #[test]
    fn test_invalid_parameters() {
        let edges = line_mask();
        assert!(buffer_edges(&edges, -1.0, 30.0, NoDataDistance::Transparent).is_err());
        assert!(buffer_edges(&edges, f64::NAN, 30.0, NoDataDistance::Transparent).is_err());
        assert!(buffer_edges(&edges, 10.0, 0.0, NoDataDistance::Barrier).is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&NoDataDistance::Barrier).unwrap();
        assert_eq!(json, "\"barrier\"");
        let back: NoDataDistance = serde_json::from_str("\"transparent\"").unwrap();
        assert_eq!(back, NoDataDistance::Transparent);
    }
}
