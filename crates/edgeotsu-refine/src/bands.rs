//! Multi-band input
//!
//! A [`BandStack`] holds one raster per polarization band. All bands share
//! the grid of the first band inserted.

use crate::config::Band;
use crate::error::{RefineError, RefineResult};
use edgeotsu_core::Raster;
use std::collections::BTreeMap;

/// Rasters keyed by [`Band`]
#[derive(Debug, Clone, Default)]
pub struct BandStack {
    bands: BTreeMap<Band, Raster>,
}

impl BandStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace `band`.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::InvalidParameter`] if `raster` is not on the
    /// grid of the bands already present.
    pub fn insert(&mut self, band: Band, raster: Raster) -> RefineResult<()> {
        if let Some((other, first)) = self.bands.iter().find(|(b, _)| **b != band)
            && !first.same_geometry(&raster)
        {
            return Err(RefineError::InvalidParameter(format!(
                "band {band} does not share the grid of band {other}"
            )));
        }
        self.bands.insert(band, raster);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_band(mut self, band: Band, raster: Raster) -> RefineResult<Self> {
        self.insert(band, raster)?;
        Ok(self)
    }

    #[inline]
    pub fn get(&self, band: Band) -> Option<&Raster> {
        self.bands.get(&band)
    }

    /// The raster of `band`.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::InvalidParameter`] if the band is missing.
    pub fn select(&self, band: Band) -> RefineResult<&Raster> {
        self.get(band).ok_or_else(|| {
            let present: Vec<String> = self.bands.keys().map(Band::to_string).collect();
            RefineError::InvalidParameter(format!(
                "band {band} not present (have [{}])",
                present.join(", ")
            ))
        })
    }

    /// Bands present, in [`Band`] order
    pub fn bands(&self) -> impl Iterator<Item = Band> + '_ {
        self.bands.keys().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

impl From<(Band, Raster)> for BandStack {
    fn from((band, raster): (Band, Raster)) -> Self {
        let mut bands = BTreeMap::new();
        bands.insert(band, raster);
        Self { bands }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeotsu_core::GeoTransform;

    fn raster(w: u32, h: u32, v: f32) -> Raster {
        Raster::filled(w, h, v, GeoTransform::with_pixel_size(30.0).unwrap()).unwrap()
    }

    #[test]
    fn test_select() {
        let stack = BandStack::new()
            .with_band(Band::VV, raster(4, 4, -10.0))
            .unwrap()
            .with_band(Band::VH, raster(4, 4, -18.0))
            .unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.select(Band::VH).unwrap().get(0, 0), Some(-18.0));
        let err = stack.select(Band::HH).unwrap_err();
        assert!(err.to_string().contains("HH"));
        assert_eq!(stack.bands().collect::<Vec<_>>(), vec![Band::VV, Band::VH]);
    }

    #[test]
    fn test_grid_mismatch() {
        let mut stack = BandStack::from((Band::VV, raster(4, 4, 0.0)));
        assert!(stack.insert(Band::VH, raster(5, 4, 0.0)).is_err());
        // Replacing the only band may change the grid
        assert!(stack.insert(Band::VV, raster(5, 4, 0.0)).is_ok());
    }
}
