//! Masked separable convolution
//!
//! Normalized convolution: both the samples and a validity mask are
//! convolved, and each output is divided by the convolved mask. No-data cells
//! and cells beyond the raster border contribute no weight, so results near
//! gaps and edges are not pulled toward zero. No-data cells stay no-data.

use crate::kernel::Kernel;
use crate::{FilterError, FilterResult};
use edgeotsu_core::Raster;
use edgeotsu_core::maybe_rayon::*;

/// Smooth `raster` with a Gaussian of standard deviation `sigma` pixels.
///
/// `sigma == 0` returns an unchanged copy.
pub fn gaussian_smooth(raster: &Raster, sigma: f64) -> FilterResult<Raster> {
    let kx = Kernel::gaussian_1d(sigma)?;
    if kx.width() == 1 {
        return Ok(raster.clone());
    }
    let ky = kx.transpose();
    convolve_separable_masked(raster, &kx, &ky)
}

/// Convolve with a row kernel `kx` then a column kernel `ky`, ignoring
/// no-data.
///
/// # Errors
///
/// Returns [`FilterError::InvalidKernel`] if `kx` is not a single row or
/// `ky` is not a single column.
pub fn convolve_separable_masked(raster: &Raster, kx: &Kernel, ky: &Kernel) -> FilterResult<Raster> {
    if kx.height() != 1 {
        return Err(FilterError::InvalidKernel(format!(
            "row kernel must have height 1, got {}",
            kx.height()
        )));
    }
    if ky.width() != 1 {
        return Err(FilterError::InvalidKernel(format!(
            "column kernel must have width 1, got {}",
            ky.width()
        )));
    }

    let (w, h) = raster.dimensions();
    let (wu, hu) = (w as usize, h as usize);
    let values: Vec<f64> = raster
        .data()
        .iter()
        .map(|&v| if raster.is_valid_value(v) { v as f64 } else { 0.0 })
        .collect();
    let weights: Vec<f64> = raster
        .data()
        .iter()
        .map(|&v| if raster.is_valid_value(v) { 1.0 } else { 0.0 })
        .collect();

    // Horizontal pass
    let kxd = kx.data();
    let cx = kx.center_x() as i64;
    let rows: Vec<(Vec<f64>, Vec<f64>)> = (0..hu)
        .into_par_iter()
        .map(|y| {
            let base = y * wu;
            let mut num = vec![0.0; wu];
            let mut den = vec![0.0; wu];
            for x in 0..wu {
                for (i, &k) in kxd.iter().enumerate() {
                    let sx = x as i64 + i as i64 - cx;
                    if sx < 0 || sx >= w as i64 {
                        continue;
                    }
                    let idx = base + sx as usize;
                    num[x] += k as f64 * values[idx];
                    den[x] += k as f64 * weights[idx];
                }
            }
            (num, den)
        })
        .collect();
    let (num_h, den_h): (Vec<Vec<f64>>, Vec<Vec<f64>>) = rows.into_iter().unzip();

    // Vertical pass
    let kyd = ky.data();
    let cy = ky.center_y() as i64;
    let smoothed: Vec<Vec<f32>> = (0..hu)
        .into_par_iter()
        .map(|y| {
            let src = raster.row(y as u32);
            let mut out = src.to_vec();
            for x in 0..wu {
                if weights[y * wu + x] == 0.0 {
                    continue;
                }
                let mut num = 0.0;
                let mut den = 0.0;
                for (j, &k) in kyd.iter().enumerate() {
                    let sy = y as i64 + j as i64 - cy;
                    if sy < 0 || sy >= h as i64 {
                        continue;
                    }
                    num += k as f64 * num_h[sy as usize][x];
                    den += k as f64 * den_h[sy as usize][x];
                }
                if den.abs() > f64::EPSILON {
                    out[x] = (num / den) as f32;
                }
            }
            out
        })
        .collect();

    let mut result = raster.to_mut();
    for (dst, src) in result.data_mut().chunks_mut(wu).zip(smoothed) {
        dst.copy_from_slice(&src);
    }
    Ok(result.into())
}
