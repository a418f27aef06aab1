//! Distance transforms
//!
//! Distances are measured in pixels from the nearest set cell of a mask.
//!
//! - [`euclidean_distance`] - exact Euclidean transform, no-data cells are
//!   ordinary free space
//! - [`barrier_distance`] - chamfer distance whose paths cannot cross
//!   no-data cells
//!
//! Cells with no reachable source get `f64::INFINITY`.

use edgeotsu_core::BinaryMask;
use edgeotsu_core::maybe_rayon::*;

/// Per-cell distance in pixels
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceField {
    width: u32,
    height: u32,
    distances: Vec<f64>,
}

impl DistanceField {
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Distance at (x, y), or `None` outside the grid
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.distances[(y as usize) * (self.width as usize) + (x as usize)])
    }

    /// Largest finite distance, or `None` if every cell is unreachable
    pub fn max_finite(&self) -> Option<f64> {
        self.distances
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(None, |acc, d| Some(acc.map_or(d, |a: f64| a.max(d))))
    }
}

/// Abscissa where the parabolas rooted at `p` and `q` intersect
#[inline]
fn intersection(f: &[f64], p: usize, q: usize) -> f64 {
    let (pf, qf) = (p as f64, q as f64);
    ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * (qf - pf))
}

/// 1D squared distance transform of a sampled function (lower envelope of
/// parabolas).
fn edt_1d(f: &[f64], out: &mut [f64]) {
    let n = f.len();
    let mut v = vec![0usize; n];
    let mut z = vec![0.0f64; n + 1];
    let mut k = 0usize;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    for q in 1..n {
        // z[0] is -inf, so k never drops below zero
        let mut s = intersection(f, v[k], q);
        while s <= z[k] {
            k -= 1;
            s = intersection(f, v[k], q);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, o) in out.iter_mut().enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let p = v[k];
        let d = q as f64 - p as f64;
        *o = d * d + f[p];
    }
}

/// Exact Euclidean distance from every cell to the nearest set cell.
///
/// No-data cells neither act as sources nor block paths.
pub fn euclidean_distance(mask: &BinaryMask) -> DistanceField {
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let far = ((w + h) * (w + h)) as f64 + 1.0;
    let data = mask.data();

    // Columns
    let columns: Vec<Vec<f64>> = (0..w)
        .into_par_iter()
        .map(|x| {
            let f: Vec<f64> = (0..h)
                .map(|y| if data[y * w + x] == 1 { 0.0 } else { far })
                .collect();
            let mut out = vec![0.0; h];
            edt_1d(&f, &mut out);
            out
        })
        .collect();

    // Rows
    let rows: Vec<Vec<f64>> = (0..h)
        .into_par_iter()
        .map(|y| {
            let f: Vec<f64> = (0..w).map(|x| columns[x][y]).collect();
            let mut out = vec![0.0; w];
            edt_1d(&f, &mut out);
            out.into_iter()
                .map(|sq| if sq >= far { f64::INFINITY } else { sq.sqrt() })
                .collect()
        })
        .collect();

    DistanceField {
        width: mask.width(),
        height: mask.height(),
        distances: rows.into_iter().flatten().collect(),
    }
}

/// Chamfer distance from every cell to the nearest set cell along paths
/// that avoid no-data cells.
///
/// Steps cost 1 orthogonally and `sqrt(2)` diagonally, so values can exceed
/// the Euclidean distance by up to about 8%. No-data cells are unreachable.
pub fn barrier_distance(mask: &BinaryMask) -> DistanceField {
    const DIAG: f64 = std::f64::consts::SQRT_2;
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let data = mask.data();
    let passable = |i: usize| data[i] != edgeotsu_core::MASK_NODATA;

    let mut dist: Vec<f64> = data
        .iter()
        .map(|&v| if v == 1 { 0.0 } else { f64::INFINITY })
        .collect();

    let forward: [(i64, i64, f64); 4] = [(-1, -1, DIAG), (0, -1, 1.0), (1, -1, DIAG), (-1, 0, 1.0)];
    let backward: [(i64, i64, f64); 4] = [(1, 1, DIAG), (0, 1, 1.0), (-1, 1, DIAG), (1, 0, 1.0)];

    let relax = |dist: &mut [f64], x: usize, y: usize, offsets: &[(i64, i64, f64)]| -> bool {
        let i = y * w + x;
        if !passable(i) {
            return false;
        }
        let mut best = dist[i];
        for &(dx, dy, cost) in offsets {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                continue;
            }
            let j = ny as usize * w + nx as usize;
            if passable(j) {
                best = best.min(dist[j] + cost);
            }
        }
        if best < dist[i] {
            dist[i] = best;
            true
        } else {
            false
        }
    };

    // Paths winding around barriers need more than one sweep pair
    loop {
        let mut changed = false;
        for y in 0..h {
            for x in 0..w {
                changed |= relax(dist.as_mut_slice(), x, y, &forward[..]);
            }
        }
        for y in (0..h).rev() {
            for x in (0..w).rev() {
                changed |= relax(dist.as_mut_slice(), x, y, &backward[..]);
            }
        }
        if !changed {
            break;
        }
    }

    DistanceField {
        width: mask.width(),
        height: mask.height(),
        distances: dist,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeotsu_core::{GeoTransform, MASK_NODATA};

    fn mask(w: u32, h: u32, data: &[u8]) -> BinaryMask {
        BinaryMask::from_data(w, h, data.to_vec(), GeoTransform::default()).unwrap()
    }

    #[test]
    fn test_single_source_exact() {
        let mut data = vec![0u8; 49];
        data[3 * 7 + 3] = 1;
        let d = euclidean_distance(&mask(7, 7, &data));
        for y in 0..7u32 {
            for x in 0..7u32 {
                let dx = x as f64 - 3.0;
                let dy = y as f64 - 3.0;
                let expected = (dx * dx + dy * dy).sqrt();
                assert!((d.get(x, y).unwrap() - expected).abs() < 1e-9, "({x}, {y})");
            }
        }
        assert!((d.max_finite().unwrap() - 18f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_brute_force_agreement() {
        #[rustfmt::skip]
        let data = [
            1, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 1, 0,
            0, 0, 0, 0, 0, 0,
            0, 1, 0, 0, 0, 0,
        ];
        let sources: Vec<(f64, f64)> = data
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == 1)
            .map(|(i, _)| ((i % 6) as f64, (i / 6) as f64))
            .collect();
        let d = euclidean_distance(&mask(6, 5, &data));
        for y in 0..5u32 {
            for x in 0..6u32 {
                let brute = sources
                    .iter()
                    .map(|&(sx, sy)| ((x as f64 - sx).powi(2) + (y as f64 - sy).powi(2)).sqrt())
                    .fold(f64::INFINITY, f64::min);
                assert!((d.get(x, y).unwrap() - brute).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_no_sources() {
        let d = euclidean_distance(&mask(3, 2, &[0; 6]));
        assert!(d.distances().iter().all(|v| v.is_infinite()));
        assert_eq!(d.max_finite(), None);
        let b = barrier_distance(&mask(3, 2, &[0; 6]));
        assert!(b.distances().iter().all(|v| v.is_infinite()));
    }

    #[test]
    fn test_barrier_detour() {
        // A wall of no-data with a gap on the bottom row
        #[rustfmt::skip]
        let data = [
            1, 0, MASK_NODATA, 0,
            0, 0, MASK_NODATA, 0,
            0, 0, 0,           0,
        ];
        let m = mask(4, 3, &data);
        let e = euclidean_distance(&m);
        let b = barrier_distance(&m);
        assert!((e.get(3, 0).unwrap() - 3.0).abs() < 1e-9);
        // (0,0) -> (1,1) -> (2,2) -> (3,1) -> (3,0)
        let expected = 3.0 * std::f64::consts::SQRT_2 + 1.0;
        assert!((b.get(3, 0).unwrap() - expected).abs() < 1e-9);
        assert!(b.get(2, 0).unwrap().is_infinite());
    }
}
