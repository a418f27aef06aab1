//! Otsu's method on a bucketed histogram
//!
//! For a split `k` in `1..N`, class A holds buckets `[0, k)` and class B
//! holds `[k, N)`. The between-class sum of squares is
//!
//! ```text
//! BSS(k) = countA * (meanA - grandMean)^2 + countB * (meanB - grandMean)^2
//! ```
//!
//! and the threshold is the mean of the last bucket of class A at the split
//! maximizing BSS. Ties resolve to the highest such mean.

use crate::error::{ThresholdError, ThresholdResult};
use edgeotsu_core::Histogram;

/// Threshold selected from a histogram
///
/// Only meaningful relative to the histogram that produced it: `value` is
/// always `histogram.means()[index]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    /// Threshold value (a bucket mean)
    pub value: f64,
    /// Index of the bucket whose mean was selected
    pub index: usize,
    /// Between-class sum of squares at the selected split
    pub bss: f64,
}

/// Between-class sum of squares for every bucket.
///
/// Entry `i` scores the split that closes class A after bucket `i`, so the
/// last entry (empty class B) is always 0. Splits leaving either class empty
/// score 0.
pub fn between_class_variance(hist: &Histogram) -> Vec<f64> {
    let counts = hist.counts();
    let means = hist.means();
    let n = hist.len();

    let total: f64 = counts.iter().map(|&c| c as f64).sum();
    let sum: f64 = hist.buckets().map(|(m, c)| m * c as f64).sum();
    let mut bss = vec![0.0; n];
    if total == 0.0 {
        return bss;
    }
    let grand_mean = sum / total;

    let mut count_a = 0.0;
    let mut sum_a = 0.0;
    for i in 0..n.saturating_sub(1) {
        count_a += counts[i] as f64;
        sum_a += means[i] * counts[i] as f64;
        let count_b = total - count_a;
        if count_a == 0.0 || count_b == 0.0 {
            continue;
        }
        let mean_a = sum_a / count_a;
        let mean_b = (sum - sum_a) / count_b;
        bss[i] = count_a * (mean_a - grand_mean).powi(2) + count_b * (mean_b - grand_mean).powi(2);
    }
    bss
}

/// Compute Otsu's threshold for a histogram.
///
/// # Errors
///
/// Returns [`ThresholdError::DegenerateHistogram`] if fewer than two buckets
/// hold samples.
///
/// # Examples
///
/// ```
/// use edgeotsu_core::Histogram;
/// use edgeotsu_threshold::otsu_threshold;
///
/// let hist = Histogram::from_buckets(vec![0.0, 1.0, 2.0, 3.0], vec![5, 5, 0, 5]).unwrap();
/// let t = otsu_threshold(&hist).unwrap();
/// // Splits after buckets 1 and 2 separate the same samples; the last wins
/// assert_eq!(t.value, 2.0);
/// ```
pub fn otsu_threshold(hist: &Histogram) -> ThresholdResult<Threshold> {
    let non_empty = hist.non_empty_buckets();
    if non_empty < 2 {
        return Err(ThresholdError::DegenerateHistogram { non_empty });
    }

    let bss = between_class_variance(hist);
    let mut best = 0;
    for (i, &score) in bss.iter().enumerate() {
        if score >= bss[best] {
            best = i;
        }
    }
    // With two populated buckets at least one split scores > 0, so the last
    // entry (always 0) cannot win.
    let threshold = Threshold {
        value: hist.means()[best],
        index: best,
        bss: bss[best],
    };
    log::trace!(
        "otsu: {} buckets, split after {} (bss {:.4e})",
        hist.len(),
        best,
        threshold.bss
    );
    Ok(threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist(means: &[f64], counts: &[u64]) -> Histogram {
        Histogram::from_buckets(means.to_vec(), counts.to_vec()).unwrap()
    }

    #[test]
    fn test_two_buckets() {
        let h = hist(&[-20.0, -5.0], &[10, 10]);
        let t = otsu_threshold(&h).unwrap();
        assert_eq!(t.index, 0);
        assert_eq!(t.value, -20.0);
        // 10 * 7.5^2 * 2
        assert!((t.bss - 1125.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric_bimodal() {
        let h = hist(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], &[4, 8, 1, 1, 8, 4]);
        let t = otsu_threshold(&h).unwrap();
        assert_eq!(t.value, 2.0);
    }

    #[test]
    fn test_empty_buckets_tie_resolves_to_last() {
        // Splits after buckets 1, 2 and 3 separate the same classes
        let h = hist(&[0.0, 1.0, 2.0, 3.0, 4.0], &[3, 3, 0, 0, 3]);
        let bss = between_class_variance(&h);
        assert_eq!(bss[1], bss[2]);
        assert_eq!(bss[2], bss[3]);
        let t = otsu_threshold(&h).unwrap();
        assert_eq!(t.index, 3);
        assert_eq!(t.value, 3.0);
    }

    #[test]
    fn test_degenerate() {
        let h = hist(&[0.0, 1.0, 2.0], &[0, 7, 0]);
        assert!(matches!(
            otsu_threshold(&h),
            Err(ThresholdError::DegenerateHistogram { non_empty: 1 })
        ));
        let h = hist(&[1.0], &[100]);
        assert!(otsu_threshold(&h).is_err());
        let h = hist(&[0.0, 1.0], &[0, 0]);
        assert!(matches!(
            otsu_threshold(&h),
            Err(ThresholdError::DegenerateHistogram { non_empty: 0 })
        ));
    }

    #[test]
    fn test_curve_edges_are_zero() {
        let h = hist(&[0.0, 1.0, 2.0, 3.0], &[0, 2, 2, 0]);
        let bss = between_class_variance(&h);
        assert_eq!(bss.len(), 4);
        assert_eq!(bss[0], 0.0);
        assert_eq!(bss[3], 0.0);
        assert_eq!(bss[2], 0.0);
        assert!(bss[1] > 0.0);
    }
}
