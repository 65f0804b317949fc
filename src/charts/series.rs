//! Chart-ready series derived from raw values.
//!
//! Box-plot quartiles, histogram bins, kernel density curves, normal
//! quantiles and confidence intervals. Kept free of drawing code so the
//! numbers behind each chart can be tested on their own.

use crate::analysis::stats;
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// Five-number summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Lowest value within 1.5 IQR below `q1`.
    pub lower_whisker: f64,
    /// Highest value within 1.5 IQR above `q3`.
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// `None` when there are no values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = stats::sorted_present(values);
        if sorted.is_empty() {
            return None;
        }

        let q1 = stats::quantile_sorted(&sorted, 0.25);
        let median = stats::quantile_sorted(&sorted, 0.5);
        let q3 = stats::quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        let inside = || sorted.iter().copied().filter(|v| (low_fence..=high_fence).contains(v));
        let lower_whisker = inside().next().unwrap_or(q1);
        let upper_whisker = inside().last().unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| !(low_fence..=high_fence).contains(v))
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges, ascending.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin the present values of `values` into `bins` equal bins over `range`.
    ///
    /// The last bin is closed on the right; values outside the range are ignored.
    pub fn new(values: &[f64], range: (f64, f64), bins: usize) -> Self {
        let bins = bins.max(1);
        let (lo, hi) = range;
        let width = (hi - lo) / bins as f64;
        let edges = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut counts = vec![0usize; bins];
        for v in stats::present(values) {
            if v < lo || v > hi || width <= 0.0 {
                continue;
            }
            let index = (((v - lo) / width) as usize).min(bins - 1);
            counts[index] += 1;
        }

        Self { edges, counts }
    }

    pub fn bin_width(&self) -> f64 {
        match self.edges.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// `(left, right, count)` for every bin.
    pub fn bars(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(edge, count)| (edge[0], edge[1], *count))
    }
}

/// Axis range around `[lo, hi]` with fractional padding. A zero-width range
/// is widened by 0.5 on each side. `None` if either bound is not finite.
pub fn padded_range(lo: f64, hi: f64, pad: f64) -> Option<(f64, f64)> {
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    let span = hi - lo;
    if span.abs() < f64::EPSILON {
        return Some((lo - 0.5, hi + 0.5));
    }
    Some((lo - span * pad, hi + span * pad))
}

/// Bin count chosen as the finer of the Sturges and Freedman-Diaconis rules.
pub fn auto_bin_count(values: &[f64]) -> usize {
    let sorted = stats::sorted_present(values);
    let n = sorted.len();
    if n < 2 {
        return 1;
    }
    let span = sorted[n - 1] - sorted[0];
    if span <= 0.0 {
        return 1;
    }

    let sturges_width = span / ((n as f64).log2() + 1.0);
    let iqr = stats::quantile_sorted(&sorted, 0.75) - stats::quantile_sorted(&sorted, 0.25);
    let fd_width = 2.0 * iqr * (n as f64).powf(-1.0 / 3.0);

    let width = if fd_width > 0.0 {
        sturges_width.min(fd_width)
    } else {
        sturges_width
    };
    ((span / width).ceil() as usize).max(1)
}

/// Gaussian kernel density estimate with Scott's bandwidth, evaluated on
/// `points` evenly spaced positions extending three bandwidths past the data.
///
/// `None` with fewer than two values or zero spread.
pub fn gaussian_kde(values: &[f64], points: usize) -> Option<Vec<(f64, f64)>> {
    let data = stats::present(values);
    let n = data.len();
    let std = stats::sample_std(&data);
    if n < 2 || !(std > 0.0) || points < 2 {
        return None;
    }

    let bandwidth = std * (n as f64).powf(-0.2);
    let lo = stats::min(&data) - 3.0 * bandwidth;
    let hi = stats::max(&data) + 3.0 * bandwidth;
    let step = (hi - lo) / (points - 1) as f64;
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    Some(
        (0..points)
            .map(|i| {
                let x = lo + step * i as f64;
                let density = data
                    .iter()
                    .map(|xi| (-0.5 * ((x - xi) / bandwidth).powi(2)).exp())
                    .sum::<f64>()
                    * norm;
                (x, density)
            })
            .collect(),
    )
}

/// Normal probability plot coordinates: (theoretical quantile, ordered value).
///
/// Theoretical quantiles use Filliben's estimate of the uniform order
/// statistic medians.
pub fn normal_qq_points(values: &[f64]) -> Vec<(f64, f64)> {
    let sorted = stats::sorted_present(values);
    let n = sorted.len();
    if n == 0 {
        return Vec::new();
    }

    let Ok(normal) = Normal::new(0.0, 1.0) else {
        return Vec::new();
    };

    let last = 0.5f64.powf(1.0 / n as f64);
    let medians = (0..n).map(|i| {
        if i == n - 1 {
            last
        } else if i == 0 {
            1.0 - last
        } else {
            (i as f64 + 1.0 - 0.3175) / (n as f64 + 0.365)
        }
    });

    medians
        .zip(sorted)
        .map(|(m, v)| (normal.inverse_cdf(m), v))
        .collect()
}

/// Least-squares line `(slope, intercept)` through the points.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let mx = points.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let my = points.iter().map(|p| p.1).sum::<f64>() / n as f64;
    let sxx: f64 = points.iter().map(|(x, _)| (x - mx).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = points.iter().map(|(x, y)| (x - mx) * (y - my)).sum();
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

/// Mean with a two-sided Student-t confidence interval `(mean, low, high)`.
///
/// A single value gives a zero-width interval; no values give `None`.
pub fn mean_confidence_interval(values: &[f64], level: f64) -> Option<(f64, f64, f64)> {
    let data = stats::present(values);
    let n = data.len();
    if n == 0 {
        return None;
    }
    let mean = stats::mean(&data);
    if n == 1 {
        return Some((mean, mean, mean));
    }

    let se = stats::sample_std(&data) / (n as f64).sqrt();
    let t = StudentsT::new(0.0, 1.0, (n - 1) as f64)
        .ok()?
        .inverse_cdf(1.0 - (1.0 - level) / 2.0);
    let half = t * se;
    Some((mean, mean - half, mean + half))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_box_stats_with_outlier() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let b = BoxStats::from_values(&values).unwrap();
        assert!(close(b.q1, 2.25, 1e-12));
        assert!(close(b.median, 3.5, 1e-12));
        assert!(close(b.q3, 4.75, 1e-12));
        assert_eq!(b.lower_whisker, 1.0);
        assert_eq!(b.upper_whisker, 5.0);
        assert_eq!(b.outliers, vec![100.0]);
        assert!(BoxStats::from_values(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_histogram_counts() {
        let h = Histogram::new(&[0.0, 0.0, 1.0, 4.9, 5.0, 10.0, f64::NAN], (0.0, 10.0), 2);
        assert_eq!(h.edges, vec![0.0, 5.0, 10.0]);
        assert_eq!(h.counts, vec![4, 2]);
        assert_eq!(h.bin_width(), 5.0);
        assert_eq!(h.max_count(), 4);
        assert_eq!(h.bars().count(), 2);
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(0.0, 10.0, 0.1), Some((-1.0, 11.0)));
        assert_eq!(padded_range(4.0, 4.0, 0.1), Some((3.5, 4.5)));
        assert_eq!(padded_range(f64::NAN, 1.0, 0.1), None);
    }

    #[test]
    fn test_auto_bin_count() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let bins = auto_bin_count(&values);
        // Sturges gives ceil(log2(100) + 1) = 8 bins; FD is coarser here
        assert_eq!(bins, 8);
        assert_eq!(auto_bin_count(&[4.0, 4.0, 4.0]), 1);
        assert_eq!(auto_bin_count(&[]), 1);
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let values = [1.0, 2.0, 2.5, 3.0, 4.0, 4.5, 6.0];
        let curve = gaussian_kde(&values, 400).unwrap();
        let step = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|(_, d)| d * step).sum();
        assert!(close(area, 1.0, 0.02));
        assert!(gaussian_kde(&[3.0, 3.0], 100).is_none());
    }

    #[test]
    fn test_qq_points_symmetric() {
        let points = normal_qq_points(&[3.0, 1.0, 2.0]);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].1, 1.0);
        assert_eq!(points[2].1, 3.0);
        assert!(close(points[1].0, 0.0, 1e-9));
        assert!(close(points[0].0, -points[2].0, 1e-9));

        let (slope, intercept) = linear_fit(&points).unwrap();
        assert!(slope > 0.0);
        assert!(close(intercept, 2.0, 1e-9));
    }

    #[test]
    fn test_linear_fit_exact() {
        let (slope, intercept) = linear_fit(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap();
        assert!(close(slope, 2.0, 1e-12));
        assert!(close(intercept, 1.0, 1e-12));
        assert!(linear_fit(&[(1.0, 1.0), (1.0, 2.0)]).is_none());
    }

    #[test]
    fn test_mean_confidence_interval() {
        let (mean, low, high) = mean_confidence_interval(&[2.0, 4.0, 6.0, 8.0], 0.95).unwrap();
        assert!(close(mean, 5.0, 1e-12));
        // t(0.975, 3) = 3.182446; se = sqrt(20/3)/2
        let half = 3.182446 * (20.0f64 / 3.0).sqrt() / 2.0;
        assert!(close(high - mean, half, 1e-4));
        assert!(close(mean - low, half, 1e-4));

        assert_eq!(mean_confidence_interval(&[7.0], 0.95), Some((7.0, 7.0, 7.0)));
        assert!(mean_confidence_interval(&[], 0.95).is_none());
    }
}
