//! Numeric primitives for the descriptive analysis.
//!
//! Every function treats NaN as a missing value and skips it. Statistics of
//! an empty input are NaN rather than an error.

use crate::models::{Describe, SummaryStats};

/// Non-missing values of a slice.
pub fn present(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Non-missing values, sorted ascending.
pub fn sorted_present(values: &[f64]) -> Vec<f64> {
    let mut sorted = present(values);
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> f64 {
    let values = present(values);
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// True when every value equals the first. Rounding in a mean of equal
/// values can leave a tiny residual, so constancy is checked on the values.
fn is_constant(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}

/// Sample variance (n - 1 divisor). NaN with fewer than two values, exactly
/// zero for a constant column.
pub fn sample_variance(values: &[f64]) -> f64 {
    let values = present(values);
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    if is_constant(values.iter().copied()) {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / n as f64;
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Sample standard deviation (n - 1 divisor).
pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Quantile of already sorted data with linear interpolation between
/// closest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Median.
pub fn median(values: &[f64]) -> f64 {
    quantile_sorted(&sorted_present(values), 0.5)
}

/// Smallest value.
pub fn min(values: &[f64]) -> f64 {
    present(values)
        .into_iter()
        .fold(f64::NAN, |acc, v| if acc.is_nan() { v } else { acc.min(v) })
}

/// Largest value.
pub fn max(values: &[f64]) -> f64 {
    present(values)
        .into_iter()
        .fold(f64::NAN, |acc, v| if acc.is_nan() { v } else { acc.max(v) })
}

/// Count, mean, std, median and range.
pub fn summarize(values: &[f64]) -> SummaryStats {
    SummaryStats {
        count: present(values).len(),
        mean: mean(values),
        std: sample_std(values),
        median: median(values),
        min: min(values),
        max: max(values),
    }
}

/// Count, mean, std, min, quartiles and max.
pub fn describe(values: &[f64]) -> Describe {
    let sorted = sorted_present(values);
    Describe {
        count: sorted.len(),
        mean: mean(&sorted),
        std: sample_std(&sorted),
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q25: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or(f64::NAN),
    }
}

/// Rows where both values are present.
fn complete_pairs(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    xs.iter()
        .zip(ys)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(x, y)| (*x, *y))
        .collect()
}

/// Sample covariance over pairwise-complete rows.
pub fn covariance(xs: &[f64], ys: &[f64]) -> f64 {
    let pairs = complete_pairs(xs, ys);
    let n = pairs.len();
    if n < 2 {
        return f64::NAN;
    }
    if is_constant(pairs.iter().map(|p| p.0)) || is_constant(pairs.iter().map(|p| p.1)) {
        return 0.0;
    }
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;
    pairs.iter().map(|(x, y)| (x - mx) * (y - my)).sum::<f64>() / (n - 1) as f64
}

/// Pearson correlation over pairwise-complete rows.
///
/// NaN when fewer than two complete pairs exist or either side has zero
/// variance over those pairs.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let pairs = complete_pairs(xs, ys);
    let n = pairs.len();
    if n < 2 {
        return f64::NAN;
    }
    if is_constant(pairs.iter().map(|p| p.0)) || is_constant(pairs.iter().map(|p| p.1)) {
        return f64::NAN;
    }
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let divisor = (sxx * syy).sqrt();
    if divisor == 0.0 {
        return f64::NAN;
    }
    (sxy / divisor).clamp(-1.0, 1.0)
}

/// Cronbach's alpha over a respondent × item matrix.
///
/// `α = k/(k-1) · (1 - Σ var_i / Σ_ij cov_ij)` with pairwise-complete sample
/// covariances. Every row counts as a respondent.
pub fn cronbach_alpha<const K: usize>(rows: &[[f64; K]]) -> f64 {
    if K < 2 {
        return f64::NAN;
    }

    let columns: Vec<Vec<f64>> = (0..K)
        .map(|i| rows.iter().map(|row| row[i]).collect())
        .collect();

    let mut trace = 0.0;
    let mut total = 0.0;
    for i in 0..K {
        for j in 0..K {
            let cov = covariance(&columns[i], &columns[j]);
            if cov.is_nan() {
                return f64::NAN;
            }
            if i == j {
                trace += cov;
            }
            total += cov;
        }
    }

    if total == 0.0 {
        return f64::NAN;
    }
    (K as f64 / (K - 1) as f64) * (1.0 - trace / total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_and_std_skip_missing() {
        let values = [2.0, 4.0, f64::NAN, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(close(mean(&values), 5.0));
        // Sample variance of 2,4,4,4,5,5,7,9 is 32/7
        assert!(close(sample_std(&values), (32.0f64 / 7.0).sqrt()));
    }

    #[test]
    fn test_empty_and_single() {
        assert!(mean(&[]).is_nan());
        assert!(median(&[f64::NAN]).is_nan());
        assert!(min(&[]).is_nan());
        assert!(sample_std(&[3.0]).is_nan());

        let stats = summarize(&[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
        assert!(stats.max.is_nan());
    }

    #[test]
    fn test_quantiles_linear_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!(close(quantile_sorted(&sorted, 0.25), 1.75));
        assert!(close(quantile_sorted(&sorted, 0.5), 2.5));
        assert!(close(quantile_sorted(&sorted, 0.75), 3.25));
        assert!(close(quantile_sorted(&sorted, 1.0), 4.0));
    }

    #[test]
    fn test_describe() {
        let d = describe(&[5.0, 1.0, 3.0, f64::NAN, 2.0, 4.0]);
        assert_eq!(d.count, 5);
        assert!(close(d.mean, 3.0));
        assert!(close(d.min, 1.0));
        assert!(close(d.q25, 2.0));
        assert!(close(d.median, 3.0));
        assert!(close(d.q75, 4.0));
        assert!(close(d.max, 5.0));
    }

    #[test]
    fn test_pearson() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert!(close(pearson(&xs, &[2.0, 4.0, 6.0, 8.0]), 1.0));
        assert!(close(pearson(&xs, &[8.0, 6.0, 4.0, 2.0]), -1.0));
        // Zero variance is undefined
        assert!(pearson(&xs, &[1.0, 1.0, 1.0, 1.0]).is_nan());
        // Missing values drop the pair
        assert!(close(pearson(&[1.0, 2.0, f64::NAN, 3.0], &[1.0, 2.0, 9.0, 3.0]), 1.0));
    }

    #[test]
    fn test_constant_inexact_column() {
        // 16/3 is not exact in binary; the mean of repeats can drift
        let constant = vec![16.0 / 3.0; 10];
        let xs: Vec<f64> = (0..10).map(f64::from).collect();

        assert_eq!(sample_variance(&constant), 0.0);
        assert_eq!(sample_std(&constant), 0.0);
        assert_eq!(covariance(&xs, &constant), 0.0);
        assert!(pearson(&xs, &constant).is_nan());
        assert!(pearson(&constant, &xs).is_nan());
    }

    #[test]
    fn test_cronbach_alpha_parallel_items() {
        let rows = [[1.0, 2.0, 3.0], [2.0, 3.0, 4.0], [3.0, 4.0, 5.0]];
        assert!(close(cronbach_alpha(&rows), 1.0));
    }

    #[test]
    fn test_cronbach_alpha_hand_computed() {
        // Item variances are all 1
        let rows = [[1.0, 1.0, 2.0], [2.0, 3.0, 3.0], [3.0, 2.0, 1.0]];
        let c01 = covariance(&[1.0, 2.0, 3.0], &[1.0, 3.0, 2.0]);
        let c02 = covariance(&[1.0, 2.0, 3.0], &[2.0, 3.0, 1.0]);
        let c12 = covariance(&[1.0, 3.0, 2.0], &[2.0, 3.0, 1.0]);
        assert!(close(c01, 0.5));
        assert!(close(c02, -0.5));
        assert!(close(c12, 0.5));
        // total = 3 + 2 * (0.5 - 0.5 + 0.5) = 4
        let expected = 1.5 * (1.0 - 3.0 / 4.0);
        assert!(close(cronbach_alpha(&rows), expected));
    }

    #[test]
    fn test_cronbach_alpha_undefined() {
        let constant = [[4.0, 4.0, 4.0], [4.0, 4.0, 4.0]];
        assert!(cronbach_alpha(&constant).is_nan());
        assert!(cronbach_alpha(&[[1.0, 2.0, 3.0]]).is_nan());
    }
}
