//! Numeric routines over plain `f64` slices.
//!
//! Callers extract non-null values from a Series first (see
//! [`crate::utils::numeric_values`]); nothing here knows about polars.

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Mean of a slice, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample variance (ddof = 1), `None` with fewer than 2 values.
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

/// Sample standard deviation (ddof = 1).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Linear-interpolated quantile of an ascending slice, `q` in [0, 1].
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Sorted copy of a slice. NaN-free input is assumed.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let m = values.iter().sum::<f64>() / n;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Bias-corrected sample skewness (G1). Needs at least 3 values.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let (m2, m3, _) = central_moments(values);
    if m2 == 0.0 {
        return Some(0.0);
    }
    let n = n as f64;
    let g1 = m3 / m2.powf(1.5);
    Some(g1 * (n * (n - 1.0)).sqrt() / (n - 2.0))
}

/// Bias-corrected excess kurtosis (G2). Needs at least 4 values.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let (m2, _, m4) = central_moments(values);
    if m2 == 0.0 {
        return Some(0.0);
    }
    let n = n as f64;
    let g2 = m4 / (m2 * m2) - 3.0;
    Some((n - 1.0) / ((n - 2.0) * (n - 3.0)) * ((n + 1.0) * g2 + 6.0))
}

/// 1-based ranks with ties given their average rank.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end share ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Pearson correlation of paired samples.
///
/// `None` with fewer than 2 pairs or when either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let mx = mean(&x[..n])?;
    let my = mean(&y[..n])?;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let dx = x[i] - mx;
        let dy = y[i] - my;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Spearman rank correlation: Pearson over average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    pearson(&average_ranks(&x[..n]), &average_ranks(&y[..n]))
}

fn tied_pairs(run: u64) -> u64 {
    run * run.saturating_sub(1) / 2
}

/// Sort in place, returning the number of inversions.
fn merge_count(values: &mut [f64], buffer: &mut Vec<f64>) -> u64 {
    let n = values.len();
    if n < 2 {
        return 0;
    }
    let mid = n / 2;
    let mut swaps = merge_count(&mut values[..mid], buffer);
    swaps += merge_count(&mut values[mid..], buffer);

    buffer.clear();
    let (mut i, mut j) = (0, mid);
    while i < mid && j < n {
        if values[j] < values[i] {
            swaps += (mid - i) as u64;
            buffer.push(values[j]);
            j += 1;
        } else {
            buffer.push(values[i]);
            i += 1;
        }
    }
    buffer.extend_from_slice(&values[i..mid]);
    buffer.extend_from_slice(&values[j..n]);
    values.copy_from_slice(buffer);
    swaps
}

/// Kendall tau-b with tie correction, O(n log n) (Knight 1966).
pub fn kendall_tau_b(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }

    let mut pairs: Vec<(f64, f64)> = x[..n].iter().copied().zip(y[..n].iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let n0 = tied_pairs(n as u64);
    let (mut n1, mut n3) = (0u64, 0u64);
    let (mut x_run, mut xy_run) = (1u64, 1u64);
    for i in 1..n {
        if pairs[i].0 == pairs[i - 1].0 {
            x_run += 1;
            if pairs[i].1 == pairs[i - 1].1 {
                xy_run += 1;
            } else {
                n3 += tied_pairs(xy_run);
                xy_run = 1;
            }
        } else {
            n1 += tied_pairs(x_run);
            n3 += tied_pairs(xy_run);
            x_run = 1;
            xy_run = 1;
        }
    }
    n1 += tied_pairs(x_run);
    n3 += tied_pairs(xy_run);

    let mut ys: Vec<f64> = pairs.iter().map(|p| p.1).collect();
    let mut buffer = Vec::with_capacity(n);
    let swaps = merge_count(&mut ys, &mut buffer);

    let mut n2 = 0u64;
    let mut y_run = 1u64;
    for i in 1..n {
        if ys[i] == ys[i - 1] {
            y_run += 1;
        } else {
            n2 += tied_pairs(y_run);
            y_run = 1;
        }
    }
    n2 += tied_pairs(y_run);

    let denominator = ((n0 - n1) as f64 * (n0 - n2) as f64).sqrt();
    if denominator == 0.0 {
        return None;
    }
    let numerator = n0 as f64 - n1 as f64 - n2 as f64 + n3 as f64 - 2.0 * swaps as f64;
    Some((numerator / denominator).clamp(-1.0, 1.0))
}

/// Least-squares slope of `values` against positions 0, 1, 2, ...
pub fn linear_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mx = (n - 1) as f64 / 2.0;
    let my = mean(values)?;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (i, v) in values.iter().enumerate() {
        let dx = i as f64 - mx;
        sxy += dx * (v - my);
        sxx += dx * dx;
    }
    Some(sxy / sxx)
}

/// `k` values drawn without replacement using a seeded generator.
pub fn sample_without_replacement(values: &[f64], k: usize, seed: u64) -> Vec<f64> {
    if values.len() <= k {
        return values.to_vec();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    rand::seq::index::sample(&mut rng, values.len(), k)
        .into_iter()
        .map(|i| values[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let s = [1.0, 2.0, 3.0, 4.0, 1000.0];
        assert_eq!(quantile_sorted(&s, 0.25), Some(2.0));
        assert_eq!(quantile_sorted(&s, 0.5), Some(3.0));
        assert_eq!(quantile_sorted(&s, 0.75), Some(4.0));

        let even = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&even, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&even, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn test_variance_is_sample_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(close(variance(&values).unwrap(), 32.0 / 7.0, 1e-12));
        assert_eq!(variance(&[1.0]), None);
    }

    #[test]
    fn test_skewness_and_kurtosis() {
        let symmetric = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(close(skewness(&symmetric).unwrap(), 0.0, 1e-12));
        assert!(close(kurtosis(&symmetric).unwrap(), -1.2, 1e-9));

        let skewed = [1.0, 1.0, 1.0, 1.0, 10.0];
        assert!(skewness(&skewed).unwrap() > 2.0);

        assert_eq!(skewness(&[1.0, 2.0]), None);
        assert_eq!(kurtosis(&[1.0, 2.0, 3.0]), None);
        assert_eq!(skewness(&[3.0, 3.0, 3.0]), Some(0.0));
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks(&[10.0, 20.0, 10.0, 30.0]);
        assert_eq!(ranks, vec![1.5, 3.0, 1.5, 4.0]);
    }

    #[test]
    fn test_pearson_perfect_and_degenerate() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!(close(pearson(&x, &y).unwrap(), 1.0, 1e-12));

        let inverse = [8.0, 6.0, 4.0, 2.0];
        assert!(close(pearson(&x, &inverse).unwrap(), -1.0, 1e-12));

        assert_eq!(pearson(&x, &[5.0, 5.0, 5.0, 5.0]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
    }

    #[test]
    fn test_spearman_is_rank_based() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 4.0, 9.0, 16.0, 1000.0];
        assert!(close(spearman(&x, &y).unwrap(), 1.0, 1e-12));
    }

    #[test]
    fn test_kendall_tau_b() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(close(kendall_tau_b(&x, &[5.0, 6.0, 7.0, 8.0, 9.0]).unwrap(), 1.0, 1e-12));
        assert!(close(kendall_tau_b(&x, &[9.0, 8.0, 7.0, 6.0, 5.0]).unwrap(), -1.0, 1e-12));

        // one discordant pair out of six: (4 - 1 - 0 + 0 - 2) / 6
        let tau = kendall_tau_b(&[1.0, 2.0, 3.0, 4.0], &[1.0, 3.0, 2.0, 4.0]).unwrap();
        assert!(close(tau, 4.0 / 6.0, 1e-12));

        // one tie in x and one in y: 4 / sqrt(5 * 5)
        let tau = kendall_tau_b(&[1.0, 1.0, 2.0, 3.0], &[1.0, 2.0, 2.0, 3.0]).unwrap();
        assert!(close(tau, 0.8, 1e-12));

        assert_eq!(kendall_tau_b(&x, &[1.0; 5]), None);
    }

    #[test]
    fn test_linear_slope() {
        assert!(close(linear_slope(&[1.0, 3.0, 5.0]).unwrap(), 2.0, 1e-12));
        assert_eq!(linear_slope(&[4.0, 4.0, 4.0]), Some(0.0));
        assert_eq!(linear_slope(&[1.0]), None);
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let values: Vec<f64> = (0..10_000).map(|i| i as f64).collect();
        let a = sample_without_replacement(&values, 5000, 42);
        let b = sample_without_replacement(&values, 5000, 42);
        assert_eq!(a.len(), 5000);
        assert_eq!(a, b);

        let small = sample_without_replacement(&values[..10], 5000, 42);
        assert_eq!(small.len(), 10);
    }
}
