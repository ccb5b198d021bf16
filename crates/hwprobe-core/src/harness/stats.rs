//! Descriptive statistics over a run's measurements.

use super::ResultSet;
use serde::{Deserialize, Serialize};

/// Order statistics of trial durations, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationStats {
    pub min_ns: u64,
    pub median_ns: u64,
    pub p95_ns: u64,
    pub max_ns: u64,
}

/// Summary of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub trials: u64,
    pub weight_min: u64,
    pub weight_max: u64,
    pub weight_mean: f64,
    pub duration: DurationStats,
    pub duration_mean_ns: f64,
    /// Pearson correlation of (weight, duration). `None` when either series is constant.
    pub correlation: Option<f64>,
}

/// Min, median, p95 and max of duration samples (in nanoseconds).
///
/// Percentiles use the nearest-rank method. `None` for an empty slice.
#[must_use]
pub fn compute_stats(samples: &[u64]) -> Option<DurationStats> {
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();

    let (&min_ns, &max_ns) = (sorted.first()?, sorted.last()?);
    Some(DurationStats {
        min_ns,
        median_ns: nearest_rank(&sorted, 50),
        p95_ns: nearest_rank(&sorted, 95),
        max_ns,
    })
}

/// The value at 1-based rank `ceil(percent * n / 100)`, clamped to the first element.
fn nearest_rank(sorted: &[u64], percent: usize) -> u64 {
    let rank = (percent * sorted.len()).div_ceil(100).clamp(1, sorted.len());
    sorted[rank - 1]
}

/// Pearson correlation coefficient of two equally long series.
///
/// Returns `None` for fewer than two points, mismatched lengths, or a series
/// with zero variance.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Summarize a result set. `None` if it is empty.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn summarize(results: &ResultSet) -> Option<RunSummary> {
    if results.is_empty() {
        return None;
    }

    let weights = results.weights();
    let nanos: Vec<u64> = results
        .durations()
        .iter()
        .map(|d| d.as_nanos() as u64)
        .collect();

    let n = weights.len() as f64;
    let weight_f: Vec<f64> = weights.iter().map(|&w| w as f64).collect();
    let secs: Vec<f64> = results.durations().iter().map(|d| d.as_secs_f64()).collect();

    Some(RunSummary {
        trials: weights.len() as u64,
        weight_min: weights.iter().copied().min().unwrap_or(0),
        weight_max: weights.iter().copied().max().unwrap_or(0),
        weight_mean: weight_f.iter().sum::<f64>() / n,
        duration: compute_stats(&nanos)?,
        duration_mean_ns: nanos.iter().map(|&ns| ns as f64).sum::<f64>() / n,
        correlation: pearson(&weight_f, &secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::TrialRecord;
    use std::time::Duration;

    #[test]
    fn test_compute_stats_single_sample() {
        let stats = compute_stats(&[1000]).unwrap();
        assert_eq!(stats.min_ns, 1000);
        assert_eq!(stats.median_ns, 1000);
        assert_eq!(stats.p95_ns, 1000);
        assert_eq!(stats.max_ns, 1000);
    }

    #[test]
    fn test_compute_stats_unsorted_input() {
        // Sorted: [100, 200, 300, 400, 500]
        let stats = compute_stats(&[500, 100, 300, 200, 400]).unwrap();
        assert_eq!(stats.min_ns, 100);
        assert_eq!(stats.max_ns, 500);
        // p50: ceil(50 * 5 / 100) = 3 -> 300
        assert_eq!(stats.median_ns, 300);
        // p95: ceil(95 * 5 / 100) = 5 -> 500
        assert_eq!(stats.p95_ns, 500);
    }

    #[test]
    fn test_compute_stats_hundred_samples() {
        let samples: Vec<u64> = (1..=100).collect();
        let stats = compute_stats(&samples).unwrap();
        assert_eq!(stats.median_ns, 50);
        assert_eq!(stats.p95_ns, 95);
    }

    #[test]
    fn test_compute_stats_empty() {
        assert_eq!(compute_stats(&[]), None);
    }

    #[test]
    fn test_compute_stats_two_samples() {
        // p50: ceil(50 * 2 / 100) = 1 -> 10; p95: ceil(95 * 2 / 100) = 2 -> 20
        let stats = compute_stats(&[20, 10]).unwrap();
        assert_eq!(stats.median_ns, 10);
        assert_eq!(stats.p95_ns, 20);
    }

    #[test]
    fn test_pearson_perfect_correlation() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let up = [2.0, 4.0, 6.0, 8.0];
        let down = [8.0, 6.0, 4.0, 2.0];

        assert!((pearson(&xs, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&xs, &down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_known_value() {
        // cov = 2, var_x = 10, var_y = 2 -> 2 / sqrt(20)
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [2.0, 1.0, 2.0, 3.0, 2.0];
        let r = pearson(&xs, &ys).unwrap();
        assert!((r - 2.0 / 20.0_f64.sqrt()).abs() < 1e-12, "{r}");
    }

    #[test]
    fn test_pearson_degenerate_inputs() {
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[2.0]), None);
        assert_eq!(pearson(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn test_summarize() {
        let mut results = ResultSet::new();
        for (weight, micros) in [(100, 10), (110, 30), (105, 20)] {
            results.push(TrialRecord {
                weight,
                duration: Duration::from_micros(micros),
            });
        }

        let summary = summarize(&results).unwrap();
        assert_eq!(summary.trials, 3);
        assert_eq!(summary.weight_min, 100);
        assert_eq!(summary.weight_max, 110);
        assert!((summary.weight_mean - 105.0).abs() < 1e-9);
        assert_eq!(summary.duration.min_ns, 10_000);
        assert_eq!(summary.duration.median_ns, 20_000);
        assert_eq!(summary.duration.max_ns, 30_000);
        assert!((summary.duration_mean_ns - 20_000.0).abs() < 1e-6);
        assert!((summary.correlation.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&ResultSet::new()), None);
    }
}
