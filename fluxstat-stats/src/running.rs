//! Running Statistics
//!
//! Single-pass accumulator of count, mean and the centered moments M2..M4.
//!
//! Every field is advanced through the online recurrence (Welford's update
//! extended to the third and fourth moments), so no raw samples are retained.
//! Two accumulators can be combined with [`RunningStatistics::merge`], which is
//! what the lane-parallel backends use to fold partial results.

use crate::distribution::{normal_quantile, t_quantile};
use crate::LARGE_SAMPLE_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Numerically stable running statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunningStatistics {
    count: u64,
    mean: f64,
    m2: f64,
    m3: f64,
    m4: f64,
    min: f64,
    max: f64,
}

impl Default for RunningStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningStatistics {
    /// Create an empty accumulator
    pub const fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            m3: 0.0,
            m4: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Build an accumulator from a slice, one value at a time
    pub fn from_slice(values: &[f64]) -> Self {
        let mut stats = Self::new();
        for &value in values {
            stats.update(value);
        }
        stats
    }

    /// Fold one observation into the accumulator
    pub fn update(&mut self, value: f64) {
        let n1 = self.count as f64;
        self.count += 1;
        let n = self.count as f64;

        let delta = value - self.mean;
        let delta_n = delta / n;
        let delta_n2 = delta_n * delta_n;
        let term1 = delta * delta_n * n1;

        self.mean += delta_n;
        // M4 and M3 read the previous M2/M3, so the order matters.
        self.m4 += term1 * delta_n2 * (n * n - 3.0 * n + 3.0) + 6.0 * delta_n2 * self.m2
            - 4.0 * delta_n * self.m3;
        self.m3 += term1 * delta_n * (n - 2.0) - 3.0 * delta_n * self.m2;
        self.m2 += term1;

        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Combine another accumulator into this one (pairwise moment update)
    pub fn merge(&mut self, other: &RunningStatistics) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }

        let na = self.count as f64;
        let nb = other.count as f64;
        let n = na + nb;

        let delta = other.mean - self.mean;
        let delta2 = delta * delta;
        let delta3 = delta2 * delta;
        let delta4 = delta2 * delta2;

        let mean = self.mean + delta * nb / n;
        let m2 = self.m2 + other.m2 + delta2 * na * nb / n;
        let m3 = self.m3
            + other.m3
            + delta3 * na * nb * (na - nb) / (n * n)
            + 3.0 * delta * (na * other.m2 - nb * self.m2) / n;
        let m4 = self.m4
            + other.m4
            + delta4 * na * nb * (na * na - na * nb + nb * nb) / (n * n * n)
            + 6.0 * delta2 * (na * na * other.m2 + nb * nb * self.m2) / (n * n)
            + 4.0 * delta * (na * other.m3 - nb * self.m3) / n;

        self.count += other.count;
        self.mean = mean;
        self.m2 = m2;
        self.m3 = m3;
        self.m4 = m4;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Return to the empty state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Number of observations
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Running mean (0 when empty)
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Smallest observation (0 when empty)
    pub fn min(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.min }
    }

    /// Largest observation (0 when empty)
    pub fn max(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.max }
    }

    /// Sample variance, `M2 / (n - 1)`
    pub fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / (self.count - 1) as f64
        } else {
            0.0
        }
    }

    /// Sample standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Standard error of the mean
    pub fn standard_error(&self) -> f64 {
        if self.count > 0 {
            self.std_dev() / (self.count as f64).sqrt()
        } else {
            0.0
        }
    }

    /// Relative dispersion, `std_dev / |mean|`
    ///
    /// Infinite when the mean is zero but the spread is not.
    pub fn coefficient_of_variation(&self) -> f64 {
        let std_dev = self.std_dev();
        if self.mean != 0.0 {
            std_dev / self.mean.abs()
        } else if std_dev > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }

    /// Skewness `(M3/n) / s^3` against the sample standard deviation
    /// (needs at least 3 observations)
    pub fn skewness(&self) -> f64 {
        if self.count < 3 || self.m2 <= 0.0 {
            return 0.0;
        }
        let n = self.count as f64;
        finite_or_zero((self.m3 / n) / self.variance().powf(1.5))
    }

    /// Excess kurtosis `(M4/n) / s^4 - 3` (needs at least 4 observations;
    /// normal data gives ~0)
    pub fn kurtosis(&self) -> f64 {
        if self.count < 4 || self.m2 <= 0.0 {
            return 0.0;
        }
        let n = self.count as f64;
        let variance = self.variance();
        finite_or_zero((self.m4 / n) / (variance * variance) - 3.0)
    }

    /// Two-sided confidence interval for the mean
    ///
    /// Uses the normal quantile for `n >= 30` and a Cornish-Fisher t quantile
    /// below that. Fewer than two observations collapse to `(mean, mean)`.
    pub fn confidence_interval(&self, level: f64) -> (f64, f64) {
        if self.count < 2 {
            return (self.mean, self.mean);
        }

        let alpha = 1.0 - level;
        let p = 1.0 - alpha / 2.0;
        let quantile = if self.count >= LARGE_SAMPLE_THRESHOLD {
            normal_quantile(p)
        } else {
            t_quantile(p, (self.count - 1) as f64)
        };

        let margin = quantile * self.standard_error();
        if !margin.is_finite() {
            return (self.mean, self.mean);
        }
        (self.mean - margin, self.mean + margin)
    }
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

impl Extend<f64> for RunningStatistics {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.update(value);
        }
    }
}

impl FromIterator<f64> for RunningStatistics {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::new();
        stats.extend(iter);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn two_pass(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = if values.len() > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };
        (mean, var)
    }

    fn rel_close(a: f64, b: f64, tol: f64) -> bool {
        let scale = a.abs().max(b.abs()).max(1e-300);
        (a - b).abs() / scale <= tol || (a - b).abs() <= 1e-12
    }

    /// Box-Muller draw from Normal(mu, sigma)
    fn gaussian(rng: &mut StdRng, mu: f64, sigma: f64) -> f64 {
        let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = rng.gen_range(0.0..1.0);
        mu + sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    #[test]
    fn test_empty_is_neutral() {
        let stats = RunningStatistics::new();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.mean(), 0.0);
        assert_eq!(stats.variance(), 0.0);
        assert_eq!(stats.std_dev(), 0.0);
        assert_eq!(stats.standard_error(), 0.0);
        assert_eq!(stats.min(), 0.0);
        assert_eq!(stats.max(), 0.0);
        assert_eq!(stats.coefficient_of_variation(), 0.0);
        assert_eq!(stats.confidence_interval(0.95), (0.0, 0.0));
    }

    #[test]
    fn test_single_value() {
        let mut stats = RunningStatistics::new();
        stats.update(42.0);
        assert_eq!(stats.variance(), 0.0);
        assert_eq!(stats.confidence_interval(0.95), (42.0, 42.0));
        assert_eq!(stats.min(), 42.0);
        assert_eq!(stats.max(), 42.0);
    }

    #[test]
    fn test_basic_moments() {
        let stats = RunningStatistics::from_slice(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((stats.mean() - 5.0).abs() < 1e-12);
        // population variance is 4, sample variance 32/7
        assert!((stats.variance() - 32.0 / 7.0).abs() < 1e-12);
        assert_eq!(stats.min(), 2.0);
        assert_eq!(stats.max(), 9.0);
    }

    #[test]
    fn test_skewness_sign() {
        let right = RunningStatistics::from_slice(&[1.0, 1.0, 1.0, 2.0, 10.0]);
        let left = RunningStatistics::from_slice(&[-1.0, -1.0, -1.0, -2.0, -10.0]);
        assert!(right.skewness() > 0.0);
        assert!(left.skewness() < 0.0);
        assert!((right.skewness() + left.skewness()).abs() < 1e-12);
    }

    #[test]
    fn test_small_sample_moments() {
        // deviations -2,-2,-2,-1,7: M2 = 62, M3 = 318, M4 = 2450, s^2 = 15.5
        let stats = RunningStatistics::from_slice(&[1.0, 1.0, 1.0, 2.0, 10.0]);
        let s2: f64 = 15.5;
        assert!((stats.skewness() - 63.6 / s2.powf(1.5)).abs() < 1e-12);
        assert!((stats.kurtosis() - (490.0 / (s2 * s2) - 3.0)).abs() < 1e-12);
        assert!((stats.skewness() - 1.0422).abs() < 1e-4);
        assert!((stats.kurtosis() + 0.9605).abs() < 1e-4);
    }

    #[test]
    fn test_kurtosis_normal_near_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        let stats: RunningStatistics = (0..50_000).map(|_| gaussian(&mut rng, 0.0, 1.0)).collect();
        assert!(stats.skewness().abs() < 0.1);
        assert!(stats.kurtosis().abs() < 0.1);
    }

    #[test]
    fn test_higher_moments_need_enough_samples() {
        let stats = RunningStatistics::from_slice(&[1.0, 5.0]);
        assert_eq!(stats.skewness(), 0.0);
        let stats = RunningStatistics::from_slice(&[1.0, 5.0, 9.0]);
        assert_eq!(stats.kurtosis(), 0.0);
    }

    #[test]
    fn test_coefficient_of_variation() {
        let stats = RunningStatistics::from_slice(&[-1.0, 1.0]);
        assert!(stats.coefficient_of_variation().is_infinite());

        let stats = RunningStatistics::from_slice(&[0.0, 0.0, 0.0]);
        assert_eq!(stats.coefficient_of_variation(), 0.0);

        let stats = RunningStatistics::from_slice(&[-10.0, -12.0, -8.0]);
        assert!(stats.coefficient_of_variation() > 0.0);
    }

    #[test]
    fn test_numerical_stability_large_offset() {
        let values: Vec<f64> = (0..1000).map(|i| 1e10 + (i % 7) as f64).collect();
        let stats = RunningStatistics::from_slice(&values);
        let (mean, var) = two_pass(&values);
        assert!(rel_close(stats.mean(), mean, 1e-12));
        assert!(rel_close(stats.variance(), var, 1e-4));
        assert!(stats.skewness().is_finite());
        assert!(stats.kurtosis().is_finite());
    }

    #[test]
    fn test_numerical_stability_tiny_values() {
        let values: Vec<f64> = (0..1000).map(|i| 1e-15 * (1.0 + (i % 5) as f64)).collect();
        let stats = RunningStatistics::from_slice(&values);
        let (mean, var) = two_pass(&values);
        assert!(rel_close(stats.mean(), mean, 1e-9));
        assert!(rel_close(stats.variance(), var, 1e-9));
        assert!(stats.std_dev() > 0.0);
    }

    #[test]
    fn test_mixed_magnitudes_stay_finite() {
        let mut stats = RunningStatistics::new();
        for i in 0..500 {
            stats.update(if i % 2 == 0 { 1e10 } else { 1e-15 });
        }
        for value in [
            stats.mean(),
            stats.variance(),
            stats.skewness(),
            stats.kurtosis(),
            stats.coefficient_of_variation(),
            stats.confidence_interval(0.99).0,
            stats.confidence_interval(0.99).1,
        ] {
            assert!(value.is_finite());
        }
    }

    #[test]
    fn test_merge_matches_sequential() {
        let values: Vec<f64> = (0..997).map(|i| ((i * 37) % 101) as f64 * 0.5 - 3.0).collect();
        let sequential = RunningStatistics::from_slice(&values);

        let mut merged = RunningStatistics::new();
        for chunk in values.chunks(64) {
            merged.merge(&RunningStatistics::from_slice(chunk));
        }

        assert_eq!(merged.count(), sequential.count());
        assert!(rel_close(merged.mean(), sequential.mean(), 1e-12));
        assert!(rel_close(merged.variance(), sequential.variance(), 1e-10));
        assert!(rel_close(merged.skewness(), sequential.skewness(), 1e-8));
        assert!(rel_close(merged.kurtosis(), sequential.kurtosis(), 1e-8));
        assert_eq!(merged.min(), sequential.min());
        assert_eq!(merged.max(), sequential.max());
    }

    #[test]
    fn test_merge_with_empty() {
        let base = RunningStatistics::from_slice(&[1.0, 2.0, 3.0]);
        let mut left = base;
        left.merge(&RunningStatistics::new());
        assert_eq!(left, base);

        let mut right = RunningStatistics::new();
        right.merge(&base);
        assert_eq!(right, base);
    }

    #[test]
    fn test_reset() {
        let mut stats = RunningStatistics::from_slice(&[1.0, 2.0, 3.0]);
        stats.reset();
        assert_eq!(stats, RunningStatistics::new());
    }

    #[test]
    fn test_small_sample_interval_is_wider() {
        let values = [9.0, 10.0, 11.0, 10.5, 9.5];
        let stats = RunningStatistics::from_slice(&values);
        let (lo, hi) = stats.confidence_interval(0.95);
        let z_margin = 1.959964 * stats.standard_error();
        assert!(hi - stats.mean() > z_margin);
        assert!((stats.mean() - lo - (hi - stats.mean())).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_interval_coverage() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 1000;
        let mut covered = 0;
        for _ in 0..trials {
            let stats: RunningStatistics = (0..30).map(|_| gaussian(&mut rng, 100.0, 15.0)).collect();
            let (lo, hi) = stats.confidence_interval(0.95);
            if lo <= 100.0 && 100.0 <= hi {
                covered += 1;
            }
        }
        let rate = covered as f64 / trials as f64;
        assert!((0.90..=0.99).contains(&rate), "coverage {rate}");
    }

    proptest! {
        #[test]
        fn prop_welford_matches_two_pass(values in prop::collection::vec(-1e6f64..1e6, 1..200)) {
            let stats = RunningStatistics::from_slice(&values);
            let (mean, var) = two_pass(&values);
            let scale = values.iter().fold(1.0f64, |acc, x| acc.max(x.abs()));
            prop_assert!((stats.mean() - mean).abs() <= 1e-9 * scale);
            prop_assert!((stats.variance() - var).abs() <= 1e-9 * var + 1e-12 * scale * scale);
        }
    }
}
