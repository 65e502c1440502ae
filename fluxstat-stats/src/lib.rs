#![warn(missing_docs)]
//! FluxStat Statistical Engine
//!
//! Single-pass statistics for performance measurements:
//! - Welford accumulator extended to skewness and kurtosis, mergeable across lanes
//! - Confidence intervals from normal and Cornish-Fisher t quantiles
//! - Welch's t-test and Hedges-corrected Cohen's d against a frozen baseline
//! - Nearest-rank latency percentiles

mod comparison;
mod distribution;
mod percentiles;
mod running;
mod summary;

pub use comparison::{
    BaselineComparison, EffectInterpretation, WelchTest, cohens_d, compare_to_baseline,
    interpret_effect_size, welch_t_test,
};
pub use distribution::{normal_cdf, normal_quantile, t_cdf, t_quantile};
pub use percentiles::{LatencyPercentiles, compute_percentiles, nearest_rank, sorted_copy};
pub use running::RunningStatistics;
pub use summary::{PerformanceStatistics, compute_performance_statistics};

/// Sample size (or degrees of freedom) from which normal approximations replace t
pub const LARGE_SAMPLE_THRESHOLD: u64 = 30;

/// Default confidence level (95%)
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(LARGE_SAMPLE_THRESHOLD, 30);
        assert!((DEFAULT_CONFIDENCE_LEVEL - 0.95).abs() < f64::EPSILON);
    }
}
