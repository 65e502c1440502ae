//! Performance Statistics
//!
//! The frozen snapshot reported for a baseline: moments from a
//! [`RunningStatistics`] accumulator plus nearest-rank percentiles and a
//! throughput estimate.

use crate::percentiles::{LatencyPercentiles, compute_percentiles};
use crate::running::RunningStatistics;
use serde::{Deserialize, Serialize};

/// Comprehensive statistics for one operation's historical values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStatistics {
    pub mean: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub count: u64,
    pub min_value: f64,
    pub max_value: f64,

    // Statistical inference
    pub confidence_interval: (f64, f64),
    pub standard_error: f64,

    // Performance metrics
    /// `1 / mean` when the values are durations (0 if the mean is not positive)
    pub throughput_ops_per_sec: f64,
    pub latency_percentiles: LatencyPercentiles,

    // Shape
    pub coefficient_of_variation: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl PerformanceStatistics {
    /// Build the snapshot from an accumulator and precomputed percentiles
    pub fn from_parts(
        stats: &RunningStatistics,
        latency_percentiles: LatencyPercentiles,
        confidence_level: f64,
    ) -> Self {
        let throughput_ops_per_sec = if stats.mean() > 0.0 {
            1.0 / stats.mean()
        } else {
            0.0
        };

        Self {
            mean: stats.mean(),
            std_dev: stats.std_dev(),
            variance: stats.variance(),
            count: stats.count(),
            min_value: stats.min(),
            max_value: stats.max(),
            confidence_interval: stats.confidence_interval(confidence_level),
            standard_error: stats.standard_error(),
            throughput_ops_per_sec,
            latency_percentiles,
            coefficient_of_variation: stats.coefficient_of_variation(),
            skewness: stats.skewness(),
            kurtosis: stats.kurtosis(),
        }
    }
}

/// Compute performance statistics sequentially from raw values
pub fn compute_performance_statistics(
    values: &[f64],
    confidence_level: f64,
) -> (RunningStatistics, PerformanceStatistics) {
    let stats = RunningStatistics::from_slice(values);
    let snapshot = PerformanceStatistics::from_parts(&stats, compute_percentiles(values), confidence_level);
    (stats, snapshot)
}
