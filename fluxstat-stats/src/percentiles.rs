//! Latency Percentiles
//!
//! Nearest-rank percentiles over a sorted copy of the input. The rank for
//! percentile `p` of `n` samples is `floor(n * p / 100)`, clamped to the last
//! index, so every reported value is an observed sample.

use serde::{Deserialize, Serialize};

/// Latency percentiles reported with every baseline
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatencyPercentiles {
    /// 50th percentile (median)
    #[serde(rename = "50")]
    pub p50: f64,
    /// 90th percentile
    #[serde(rename = "90")]
    pub p90: f64,
    /// 95th percentile
    #[serde(rename = "95")]
    pub p95: f64,
    /// 99th percentile
    #[serde(rename = "99")]
    pub p99: f64,
}

/// Compute a single nearest-rank percentile from already sorted samples
pub fn nearest_rank(sorted: &[f64], percentile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let idx = (n as f64 * percentile / 100.0).floor() as usize;
    sorted[idx.min(n - 1)]
}

/// Sort a copy of the samples (NaN-tolerant total order)
pub fn sorted_copy(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Compute the standard latency percentiles
pub fn compute_percentiles(samples: &[f64]) -> LatencyPercentiles {
    let sorted = sorted_copy(samples);
    LatencyPercentiles {
        p50: nearest_rank(&sorted, 50.0),
        p90: nearest_rank(&sorted, 90.0),
        p95: nearest_rank(&sorted, 95.0),
        p99: nearest_rank(&sorted, 99.0),
    }
}
