//! Result Records
//!
//! Strongly typed shapes returned by the engine. Field names are the external
//! contract consumed by instrumented subsystems and must not change.

use crate::backend::{Backend, BackendCapabilities};
use fluxstat_stats::{BaselineComparison, RunningStatistics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form string tags attached to a measurement
pub type Metadata = BTreeMap<String, String>;

/// Metadata key set by the cache coordinator
pub const CACHE_HIT_KEY: &str = "cache_hit";

/// |z| above which a measurement is flagged
pub const ANOMALY_Z_THRESHOLD: f64 = 3.0;

/// Live statistics snapshot taken right after a measurement is applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveStatistics {
    pub mean: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub count: u64,
    pub confidence_interval: (f64, f64),
    pub coefficient_of_variation: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl LiveStatistics {
    /// Snapshot an accumulator
    pub fn from_running(stats: &RunningStatistics, confidence_level: f64) -> Self {
        Self {
            mean: stats.mean(),
            std_dev: stats.std_dev(),
            variance: stats.variance(),
            count: stats.count(),
            confidence_interval: stats.confidence_interval(confidence_level),
            coefficient_of_variation: stats.coefficient_of_variation(),
            skewness: stats.skewness(),
            kurtosis: stats.kurtosis(),
        }
    }
}

/// Three-sigma anomaly check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDetection {
    pub z_score: f64,
    pub is_anomaly: bool,
    pub threshold: f64,
}

impl AnomalyDetection {
    /// Score `value` against the running mean and standard deviation
    pub fn score(value: f64, stats: &RunningStatistics) -> Self {
        let std_dev = stats.std_dev();
        let z_score = if std_dev > 0.0 {
            (value - stats.mean()) / std_dev
        } else {
            0.0
        };
        Self {
            z_score,
            is_anomaly: z_score.abs() > ANOMALY_Z_THRESHOLD,
            threshold: ANOMALY_Z_THRESHOLD,
        }
    }
}

/// Cost of the engine's own analysis for one measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPerformance {
    pub analysis_time_ms: f64,
    pub backend: Backend,
}

/// Result of `record_measurement`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub operation_id: String,
    pub measurement: f64,
    pub timestamp: f64,
    pub statistics: LiveStatistics,
    pub anomaly_detection: AnomalyDetection,
    pub baseline_comparison: BaselineComparison,
    pub performance: AnalysisPerformance,
    pub metadata: Metadata,
}

impl MeasurementResult {
    /// Whether the coordinator tagged this measurement as a cache hit
    pub fn is_cache_hit(&self) -> bool {
        self.metadata.get(CACHE_HIT_KEY).is_some_and(|v| v == "true")
    }
}

/// Aggregate analysis-time statistics across all operations
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub mean_time_ms: f64,
    pub std_dev_ms: f64,
    pub count: u64,
}

/// Hardware acceleration report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HardwareAcceleration {
    pub vectorized_available: bool,
    pub parallel_available: bool,
    pub gpu_available: bool,
    pub backend_active: Backend,
}

impl HardwareAcceleration {
    pub(crate) fn new(capabilities: &BackendCapabilities, backend_active: Backend) -> Self {
        Self {
            vectorized_available: capabilities.vectorized,
            parallel_available: capabilities.parallel,
            gpu_available: capabilities.gpu,
            backend_active,
        }
    }
}

/// Result of `get_performance_summary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub backend: Backend,
    pub total_operations: u64,
    pub operation_counts: BTreeMap<String, u64>,
    pub window_size: usize,
    pub confidence_level: f64,
    pub analysis_performance: AnalysisSummary,
    pub hardware_acceleration: HardwareAcceleration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_spread_scores_zero() {
        let stats = RunningStatistics::from_slice(&[5.0, 5.0, 5.0]);
        let anomaly = AnomalyDetection::score(5.0, &stats);
        assert_eq!(anomaly.z_score, 0.0);
        assert!(!anomaly.is_anomaly);
        assert_eq!(anomaly.threshold, 3.0);
    }

    #[test]
    fn test_far_value_is_anomalous() {
        let mut stats = RunningStatistics::from_slice(&[10.0, 10.1, 9.9, 10.0, 10.05, 9.95, 10.0]);
        stats.update(25.0);
        // z is computed after the value joins the accumulator
        let anomaly = AnomalyDetection::score(25.0, &stats);
        assert!(anomaly.z_score > 0.0);
        assert!(!AnomalyDetection::score(10.0, &stats).is_anomaly);
    }

    #[test]
    fn test_cache_hit_tag() {
        let stats = RunningStatistics::from_slice(&[1.0]);
        let mut metadata = Metadata::new();
        metadata.insert(CACHE_HIT_KEY.to_string(), "true".to_string());
        let result = MeasurementResult {
            operation_id: "op".to_string(),
            measurement: 0.0,
            timestamp: 0.0,
            statistics: LiveStatistics::from_running(&stats, 0.95),
            anomaly_detection: AnomalyDetection::score(0.0, &stats),
            baseline_comparison: BaselineComparison::absent(),
            performance: AnalysisPerformance {
                analysis_time_ms: 0.0,
                backend: Backend::CpuBasic,
            },
            metadata,
        };
        assert!(result.is_cache_hit());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["anomaly_detection"]["threshold"], 3.0);
        assert_eq!(json["performance"]["backend"], "cpu_basic");
        assert_eq!(json["metadata"]["cache_hit"], "true");
        assert!(json["baseline_comparison"]["p_value"].is_null());
    }
}
