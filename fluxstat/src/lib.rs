#![warn(missing_docs)]
//! # FluxStat
//!
//! Real-time statistical performance monitoring for Rust services.
//!
//! - **Single-pass statistics**: Welford accumulators with skewness, kurtosis and
//!   mergeable partial results
//! - **Anomaly detection**: three-sigma z-score on every measurement
//! - **Baseline comparison**: Welch's t-test and Hedges-corrected Cohen's d
//!   against a frozen historical distribution
//! - **Backend selection**: basic, lane-vectorized or rayon-parallel analysis,
//!   resolved against host capabilities
//! - **Instrumented cache**: TTL + LRU memoization whose latencies feed the engine
//!
//! ## Quick Start
//!
//! ```ignore
//! use fluxstat::prelude::*;
//!
//! let cache = InstrumentedCache::<String>::from_configs(
//!     EngineConfig::default(),
//!     CacheConfig::default(),
//! )?;
//! let (value, result) = cache.get_or_compute("user:42", "load_user", load_user, None);
//! if result.anomaly_detection.is_anomaly {
//!     tracing::warn!(z = result.anomaly_detection.z_score, "slow load");
//! }
//! ```

mod coordinator;

pub use coordinator::{
    BatchOutcome, InstrumentedCache, MIN_IMPROVEMENT_SAMPLES, OperationImprovement,
    OptimizationReport,
};

// Re-export stats
pub use fluxstat_stats::{
    BaselineComparison, DEFAULT_CONFIDENCE_LEVEL, EffectInterpretation, LatencyPercentiles,
    PerformanceStatistics, RunningStatistics, WelchTest, cohens_d, compare_to_baseline,
    compute_percentiles, compute_performance_statistics, welch_t_test,
};

// Re-export engine types
pub use fluxstat_core::{
    AnomalyDetection, Backend, BackendCapabilities, Baseline, CACHE_HIT_KEY, EngineConfig,
    EngineError, LiveStatistics, MeasurementResult, Metadata, PerformanceSummary, RingBuffer,
    StatisticalPerformanceEngine,
};

// Re-export cache types
pub use fluxstat_cache::{
    CacheConfig, CacheError, CacheStats, DEFAULT_MAX_SIZE, DEFAULT_TTL, HighPerformanceCache,
};

/// Construction errors from either half of an [`InstrumentedCache`]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Engine rejected its configuration or backend
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Cache rejected its configuration
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Backend, CacheConfig, EngineConfig, HighPerformanceCache, InstrumentedCache,
        MeasurementResult, Metadata, StatisticalPerformanceEngine,
    };
}
