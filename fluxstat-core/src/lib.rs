#![warn(missing_docs)]
//! FluxStat Core - Performance Engine
//!
//! Turns a stream of per-operation measurements into live statistics:
//! - `StatisticalPerformanceEngine` with lock-sharded per-operation state
//! - Three-sigma anomaly detection and Welch comparison against baselines
//! - Pluggable statistics backends with host capability detection
//! - Bounded ring buffer of recent samples per operation

mod backend;
mod config;
mod engine;
mod error;
mod measurement;
mod ring;
mod timing;

pub use backend::{
    Backend, BackendCapabilities, CpuBasicBackend, CpuParallelBackend, CpuVectorizedBackend,
    StatisticsBackend, strategy_for,
};
pub use config::{DEFAULT_WINDOW_SIZE, EngineConfig};
pub use engine::{Baseline, StatisticalPerformanceEngine};
pub use error::EngineError;
pub use measurement::{
    ANOMALY_Z_THRESHOLD, AnalysisPerformance, AnalysisSummary, AnomalyDetection, CACHE_HIT_KEY,
    HardwareAcceleration, LiveStatistics, MeasurementResult, Metadata, PerformanceSummary,
};
pub use ring::RingBuffer;
pub use timing::{MonotonicClock, Timer};
