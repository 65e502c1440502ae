//! Engine self-benchmark
//!
//! Drives an engine with synthetic latencies: single-measurement recording
//! throughput, a four-operation batch analysis, then compute-or-fetch
//! lookups through an instrumented cache.

use crate::report::ReportMeta;
use fluxstat::{
    CacheConfig, CacheStats, HighPerformanceCache, InstrumentedCache, Metadata,
    PerformanceSummary, StatisticalPerformanceEngine,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Default number of synthetic measurements per phase
pub const DEFAULT_BENCH_SAMPLES: usize = 10_000;

/// Operations analysed in the batch phase
pub const BATCH_OPERATIONS: usize = 4;

/// Distinct keys cycled through in the cache phase
pub const CACHE_KEYS: usize = 64;

const RECORD_OPERATION: &str = "bench.record";
const CACHE_OPERATION: &str = "bench.cache";

/// Recording throughput
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetrics {
    /// Measurements recorded
    pub measurements: usize,
    /// Wall time for the whole phase
    pub total_ms: f64,
    /// Mean wall time per measurement
    pub mean_us_per_measurement: f64,
    /// Measurements per second
    pub measurements_per_sec: f64,
    /// Anomalies flagged along the way
    pub anomalies: usize,
}

/// Batch analysis timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchMetrics {
    /// Operations analysed
    pub operations: usize,
    /// Values per operation
    pub values_per_operation: usize,
    /// Wall time for the batch call
    pub elapsed_ms: f64,
}

/// Compute-or-fetch timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetrics {
    /// Lookups issued
    pub lookups: usize,
    /// Wall time for the whole phase
    pub elapsed_ms: f64,
    /// Cache counters after the phase
    pub stats: CacheStats,
}

/// Result of `fluxstat bench`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchReport {
    pub meta: ReportMeta,
    pub record: RecordMetrics,
    pub batch: BatchMetrics,
    pub cache: CacheMetrics,
    pub summary: PerformanceSummary,
}

fn synthetic_latencies(rng: &mut StdRng, count: usize, center: f64) -> Vec<f64> {
    (0..count)
        .map(|_| center + rng.gen_range(-0.2..0.2) * center)
        .collect()
}

/// Run every phase against `engine`, with a fresh cache built from `cache_config`
pub fn run_self_benchmark(
    engine: &Arc<StatisticalPerformanceEngine>,
    cache_config: CacheConfig,
    samples: usize,
) -> anyhow::Result<BenchReport> {
    anyhow::ensure!(samples > 0, "bench needs at least one sample");
    let mut rng = StdRng::seed_from_u64(0x5eed);

    let latencies = synthetic_latencies(&mut rng, samples, 10.0);
    let start = Instant::now();
    let mut anomalies = 0;
    for &value in &latencies {
        if engine
            .record_measurement(RECORD_OPERATION, value, Metadata::new())
            .anomaly_detection
            .is_anomaly
        {
            anomalies += 1;
        }
    }
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!(samples, total_ms, "record phase complete");

    let batch_input: Vec<(String, Vec<f64>)> = (0..BATCH_OPERATIONS)
        .map(|i| {
            let center = 5.0 * (i + 1) as f64;
            (
                format!("bench.batch.{i}"),
                synthetic_latencies(&mut rng, samples, center),
            )
        })
        .collect();
    let start = Instant::now();
    engine.batch_statistical_analysis(batch_input)?;
    let batch_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!(operations = BATCH_OPERATIONS, batch_ms, "batch phase complete");

    let cache = InstrumentedCache::new(
        Arc::clone(engine),
        Arc::new(HighPerformanceCache::new(cache_config)?),
    );
    let start = Instant::now();
    for i in 0..samples {
        let key = format!("key-{}", i % CACHE_KEYS);
        cache.get_or_compute(&key, CACHE_OPERATION, || (0..1_000u64).sum::<u64>(), None);
    }
    let cache_ms = start.elapsed().as_secs_f64() * 1000.0;
    let cache_stats = cache.cache().stats();
    info!(hit_rate = cache_stats.hit_rate, cache_ms, "cache phase complete");

    let per_measurement_ms = total_ms / samples as f64;
    Ok(BenchReport {
        meta: ReportMeta::for_engine(engine),
        record: RecordMetrics {
            measurements: samples,
            total_ms,
            mean_us_per_measurement: per_measurement_ms * 1000.0,
            measurements_per_sec: if total_ms > 0.0 {
                samples as f64 / (total_ms / 1000.0)
            } else {
                0.0
            },
            anomalies,
        },
        batch: BatchMetrics {
            operations: BATCH_OPERATIONS,
            values_per_operation: samples,
            elapsed_ms: batch_ms,
        },
        cache: CacheMetrics {
            lookups: samples,
            elapsed_ms: cache_ms,
            stats: cache_stats,
        },
        summary: engine.get_performance_summary(),
    })
}
