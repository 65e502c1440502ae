//! Instrumented cache coordinator
//!
//! Wraps an expensive deterministic computation: a cache hit returns the
//! memoized value, a miss times the computation, stores its result and feeds
//! the latency into the statistical engine. Hits are recorded too (at zero
//! latency, tagged `cache_hit=true`) so the engine sees the full access mix.

use crate::Error;
use fluxstat_cache::{CacheConfig, CacheStats, HighPerformanceCache};
use fluxstat_core::{
    Baseline, CACHE_HIT_KEY, EngineConfig, EngineError, MeasurementResult, Metadata,
    PerformanceSummary, StatisticalPerformanceEngine, Timer,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Operations need more than this many measurements to appear in the
/// improvement section of an [`OptimizationReport`]
pub const MIN_IMPROVEMENT_SAMPLES: u64 = 10;

/// Results of a batch lookup, in input order
#[derive(Debug, Clone)]
pub struct BatchOutcome<V> {
    /// One `(value, measurement)` pair per input item
    pub results: Vec<(V, MeasurementResult)>,
    /// Cache hits in this batch divided by the batch size
    pub hit_rate: f64,
}

/// Baseline versus current latency for one operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationImprovement {
    /// Baseline mean latency
    pub baseline_mean_ms: f64,
    /// Current running mean latency
    pub optimized_mean_ms: f64,
    /// `baseline_mean / current_mean` (1 when the current mean is not positive)
    pub improvement_factor: f64,
    /// Confidence interval of the current mean
    pub confidence_interval: (f64, f64),
    /// Number of measurements behind the current mean
    pub sample_size: u64,
}

/// Engine summary, cache counters and per-operation improvements
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationReport {
    /// Engine-wide counters
    pub statistical_engine: PerformanceSummary,
    /// Cache counters
    pub cache_performance: CacheStats,
    /// Operations with a baseline and enough measurements
    pub operation_improvements: BTreeMap<String, OperationImprovement>,
    /// Confidence level used for the intervals above
    pub confidence_level: f64,
}

/// Compute-or-fetch front end over a shared engine and cache
#[derive(Debug)]
pub struct InstrumentedCache<V> {
    engine: Arc<StatisticalPerformanceEngine>,
    cache: Arc<HighPerformanceCache<V>>,
}

impl<V> Clone for InstrumentedCache<V> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<V: Clone + Send> InstrumentedCache<V> {
    /// Coordinate an existing engine and cache
    pub fn new(
        engine: Arc<StatisticalPerformanceEngine>,
        cache: Arc<HighPerformanceCache<V>>,
    ) -> Self {
        Self { engine, cache }
    }

    /// Build a fresh engine and cache from their configurations
    pub fn from_configs(engine: EngineConfig, cache: CacheConfig) -> Result<Self, Error> {
        Ok(Self::new(
            Arc::new(StatisticalPerformanceEngine::new(engine)?),
            Arc::new(HighPerformanceCache::new(cache)?),
        ))
    }

    /// Underlying statistical engine
    pub fn engine(&self) -> &Arc<StatisticalPerformanceEngine> {
        &self.engine
    }

    /// Underlying cache
    pub fn cache(&self) -> &Arc<HighPerformanceCache<V>> {
        &self.cache
    }

    /// Return the cached value for `key`, or run `compute`, cache its result
    /// and record how long it took under `operation_id`
    pub fn get_or_compute<F>(
        &self,
        key: &str,
        operation_id: &str,
        compute: F,
        ttl: Option<Duration>,
    ) -> (V, MeasurementResult)
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.cache.get(key) {
            let result = self
                .engine
                .record_measurement(operation_id, 0.0, cache_metadata(true));
            return (value, result);
        }

        let timer = Timer::start();
        let value = compute();
        let elapsed_ms = timer.elapsed_ms();

        self.cache.put(key, value.clone(), ttl);
        let result = self
            .engine
            .record_measurement(operation_id, elapsed_ms, cache_metadata(false));
        (value, result)
    }

    /// Resolve many `(key, operation_id, compute)` items on the rayon pool
    ///
    /// Results keep the input order. Items sharing a key may both miss and
    /// compute when resolved concurrently.
    pub fn batch_get_or_compute<F>(&self, items: Vec<(String, String, F)>) -> BatchOutcome<V>
    where
        F: FnOnce() -> V + Send,
    {
        if items.is_empty() {
            return BatchOutcome {
                results: Vec::new(),
                hit_rate: 0.0,
            };
        }

        let total = items.len();
        let results: Vec<(V, MeasurementResult)> = items
            .into_par_iter()
            .map(|(key, operation_id, compute)| {
                self.get_or_compute(&key, &operation_id, compute, None)
            })
            .collect();

        let hits = results.iter().filter(|(_, r)| r.is_cache_hit()).count();
        BatchOutcome {
            results,
            hit_rate: hits as f64 / total as f64,
        }
    }

    /// Establish baselines from historical latencies
    ///
    /// Operations with no historical values are skipped.
    pub fn establish_baselines<I>(
        &self,
        baseline_data: I,
    ) -> Result<BTreeMap<String, Baseline>, EngineError>
    where
        I: IntoIterator<Item = (String, Vec<f64>)>,
    {
        let baselines = self.engine.batch_statistical_analysis(
            baseline_data
                .into_iter()
                .filter(|(_, values)| !values.is_empty()),
        )?;
        for (operation_id, baseline) in &baselines {
            let performance = baseline.performance();
            info!(
                operation_id = %operation_id,
                mean_ms = performance.mean,
                std_dev_ms = performance.std_dev,
                "baseline established"
            );
        }
        Ok(baselines)
    }

    /// Summarize engine, cache and per-operation improvements over baseline
    pub fn optimization_report(&self) -> OptimizationReport {
        let confidence_level = self.engine.config().confidence_level;
        let mut operation_improvements = BTreeMap::new();

        for operation_id in self.engine.operation_ids() {
            let Some(stats) = self.engine.statistics(&operation_id) else {
                continue;
            };
            if stats.count() <= MIN_IMPROVEMENT_SAMPLES {
                continue;
            }
            let Some(baseline) = self.engine.baseline(&operation_id) else {
                continue;
            };

            let baseline_mean_ms = baseline.performance().mean;
            let optimized_mean_ms = stats.mean();
            let improvement_factor = if optimized_mean_ms > 0.0 {
                baseline_mean_ms / optimized_mean_ms
            } else {
                1.0
            };
            operation_improvements.insert(
                operation_id,
                OperationImprovement {
                    baseline_mean_ms,
                    optimized_mean_ms,
                    improvement_factor,
                    confidence_interval: stats.confidence_interval(confidence_level),
                    sample_size: stats.count(),
                },
            );
        }

        OptimizationReport {
            statistical_engine: self.engine.get_performance_summary(),
            cache_performance: self.cache.stats(),
            operation_improvements,
            confidence_level,
        }
    }

    /// Clear the cache and its counters; engine statistics and baselines stay
    pub fn reset_cache_metrics(&self) {
        self.cache.clear();
        info!("cache and cache metrics reset");
    }
}

fn cache_metadata(hit: bool) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(CACHE_HIT_KEY.to_string(), hit.to_string());
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxstat_core::BackendCapabilities;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn coordinator(max_size: usize) -> InstrumentedCache<u64> {
        let engine = StatisticalPerformanceEngine::with_capabilities(
            EngineConfig::default(),
            BackendCapabilities::cpu(false, false),
        )
        .unwrap();
        let cache = HighPerformanceCache::new(CacheConfig {
            max_size,
            ..Default::default()
        })
        .unwrap();
        InstrumentedCache::new(Arc::new(engine), Arc::new(cache))
    }

    #[test]
    fn test_miss_then_hit() {
        let coordinator = coordinator(16);
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            42
        };

        let (value, miss) = coordinator.get_or_compute("k", "op", compute, None);
        assert_eq!(value, 42);
        assert!(!miss.is_cache_hit());
        assert_eq!(miss.metadata[CACHE_HIT_KEY], "false");
        assert!(miss.measurement >= 0.0);

        let (value, hit) = coordinator.get_or_compute("k", "op", compute, None);
        assert_eq!(value, 42);
        assert!(hit.is_cache_hit());
        assert_eq!(hit.measurement, 0.0);
        assert_eq!(hit.statistics.count, 2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!((coordinator.cache().get_hit_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_batch_preserves_order_and_reports_hit_rate() {
        let coordinator = coordinator(16);
        coordinator.get_or_compute("k0", "op", || 0, None);
        coordinator.get_or_compute("k1", "op", || 1, None);

        let items: Vec<(String, String, _)> = (0..4u64)
            .map(|i| (format!("k{i}"), "op".to_string(), move || i * 10))
            .collect();
        let outcome = coordinator.batch_get_or_compute(items);

        let values: Vec<u64> = outcome.results.iter().map(|(v, _)| *v).collect();
        assert_eq!(values, vec![0, 1, 20, 30]);
        assert!((outcome.hit_rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_batch() {
        let coordinator = coordinator(4);
        let items: Vec<(String, String, fn() -> u64)> = Vec::new();
        let outcome = coordinator.batch_get_or_compute(items);
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.hit_rate, 0.0);
    }

    #[test]
    fn test_establish_baselines_skips_empty() {
        let coordinator = coordinator(4);
        let data = vec![
            ("a".to_string(), vec![10.0, 12.0, 14.0]),
            ("b".to_string(), Vec::new()),
        ];
        let baselines = coordinator.establish_baselines(data).unwrap();
        assert_eq!(baselines.len(), 1);
        assert!((baselines["a"].performance().mean - 12.0).abs() < 1e-12);
        assert!(coordinator.engine().baseline("b").is_none());
    }

    #[test]
    fn test_optimization_report_improvements() {
        let coordinator = coordinator(4);
        coordinator
            .establish_baselines(vec![("op".to_string(), vec![20.0; 50])])
            .unwrap();

        for _ in 0..MIN_IMPROVEMENT_SAMPLES {
            coordinator.engine().record_measurement("op", 5.0, Metadata::new());
        }
        assert!(coordinator.optimization_report().operation_improvements.is_empty());

        coordinator.engine().record_measurement("op", 5.0, Metadata::new());
        let report = coordinator.optimization_report();
        let improvement = &report.operation_improvements["op"];
        assert!((improvement.improvement_factor - 4.0).abs() < 1e-9);
        assert_eq!(improvement.sample_size, 11);
        assert_eq!(report.confidence_level, 0.95);
        assert_eq!(report.statistical_engine.total_operations, 11);
    }

    #[test]
    fn test_zero_mean_improvement_factor() {
        let coordinator = coordinator(4);
        coordinator
            .establish_baselines(vec![("op".to_string(), vec![3.0, 4.0])])
            .unwrap();
        for _ in 0..12 {
            coordinator.engine().record_measurement("op", 0.0, Metadata::new());
        }
        let report = coordinator.optimization_report();
        assert_eq!(report.operation_improvements["op"].improvement_factor, 1.0);
    }

    #[test]
    fn test_reset_keeps_engine_state() {
        let coordinator = coordinator(4);
        coordinator.get_or_compute("k", "op", || 7, None);
        coordinator.get_or_compute("k", "op", || 7, None);

        coordinator.reset_cache_metrics();

        let stats = coordinator.cache().stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits + stats.misses, 0);
        assert_eq!(coordinator.engine().statistics("op").unwrap().count(), 2);
    }
}
