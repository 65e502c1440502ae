//! Statistical Performance Engine
//!
//! Keeps one slot per operation id: running statistics, a bounded window of
//! recent samples and an optional frozen baseline. Slots live in a sharded
//! map and each carries its own lock, so measurements on different operations
//! never contend.
//!
//! Batch analysis is embarrassingly parallel across operations. Each key is
//! analysed independently on the configured rayon pool and the resulting
//! baselines are stored once every key has been processed.

use crate::backend::{
    Backend, BackendCapabilities, CpuBasicBackend, StatisticsBackend, strategy_for,
};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::measurement::{
    AnalysisPerformance, AnalysisSummary, AnomalyDetection, HardwareAcceleration, LiveStatistics,
    MeasurementResult, Metadata, PerformanceSummary,
};
use crate::ring::RingBuffer;
use crate::timing::{MonotonicClock, Timer};
use dashmap::DashMap;
use fluxstat_stats::{
    BaselineComparison, LatencyPercentiles, PerformanceStatistics, RunningStatistics,
    compare_to_baseline,
};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Frozen statistical snapshot used as the reference distribution
///
/// Immutable once built; re-establishing replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Baseline {
    #[serde(skip)]
    statistics: RunningStatistics,
    #[serde(flatten)]
    performance: PerformanceStatistics,
}

impl Baseline {
    /// Accumulated moments of the historical values
    pub fn statistics(&self) -> &RunningStatistics {
        &self.statistics
    }

    /// Reported snapshot (moments, interval, percentiles, throughput)
    pub fn performance(&self) -> &PerformanceStatistics {
        &self.performance
    }

    /// Latency percentiles {50, 90, 95, 99}
    pub fn percentiles(&self) -> &LatencyPercentiles {
        &self.performance.latency_percentiles
    }
}

#[derive(Debug, Default)]
struct OperationState {
    stats: RunningStatistics,
    baseline: Option<Arc<Baseline>>,
    analysis_ms: RunningStatistics,
}

#[derive(Debug)]
struct OperationSlot {
    state: Mutex<OperationState>,
    window: RingBuffer,
}

impl OperationSlot {
    fn new(window_size: usize) -> Self {
        Self {
            state: Mutex::new(OperationState::default()),
            window: RingBuffer::new(window_size),
        }
    }
}

/// Per-operation statistics, anomaly detection and baseline comparison
pub struct StatisticalPerformanceEngine {
    config: EngineConfig,
    backend: Backend,
    capabilities: BackendCapabilities,
    strategy: Arc<dyn StatisticsBackend>,
    batch_strategy: Arc<dyn StatisticsBackend>,
    operations: DashMap<String, Arc<OperationSlot>>,
    clock: MonotonicClock,
    batch_pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for StatisticalPerformanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticalPerformanceEngine")
            .field("config", &self.config)
            .field("backend", &self.backend)
            .field("operations", &self.operations.len())
            .finish()
    }
}

impl StatisticalPerformanceEngine {
    /// Build an engine, probing the host for backend support
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_capabilities(config, BackendCapabilities::detect())
    }

    /// Build an engine against explicit capabilities
    pub fn with_capabilities(
        config: EngineConfig,
        capabilities: BackendCapabilities,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let backend = capabilities.resolve(config.backend)?;

        let batch_pool = match config.batch_workers {
            Some(workers) if workers > 1 => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("fluxstat-batch-{i}"))
                    .build()?,
            ),
            _ => None,
        };

        let strategy = strategy_for(backend);
        let batch_strategy: Arc<dyn StatisticsBackend> = match config.batch_workers {
            Some(1) if strategy.kind() == Backend::CpuParallelCompiled => {
                warn!(
                    strategy = %strategy.kind(),
                    fallback = %Backend::CpuBasic,
                    "batch limited to one worker, falling back to sequential strategy"
                );
                Arc::new(CpuBasicBackend)
            }
            _ => Arc::clone(&strategy),
        };

        info!(
            backend = %backend,
            requested = %config.backend,
            strategy = %strategy.kind(),
            batch_strategy = %batch_strategy.kind(),
            window_size = config.window_size,
            confidence_level = config.confidence_level,
            "statistical engine initialized"
        );

        Ok(Self {
            strategy,
            batch_strategy,
            config,
            backend,
            capabilities,
            operations: DashMap::new(),
            clock: MonotonicClock::new(),
            batch_pool,
        })
    }

    /// Active (resolved) backend
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Host capabilities detected at construction
    pub fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn slot(&self, operation_id: &str) -> Arc<OperationSlot> {
        if let Some(slot) = self.operations.get(operation_id) {
            return Arc::clone(slot.value());
        }
        let window_size = self.config.window_size;
        let entry = self
            .operations
            .entry(operation_id.to_string())
            .or_insert_with(|| Arc::new(OperationSlot::new(window_size)));
        Arc::clone(entry.value())
    }

    fn existing_slot(&self, operation_id: &str) -> Option<Arc<OperationSlot>> {
        self.operations
            .get(operation_id)
            .map(|slot| Arc::clone(slot.value()))
    }

    /// Record a measurement stamped with the engine's monotonic clock
    pub fn record_measurement(
        &self,
        operation_id: &str,
        value: f64,
        metadata: Metadata,
    ) -> MeasurementResult {
        let timestamp = self.clock.now();
        self.record_measurement_at(operation_id, value, timestamp, metadata)
    }

    /// Record a measurement with a caller-supplied timestamp
    pub fn record_measurement_at(
        &self,
        operation_id: &str,
        value: f64,
        timestamp: f64,
        metadata: Metadata,
    ) -> MeasurementResult {
        let timer = Timer::start();
        let slot = self.slot(operation_id);
        slot.window.append(value);

        let (stats, baseline) = {
            let mut state = slot.state.lock();
            state.stats.update(value);
            (state.stats, state.baseline.clone())
        };

        let anomaly_detection = AnomalyDetection::score(value, &stats);
        if anomaly_detection.is_anomaly {
            debug!(
                operation_id,
                value,
                z_score = anomaly_detection.z_score,
                "anomalous measurement"
            );
        }

        let baseline_comparison = baseline
            .map(|b| compare_to_baseline(&stats, &b.statistics, self.config.significance_level()))
            .unwrap_or_else(BaselineComparison::absent);

        let statistics = LiveStatistics::from_running(&stats, self.config.confidence_level);
        let analysis_time_ms = timer.elapsed_ms();
        slot.state.lock().analysis_ms.update(analysis_time_ms);

        trace!(operation_id, value, count = stats.count(), "measurement recorded");

        MeasurementResult {
            operation_id: operation_id.to_string(),
            measurement: value,
            timestamp,
            statistics,
            anomaly_detection,
            baseline_comparison,
            performance: AnalysisPerformance {
                analysis_time_ms,
                backend: self.backend,
            },
            metadata,
        }
    }

    fn build_baseline(&self, strategy: &dyn StatisticsBackend, values: &[f64]) -> Baseline {
        let (statistics, performance) = strategy.analyze(values, self.config.confidence_level);
        Baseline {
            statistics,
            performance,
        }
    }

    fn store_baseline(&self, operation_id: &str, baseline: Arc<Baseline>) {
        debug!(
            operation_id,
            mean = baseline.performance.mean,
            std_dev = baseline.performance.std_dev,
            count = baseline.performance.count,
            "baseline established"
        );
        self.slot(operation_id).state.lock().baseline = Some(baseline);
    }

    /// Freeze `values` as the reference distribution for `operation_id`
    ///
    /// Independent of any samples already recorded for the operation. Fails
    /// without touching the existing baseline when `values` is empty.
    pub fn establish_baseline(
        &self,
        operation_id: &str,
        values: &[f64],
    ) -> Result<Baseline, EngineError> {
        if values.is_empty() {
            return Err(EngineError::EmptyBaselineInput {
                operation_id: operation_id.to_string(),
            });
        }
        let baseline = self.build_baseline(self.strategy.as_ref(), values);
        self.store_baseline(operation_id, Arc::new(baseline.clone()));
        Ok(baseline)
    }

    /// Establish baselines for many operations at once
    ///
    /// Keys are analysed independently (in parallel unless limited to one
    /// worker, in which case the parallel strategy is swapped for the
    /// sequential one so nothing runs on a rayon pool). Every key is validated first, so an empty value list fails the
    /// whole batch before any baseline is replaced.
    pub fn batch_statistical_analysis<I>(
        &self,
        operation_data: I,
    ) -> Result<BTreeMap<String, Baseline>, EngineError>
    where
        I: IntoIterator<Item = (String, Vec<f64>)>,
    {
        let items: Vec<(String, Vec<f64>)> = operation_data.into_iter().collect();
        if let Some((operation_id, _)) = items.iter().find(|(_, values)| values.is_empty()) {
            return Err(EngineError::EmptyBaselineInput {
                operation_id: operation_id.clone(),
            });
        }

        let strategy = self.batch_strategy.as_ref();
        let analyze = |(operation_id, values): &(String, Vec<f64>)| {
            (operation_id.clone(), self.build_baseline(strategy, values))
        };
        let built: Vec<(String, Baseline)> = match (&self.batch_pool, self.config.batch_workers) {
            (_, Some(1)) => items.iter().map(analyze).collect(),
            (Some(pool), _) => pool.install(|| items.par_iter().map(analyze).collect()),
            (None, _) => items.par_iter().map(analyze).collect(),
        };

        let mut results = BTreeMap::new();
        for (operation_id, baseline) in built {
            self.store_baseline(&operation_id, Arc::new(baseline.clone()));
            results.insert(operation_id, baseline);
        }
        Ok(results)
    }

    /// Current baseline for an operation
    pub fn baseline(&self, operation_id: &str) -> Option<Arc<Baseline>> {
        self.existing_slot(operation_id)?.state.lock().baseline.clone()
    }

    /// Running statistics for an operation
    pub fn statistics(&self, operation_id: &str) -> Option<RunningStatistics> {
        Some(self.existing_slot(operation_id)?.state.lock().stats)
    }

    /// Recent samples for an operation, oldest first
    pub fn recent_window(&self, operation_id: &str) -> Option<Vec<f64>> {
        Some(self.existing_slot(operation_id)?.window.get_data())
    }

    /// Known operation ids, sorted
    pub fn operation_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.operations.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Aggregate counters across all operations
    pub fn get_performance_summary(&self) -> PerformanceSummary {
        // Collect handles first so no shard lock is held while slots are locked.
        let slots: Vec<(String, Arc<OperationSlot>)> = self
            .operations
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();

        let mut operation_counts = BTreeMap::new();
        let mut analysis = RunningStatistics::new();
        for (operation_id, slot) in slots {
            let state = slot.state.lock();
            operation_counts.insert(operation_id, state.stats.count());
            analysis.merge(&state.analysis_ms);
        }

        PerformanceSummary {
            backend: self.backend,
            total_operations: operation_counts.values().sum(),
            operation_counts,
            window_size: self.config.window_size,
            confidence_level: self.config.confidence_level,
            analysis_performance: AnalysisSummary {
                mean_time_ms: analysis.mean(),
                std_dev_ms: analysis.std_dev(),
                count: analysis.count(),
            },
            hardware_acceleration: HardwareAcceleration::new(&self.capabilities, self.backend),
        }
    }
}
