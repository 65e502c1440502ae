//! Computation Backends
//!
//! Capability detection runs once when the engine is built; the resolved
//! backend selects one [`StatisticsBackend`] strategy for batch analysis.
//! Every strategy accumulates through [`RunningStatistics`], so results agree
//! to floating-point tolerance and only throughput differs.

use crate::error::EngineError;
use fluxstat_stats::{
    LatencyPercentiles, PerformanceStatistics, RunningStatistics, compute_percentiles, nearest_rank,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Backend requested for statistical computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Sequential Welford accumulation
    CpuBasic,
    /// Interleaved lane accumulators (needs AVX2 / NEON)
    CpuVectorized,
    /// Chunked reduction on the rayon pool
    CpuParallelCompiled,
    /// Device offload (no GPU runtime is linked into this build)
    GpuAccelerated,
    /// Best available: GPU, then vectorized CPU, then basic CPU
    #[default]
    Auto,
}

impl Backend {
    /// Stable identifier used in results and configuration
    pub fn name(self) -> &'static str {
        match self {
            Backend::CpuBasic => "cpu_basic",
            Backend::CpuVectorized => "cpu_vectorized",
            Backend::CpuParallelCompiled => "cpu_parallel_compiled",
            Backend::GpuAccelerated => "gpu_accelerated",
            Backend::Auto => "auto",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "cpu_basic" | "basic" | "cpu" => Ok(Backend::CpuBasic),
            "cpu_vectorized" | "vectorized" | "simd" => Ok(Backend::CpuVectorized),
            "cpu_parallel_compiled" | "parallel" => Ok(Backend::CpuParallelCompiled),
            "gpu_accelerated" | "gpu" => Ok(Backend::GpuAccelerated),
            "auto" => Ok(Backend::Auto),
            other => Err(format!("Unknown backend: {}", other)),
        }
    }
}

// ─── Capability detection ────────────────────────────────────────────────────

/// Hardware features available to the engine on this host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCapabilities {
    /// Wide vector unit present (AVX2 on x86_64, NEON on aarch64)
    pub vectorized: bool,
    /// More than one hardware thread
    pub parallel: bool,
    /// GPU runtime linked and a device present
    pub gpu: bool,
}

impl BackendCapabilities {
    /// Probe the current host
    pub fn detect() -> Self {
        let parallel = std::thread::available_parallelism()
            .map(|n| n.get() > 1)
            .unwrap_or(false);
        Self {
            vectorized: has_vector_unit(),
            parallel,
            gpu: false,
        }
    }

    /// Capabilities with explicit CPU features and no GPU
    pub fn cpu(vectorized: bool, parallel: bool) -> Self {
        Self {
            vectorized,
            parallel,
            gpu: false,
        }
    }

    /// Whether a concrete backend can run here (`Auto` always can)
    pub fn supports(&self, backend: Backend) -> bool {
        match backend {
            Backend::CpuBasic | Backend::Auto => true,
            Backend::CpuVectorized => self.vectorized,
            Backend::CpuParallelCompiled => self.parallel,
            Backend::GpuAccelerated => self.gpu,
        }
    }

    /// Resolve a requested backend against these capabilities
    ///
    /// `Auto` walks the preference chain and never fails; an explicit request
    /// for an unsupported backend is an error.
    pub fn resolve(&self, requested: Backend) -> Result<Backend, EngineError> {
        if requested != Backend::Auto {
            return if self.supports(requested) {
                Ok(requested)
            } else {
                Err(EngineError::BackendUnavailable(requested))
            };
        }

        for candidate in [Backend::GpuAccelerated, Backend::CpuVectorized] {
            if self.supports(candidate) {
                return Ok(candidate);
            }
            warn!(backend = %candidate, "preferred backend unavailable, falling back");
        }
        debug!("resolved auto backend to cpu_basic");
        Ok(Backend::CpuBasic)
    }
}

#[cfg(target_arch = "x86_64")]
fn has_vector_unit() -> bool {
    std::arch::is_x86_feature_detected!("avx2")
}

#[cfg(target_arch = "aarch64")]
fn has_vector_unit() -> bool {
    std::arch::is_aarch64_feature_detected!("neon")
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn has_vector_unit() -> bool {
    false
}

// ─── Strategies ──────────────────────────────────────────────────────────────

/// One implementation per backend
pub trait StatisticsBackend: Send + Sync + std::fmt::Debug {
    /// Backend this strategy implements
    fn kind(&self) -> Backend;

    /// Accumulate moments over `values`
    fn accumulate(&self, values: &[f64]) -> RunningStatistics;

    /// Nearest-rank latency percentiles over `values`
    fn percentiles(&self, values: &[f64]) -> LatencyPercentiles {
        compute_percentiles(values)
    }

    /// Full snapshot for one operation's values
    fn analyze(
        &self,
        values: &[f64],
        confidence_level: f64,
    ) -> (RunningStatistics, PerformanceStatistics) {
        let stats = self.accumulate(values);
        let percentiles = self.percentiles(values);
        let snapshot = PerformanceStatistics::from_parts(&stats, percentiles, confidence_level);
        (stats, snapshot)
    }
}

/// Sequential reference implementation
#[derive(Debug, Default)]
pub struct CpuBasicBackend;

impl StatisticsBackend for CpuBasicBackend {
    fn kind(&self) -> Backend {
        Backend::CpuBasic
    }

    fn accumulate(&self, values: &[f64]) -> RunningStatistics {
        RunningStatistics::from_slice(values)
    }
}

/// Four interleaved accumulators folded together at the end
///
/// Independent lanes break the loop-carried dependency on a single mean, which
/// lets the compiler keep the lanes in vector registers.
#[derive(Debug, Default)]
pub struct CpuVectorizedBackend;

const LANES: usize = 4;

impl StatisticsBackend for CpuVectorizedBackend {
    fn kind(&self) -> Backend {
        Backend::CpuVectorized
    }

    fn accumulate(&self, values: &[f64]) -> RunningStatistics {
        let mut lanes = [RunningStatistics::new(); LANES];
        let chunks = values.chunks_exact(LANES);
        let remainder = chunks.remainder();
        for chunk in chunks {
            for (lane, &value) in lanes.iter_mut().zip(chunk) {
                lane.update(value);
            }
        }
        for (lane, &value) in lanes.iter_mut().zip(remainder) {
            lane.update(value);
        }

        let mut total = RunningStatistics::new();
        for lane in &lanes {
            total.merge(lane);
        }
        total
    }
}

/// Chunked reduction on the current rayon pool
#[derive(Debug, Default)]
pub struct CpuParallelBackend;

/// Values per rayon task
const PARALLEL_CHUNK: usize = 4096;

impl StatisticsBackend for CpuParallelBackend {
    fn kind(&self) -> Backend {
        Backend::CpuParallelCompiled
    }

    fn accumulate(&self, values: &[f64]) -> RunningStatistics {
        if values.len() <= PARALLEL_CHUNK {
            return RunningStatistics::from_slice(values);
        }
        values
            .par_chunks(PARALLEL_CHUNK)
            .map(RunningStatistics::from_slice)
            .reduce(RunningStatistics::new, |mut acc, part| {
                acc.merge(&part);
                acc
            })
    }

    fn percentiles(&self, values: &[f64]) -> LatencyPercentiles {
        let mut sorted = values.to_vec();
        sorted.par_sort_unstable_by(f64::total_cmp);
        LatencyPercentiles {
            p50: nearest_rank(&sorted, 50.0),
            p90: nearest_rank(&sorted, 90.0),
            p95: nearest_rank(&sorted, 95.0),
            p99: nearest_rank(&sorted, 99.0),
        }
    }
}

/// Strategy for a resolved backend
///
/// Resolution never yields `Auto`, and yields `GpuAccelerated` only when a
/// device is present, which this build never reports.
pub fn strategy_for(backend: Backend) -> Arc<dyn StatisticsBackend> {
    match backend {
        Backend::CpuVectorized => Arc::new(CpuVectorizedBackend),
        Backend::CpuParallelCompiled => Arc::new(CpuParallelBackend),
        Backend::CpuBasic | Backend::GpuAccelerated | Backend::Auto => Arc::new(CpuBasicBackend),
    }
}
