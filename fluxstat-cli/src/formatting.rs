//! Human-readable output

use crate::bench::BenchReport;
use crate::report::AnalysisReport;

/// Format a millisecond value with a unit that keeps it readable
pub fn format_ms(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2} s", ms / 1000.0)
    } else if ms >= 1.0 {
        format!("{:.2} ms", ms)
    } else {
        format!("{:.2} us", ms * 1000.0)
    }
}

/// Render `fluxstat analyze` results as text
pub fn format_human_output(report: &AnalysisReport) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("FluxStat Baselines\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");
    output.push_str(&format!(
        "backend: {}  confidence: {:.0}%\n\n",
        report.meta.backend,
        report.meta.confidence_level * 100.0
    ));

    if report.baselines.is_empty() {
        output.push_str("No operations in input\n");
        return output;
    }

    let confidence_pct = report.meta.confidence_level * 100.0;
    for (operation_id, stats) in &report.baselines {
        output.push_str(&format!("  {}\n", operation_id));
        output.push_str(&format!(
            "      mean: {}  stddev: {}  samples: {}\n",
            format_ms(stats.mean),
            format_ms(stats.std_dev),
            stats.count
        ));
        output.push_str(&format!(
            "      min: {}  max: {}\n",
            format_ms(stats.min_value),
            format_ms(stats.max_value)
        ));
        let p = &stats.latency_percentiles;
        output.push_str(&format!(
            "      p50: {}  p90: {}  p95: {}  p99: {}\n",
            format_ms(p.p50),
            format_ms(p.p90),
            format_ms(p.p95),
            format_ms(p.p99)
        ));
        output.push_str(&format!(
            "      {:.0}% CI: [{}, {}]\n",
            confidence_pct,
            format_ms(stats.confidence_interval.0),
            format_ms(stats.confidence_interval.1)
        ));
        output.push_str(&format!(
            "      throughput: {:.2} ops/sec  cv: {:.3}  skew: {:.3}  kurtosis: {:.3}\n",
            stats.throughput_ops_per_sec,
            stats.coefficient_of_variation,
            stats.skewness,
            stats.kurtosis
        ));
        output.push('\n');
    }

    output
}

/// Render `fluxstat bench` results as text
pub fn format_bench_output(report: &BenchReport) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("FluxStat Engine Benchmark\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    let hw = &report.summary.hardware_acceleration;
    output.push_str(&format!("backend: {}\n", report.meta.backend));
    output.push_str(&format!(
        "hardware: vectorized={} parallel={} gpu={}\n\n",
        hw.vectorized_available, hw.parallel_available, hw.gpu_available
    ));

    output.push_str("Record\n");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  {} measurements in {}\n",
        report.record.measurements,
        format_ms(report.record.total_ms)
    ));
    output.push_str(&format!(
        "  {:.2} us/measurement  {:.0} measurements/sec  anomalies: {}\n\n",
        report.record.mean_us_per_measurement,
        report.record.measurements_per_sec,
        report.record.anomalies
    ));

    output.push_str("Batch analysis\n");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  {} operations x {} values in {}\n\n",
        report.batch.operations,
        report.batch.values_per_operation,
        format_ms(report.batch.elapsed_ms)
    ));

    let cache = &report.cache;
    output.push_str("Instrumented cache\n");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  {} lookups in {}  hit rate: {:.1}%  size: {}/{}\n\n",
        cache.lookups,
        format_ms(cache.elapsed_ms),
        cache.stats.hit_rate * 100.0,
        cache.stats.size,
        cache.stats.max_size
    ));

    let analysis = &report.summary.analysis_performance;
    output.push_str("Summary\n");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  total measurements: {}  operations: {}\n",
        report.summary.total_operations,
        report.summary.operation_counts.len()
    ));
    output.push_str(&format!(
        "  analysis time: mean {} (stddev {}) over {} measurements\n",
        format_ms(analysis.mean_time_ms),
        format_ms(analysis.std_dev_ms),
        analysis.count
    ));

    output
}
