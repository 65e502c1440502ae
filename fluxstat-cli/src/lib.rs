#![warn(missing_docs)]
//! FluxStat CLI Library
//!
//! Command-line front end for the statistical engine:
//! - `fluxstat analyze <FILE>` establishes baselines from a JSON map of
//!   operation ids to latency samples
//! - `fluxstat bench` measures the engine itself on synthetic data
//! - `fluxstat init` prints a default `fluxstat.toml`

mod bench;
mod config;
mod formatting;
mod report;

pub use bench::{
    BATCH_OPERATIONS, BatchMetrics, BenchReport, CACHE_KEYS, CacheMetrics, DEFAULT_BENCH_SAMPLES,
    RecordMetrics, run_self_benchmark,
};
pub use config::*;
pub use formatting::{format_bench_output, format_human_output, format_ms};
pub use report::{
    AnalysisReport, OutputFormat, ReportMeta, build_analysis_report, generate_json_report,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use fluxstat::{Backend, EngineConfig, StatisticalPerformanceEngine};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// FluxStat CLI arguments
#[derive(Parser, Debug)]
#[command(name = "fluxstat")]
#[command(author, version, about = "FluxStat - statistical performance analysis")]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (discovered from the current directory if omitted)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: human, json
    #[arg(long, global = true)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Computation backend: auto, cpu_basic, cpu_vectorized, cpu_parallel_compiled, gpu_accelerated
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Recent samples retained per operation
    #[arg(long, global = true)]
    pub window_size: Option<usize>,

    /// Confidence level for intervals (e.g., 0.99)
    #[arg(long, global = true)]
    pub confidence: Option<f64>,

    /// Worker threads for batch analysis; 1 = sequential
    #[arg(long, short = 'j', global = true)]
    pub threads: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Establish baselines from a JSON file of operation latencies
    Analyze {
        /// JSON object mapping operation ids to arrays of latencies (ms)
        #[arg(name = "FILE")]
        file: PathBuf,
    },
    /// Benchmark the engine on synthetic measurements
    Bench {
        /// Synthetic measurements per phase
        #[arg(long, short = 'n', default_value_t = DEFAULT_BENCH_SAMPLES)]
        samples: usize,
    },
    /// Print a default fluxstat.toml
    Init,
}

/// Run the FluxStat CLI with process arguments.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the FluxStat CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    init_tracing(cli.verbose);

    let output = match cli.command {
        Commands::Init => FluxStatConfig::default_toml(),
        Commands::Analyze { .. } | Commands::Bench { .. } => run_engine_command(&cli)?,
    };

    write_output(cli.output.as_deref(), &output)
}

fn run_engine_command(cli: &Cli) -> anyhow::Result<String> {
    let config = match &cli.config {
        Some(path) => FluxStatConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => FluxStatConfig::discover().unwrap_or_default(),
    };

    let format: OutputFormat = cli
        .format
        .as_deref()
        .unwrap_or(&config.output.format)
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let engine_config = resolve_engine_config(cli, &config)?;
    let engine = Arc::new(StatisticalPerformanceEngine::new(engine_config)?);

    let output = match cli.command {
        Commands::Analyze { ref file } => {
            let report = analyze_file(&engine, file)?;
            match format {
                OutputFormat::Json => generate_json_report(&report)?,
                OutputFormat::Human => format_human_output(&report),
            }
        }
        Commands::Bench { samples } => {
            let cache_config = config.cache.to_cache_config()?;
            let report = run_self_benchmark(&engine, cache_config, samples)?;
            match format {
                OutputFormat::Json => generate_json_report(&report)?,
                OutputFormat::Human => format_bench_output(&report),
            }
        }
        Commands::Init => FluxStatConfig::default_toml(),
    };
    Ok(output)
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "fluxstat=debug"
    } else {
        "fluxstat=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Merge file configuration with CLI overrides (CLI wins)
pub fn resolve_engine_config(cli: &Cli, config: &FluxStatConfig) -> anyhow::Result<EngineConfig> {
    let mut engine = config.engine.clone();
    if let Some(ref backend) = cli.backend {
        engine.backend = backend
            .parse::<Backend>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(window_size) = cli.window_size {
        engine.window_size = window_size;
    }
    if let Some(confidence) = cli.confidence {
        engine.confidence_level = confidence;
    }
    if let Some(threads) = cli.threads {
        engine.batch_workers = Some(threads);
    }
    Ok(engine)
}

/// Load `{ operation_id: [latency, ...] }` and establish a baseline per key
pub fn analyze_file(
    engine: &StatisticalPerformanceEngine,
    path: &Path,
) -> anyhow::Result<AnalysisReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let data: BTreeMap<String, Vec<f64>> = serde_json::from_str(&content)
        .with_context(|| format!("Expected a JSON object of number arrays in {}", path.display()))?;

    tracing::info!(operations = data.len(), "analyzing");
    let baselines = engine.batch_statistical_analysis(data)?;
    Ok(build_analysis_report(engine, &baselines))
}

fn write_output(path: Option<&Path>, output: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            file.write_all(output.as_bytes())?;
            println!("Report written to: {}", path.display());
        }
        None => print!("{}", output),
    }
    Ok(())
}
