//! Report Data Structures

use chrono::{DateTime, Utc};
use fluxstat::{Backend, Baseline, PerformanceStatistics, StatisticalPerformanceEngine};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// JSON document
    Json,
    /// Human-readable terminal output
    #[default]
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Report header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// fluxstat version that produced the report
    pub version: String,
    /// Generation time
    pub timestamp: DateTime<Utc>,
    /// Backend that computed the statistics
    pub backend: Backend,
    /// Confidence level of every interval in the report
    pub confidence_level: f64,
}

impl ReportMeta {
    /// Header describing `engine` as of now
    pub fn for_engine(engine: &StatisticalPerformanceEngine) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            backend: engine.backend(),
            confidence_level: engine.config().confidence_level,
        }
    }
}

/// Baselines computed by `fluxstat analyze`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub meta: ReportMeta,
    pub baselines: BTreeMap<String, PerformanceStatistics>,
}

/// Assemble an analysis report from freshly established baselines
pub fn build_analysis_report(
    engine: &StatisticalPerformanceEngine,
    baselines: &BTreeMap<String, Baseline>,
) -> AnalysisReport {
    AnalysisReport {
        meta: ReportMeta::for_engine(engine),
        baselines: baselines
            .iter()
            .map(|(id, baseline)| (id.clone(), baseline.performance().clone()))
            .collect(),
    }
}

/// Generate a prettified JSON report.
pub fn generate_json_report<T: Serialize>(report: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
