//! Engine configuration

use crate::backend::Backend;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Default number of recent samples retained per operation
pub const DEFAULT_WINDOW_SIZE: usize = 10_000;

/// Statistical engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ring buffer capacity per operation
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Confidence level for intervals; `1 - level` is the significance cut-off
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    /// Requested computation backend
    #[serde(default)]
    pub backend: Backend,
    /// Worker limit for batch analysis (None = shared rayon pool, 1 = sequential)
    #[serde(default)]
    pub batch_workers: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            confidence_level: default_confidence_level(),
            backend: Backend::default(),
            batch_workers: None,
        }
    }
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}
fn default_confidence_level() -> f64 {
    fluxstat_stats::DEFAULT_CONFIDENCE_LEVEL
}

impl EngineConfig {
    /// Reject configurations that would produce misleading statistics
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.window_size == 0 {
            return Err(EngineError::InvalidConfiguration(
                "window_size must be positive".to_string(),
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(EngineError::InvalidConfiguration(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if self.batch_workers == Some(0) {
            return Err(EngineError::InvalidConfiguration(
                "batch_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// p-value below which a baseline difference is significant
    pub fn significance_level(&self) -> f64 {
        1.0 - self.confidence_level
    }
}
