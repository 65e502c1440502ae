//! Engine errors

use crate::backend::Backend;
use thiserror::Error;

/// Errors surfaced by the statistical engine
///
/// Numeric edge cases never appear here; they resolve to neutral values.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid engine configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Cannot establish baseline for '{operation_id}': no values supplied")]
    EmptyBaselineInput { operation_id: String },

    #[error("Backend {0} is not available on this host")]
    BackendUnavailable(Backend),

    #[error("Failed to build batch worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
