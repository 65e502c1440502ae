//! Cache errors

use thiserror::Error;

/// Errors surfaced when building a cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Capacity or TTL settings are unusable
    #[error("Invalid cache configuration: {0}")]
    InvalidConfiguration(String),
}
