//! Cache configuration

use crate::error::CacheError;
use std::time::Duration;

/// Default maximum number of entries
pub const DEFAULT_MAX_SIZE: usize = 10_000;

/// Default time-to-live for entries stored without an explicit TTL
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Capacity and expiry settings for [`HighPerformanceCache`](crate::HighPerformanceCache)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of live entries
    pub max_size: usize,
    /// TTL applied when `put` is called without one
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            default_ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    /// Reject configurations the cache cannot honour
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfiguration(
                "max_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.max_size, 10_000);
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = CacheConfig {
            max_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfiguration(_))
        ));
    }
}
