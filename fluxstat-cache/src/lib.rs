#![warn(missing_docs)]
//! FluxStat Cache
//!
//! Memoization cache for expensive deterministic computations:
//! - Per-entry TTL with lazy expiry on access
//! - Least-recently-used eviction at capacity
//! - Hit, miss and eviction counters

mod cache;
mod config;
mod error;

pub use cache::{CacheEntry, CacheStats, HighPerformanceCache};
pub use config::{CacheConfig, DEFAULT_MAX_SIZE, DEFAULT_TTL};
pub use error::CacheError;
