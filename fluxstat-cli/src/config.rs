//! Configuration loading from fluxstat.toml
//!
//! The file can sit in the project root; it is discovered by walking up from
//! the current directory unless `--config` names it explicitly.

use fluxstat::{CacheConfig, DEFAULT_MAX_SIZE, DEFAULT_TTL, EngineConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// File name looked up during discovery
pub const CONFIG_FILE_NAME: &str = "fluxstat.toml";

/// FluxStat configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FluxStatConfig {
    /// Statistical engine settings
    #[serde(default)]
    pub engine: EngineConfig,
    /// Cache settings
    #[serde(default)]
    pub cache: CacheSection,
    /// Output settings
    #[serde(default)]
    pub output: OutputSection,
}

/// `[cache]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    /// Maximum number of entries
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// TTL for entries stored without one (e.g., "300s", "5m")
    #[serde(default = "default_ttl")]
    pub default_ttl: String,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            default_ttl: default_ttl(),
        }
    }
}

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}
fn default_ttl() -> String {
    format!("{}s", DEFAULT_TTL.as_secs())
}

impl CacheSection {
    /// Convert to a cache configuration, parsing the TTL string
    pub fn to_cache_config(&self) -> anyhow::Result<CacheConfig> {
        Ok(CacheConfig {
            max_size: self.max_size,
            default_ttl: FluxStatConfig::parse_duration(&self.default_ttl)?,
        })
    }
}

/// `[output]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    /// Default output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl FluxStatConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# FluxStat Configuration

[engine]
# Recent samples retained per operation
window_size = 10000
# Confidence level for intervals (0.0 to 1.0, exclusive)
confidence_level = 0.95
# Backend: "auto", "cpu_basic", "cpu_vectorized", "cpu_parallel_compiled", "gpu_accelerated"
backend = "auto"
# Worker limit for batch analysis; 1 = sequential (uncomment to enable)
# batch_workers = 4

[cache]
# Maximum number of cached entries
max_size = 10000
# TTL for entries stored without one
default_ttl = "300s"

[output]
# Default output format: human, json
format = "human"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "300s", "250ms", "5m")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Duration must be non-negative: {}", s));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_nanos((value * multiplier as f64) as u64))
    }
}
