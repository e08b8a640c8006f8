//! Engine configuration
//!
//! Every knob has a serde default so a partial JSON file is enough.

use guardscreen_ledger::BreakerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};

/// Configuration for the screening engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    // === Cache ===
    /// How long a cached aggregate stays reusable
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    // === Probes ===
    /// Per-probe timeout; a probe that outlives it counts as failed
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Confidence level reported when at least one source matched
    #[serde(default = "default_identity_confidence")]
    pub identity_confidence: u8,

    // === Circuit breaker ===
    #[serde(default)]
    pub breaker: BreakerConfig,

    // === Listing ===
    #[serde(default = "default_list_default_limit")]
    pub list_default_limit: usize,

    #[serde(default = "default_list_max_limit")]
    pub list_max_limit: usize,
}

fn default_cache_ttl_secs() -> u64 {
    86_400 // 24 hours
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

fn default_identity_confidence() -> u8 {
    95
}

fn default_list_default_limit() -> usize {
    20
}

fn default_list_max_limit() -> usize {
    50
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            probe_timeout_ms: default_probe_timeout_ms(),
            identity_confidence: default_identity_confidence(),
            breaker: BreakerConfig::default(),
            list_default_limit: default_list_default_limit(),
            list_max_limit: default_list_max_limit(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Cache TTL as chrono Duration (compared against timestamps)
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.cache_ttl_secs).unwrap_or(i64::MAX))
    }

    /// Probe timeout as Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
