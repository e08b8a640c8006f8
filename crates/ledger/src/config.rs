//! Circuit breaker configuration

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Trip-on-threshold breaker settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive total failures that open the breaker
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Rolling window: a failure later than this after the previous one
    /// restarts the count
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// How long the breaker stays open once tripped
    #[serde(default = "default_open_secs")]
    pub open_secs: u64,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    60
}

fn default_open_secs() -> u64 {
    60
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            window_secs: default_window_secs(),
            open_secs: default_open_secs(),
        }
    }
}

impl BreakerConfig {
    pub fn window(&self) -> Duration {
        Duration::seconds(self.window_secs as i64)
    }

    pub fn open_for(&self) -> Duration {
        Duration::seconds(self.open_secs as i64)
    }
}
