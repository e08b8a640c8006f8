//! Single-source probe for lower-cost operation
//!
//! One representative source answering from fixed relative-frequency
//! buckets instead of a true fan-out.

use async_trait::async_trait;
use guardscreen_core::{Identity, Offense, Pillar, SourceFinding};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{ProbeError, ProbeResult};
use crate::types::SourceProbe;

/// Probe with bucketed outcomes: ~10% error, ~30% hit, ~60% clear
pub struct RandomizedProbe {
    name: String,
    error_bucket: f64,
    hit_bucket: f64,
    latency_ms: (u64, u64),
    rng: Mutex<StdRng>,
}

impl RandomizedProbe {
    pub const DEFAULT_NAME: &'static str = "National Criminal Index";

    pub fn new() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            error_bucket: 0.1,
            hit_bucket: 0.3,
            latency_ms: (1500, 3000),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn with_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.latency_ms = (min_ms.min(max_ms), min_ms.max(max_ms));
        self
    }

    /// Bucket widths; clear takes whatever is left
    pub fn with_buckets(mut self, error: f64, hit: f64) -> Self {
        self.error_bucket = error.clamp(0.0, 1.0);
        self.hit_bucket = hit.clamp(0.0, 1.0 - self.error_bucket);
        self
    }

    fn hit_record(&self) -> Offense {
        Offense::new(
            "Felony",
            "2021-08-15",
            "Springfield, USA",
            "Case #CR-2021-12345. Conviction for unauthorized distribution.",
            &self.name,
            Pillar::Criminal,
        )
    }
}

impl Default for RandomizedProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceProbe for RandomizedProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn pillar(&self) -> Pillar {
        Pillar::Criminal
    }

    async fn query(&self, _identity: &Identity) -> ProbeResult<SourceFinding> {
        let (latency, roll) = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            let latency = rng.gen_range(self.latency_ms.0..=self.latency_ms.1);
            let roll: f64 = rng.gen();
            (latency, roll)
        };

        tokio::time::sleep(Duration::from_millis(latency)).await;

        if roll < self.error_bucket {
            Err(ProbeError::unavailable(&self.name, "External API unreachable"))
        } else if roll < self.error_bucket + self.hit_bucket {
            Ok(SourceFinding::hit(&self.name, Pillar::Criminal, vec![self.hit_record()]))
        } else {
            Ok(SourceFinding::clear(&self.name, Pillar::Criminal))
        }
    }
}
