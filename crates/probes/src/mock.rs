//! Mock sources for testing and demo deployments

use async_trait::async_trait;
use guardscreen_core::{Identity, Offense, Pillar, SourceFinding};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{ProbeError, ProbeResult};
use crate::types::SourceProbe;

/// Probe with a fixed outcome
///
/// Counts its invocations so tests can assert that a cache hit skipped
/// the fan-out entirely.
pub struct StaticProbe {
    name: String,
    pillar: Pillar,
    outcome: ProbeResult<SourceFinding>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticProbe {
    /// Always answers with `finding`
    pub fn finding(finding: SourceFinding) -> Self {
        Self {
            name: finding.source.clone(),
            pillar: finding.pillar,
            outcome: Ok(finding),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always matches and reports nothing
    pub fn clear(name: impl Into<String>, pillar: Pillar) -> Self {
        Self::finding(SourceFinding::clear(name, pillar))
    }

    /// Always matches and reports `offenses`
    pub fn hit(name: impl Into<String>, pillar: Pillar, offenses: Vec<Offense>) -> Self {
        Self::finding(SourceFinding::hit(name, pillar, offenses))
    }

    /// Always fails
    pub fn failing(name: impl Into<String>, pillar: Pillar) -> Self {
        let name = name.into();
        Self {
            outcome: Err(ProbeError::unavailable(&name, "External API unreachable")),
            name,
            pillar,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `query` was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceProbe for StaticProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn pillar(&self) -> Pillar {
        self.pillar
    }

    async fn query(&self, _identity: &Identity) -> ProbeResult<SourceFinding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

/// Simulated remote source with random latency and outcome
///
/// Each query sleeps for a latency drawn from `latency_ms`, then fails
/// with probability `failure_rate`, otherwise reports the pillar's
/// canned record with probability `hit_rate`.
pub struct MockSourceProbe {
    name: String,
    pillar: Pillar,
    latency_ms: (u64, u64),
    failure_rate: f64,
    hit_rate: f64,
    rng: Mutex<StdRng>,
}

impl MockSourceProbe {
    pub fn new(name: impl Into<String>, pillar: Pillar) -> Self {
        Self {
            name: name.into(),
            pillar,
            latency_ms: (200, 1500),
            failure_rate: 0.1,
            hit_rate: 0.2,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic outcome sequence
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn with_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.latency_ms = (min_ms.min(max_ms), min_ms.max(max_ms));
        self
    }

    pub fn with_rates(mut self, failure_rate: f64, hit_rate: f64) -> Self {
        self.failure_rate = failure_rate.clamp(0.0, 1.0);
        self.hit_rate = hit_rate.clamp(0.0, 1.0);
        self
    }

    /// The four default pillar sources
    pub fn default_sources(seed: u64) -> Vec<MockSourceProbe> {
        vec![
            MockSourceProbe::new("County Criminal", Pillar::Criminal).with_seed(seed),
            MockSourceProbe::new("Global Sanctions", Pillar::Sanctions)
                .with_seed(seed.wrapping_add(1)),
            MockSourceProbe::new("Identity Verification", Pillar::Identity)
                .with_seed(seed.wrapping_add(2)),
            MockSourceProbe::new("Health Exclusions", Pillar::Health)
                .with_seed(seed.wrapping_add(3)),
        ]
    }

    /// Canned record reported for a pillar
    pub fn canned_offense(&self) -> Offense {
        let (level, date, location, details) = match self.pillar {
            Pillar::Criminal => (
                "Felony",
                "2021-08-15",
                "Springfield, USA",
                "Case #CR-2021-12345. Conviction for unauthorized distribution.",
            ),
            Pillar::Sanctions => (
                "Sanction",
                "2019-03-02",
                "OFAC SDN List",
                "Listed under financial sanctions program.",
            ),
            Pillar::Identity => (
                "Deceased",
                "2018-11-30",
                "SSA Death Master File",
                "SSN associated with a deceased record.",
            ),
            Pillar::Health => (
                "Exclusion",
                "2020-06-10",
                "OIG LEIE",
                "Excluded from federal healthcare programs.",
            ),
        };
        Offense::new(level, date, location, details, &self.name, self.pillar)
    }
}

#[async_trait]
impl SourceProbe for MockSourceProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn pillar(&self) -> Pillar {
        self.pillar
    }

    async fn query(&self, _identity: &Identity) -> ProbeResult<SourceFinding> {
        // Draw everything up front; the guard must not live across the sleep
        let (latency, roll) = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            let latency = rng.gen_range(self.latency_ms.0..=self.latency_ms.1);
            let roll: f64 = rng.gen();
            (latency, roll)
        };

        tokio::time::sleep(Duration::from_millis(latency)).await;

        if roll < self.failure_rate {
            return Err(ProbeError::unavailable(&self.name, "External API unreachable"));
        }
        if roll < self.failure_rate + self.hit_rate {
            return Ok(SourceFinding::hit(
                &self.name,
                self.pillar,
                vec![self.canned_offense()],
            ));
        }
        Ok(SourceFinding::clear(&self.name, self.pillar))
    }
}
