//! Probe set - concurrent fan-out with join semantics
//!
//! ```text
//!            ┌──► probe A ──┐
//! identity ──┼──► probe B ──┼──► wait for ALL to settle ──► outcomes
//!            └──► probe C ──┘
//! ```
//!
//! A probe that outlives the per-probe timeout settles as
//! `ProbeError::Timeout`, so one stalled source cannot hold up the join.

use std::sync::Arc;
use std::time::Duration;

use guardscreen_core::{Identity, Pillar, SourceFinding};

use crate::error::{ProbeError, ProbeResult};
use crate::types::SourceProbe;

/// Default per-probe timeout
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;

/// How one probe settled
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub probe: String,
    pub pillar: Pillar,
    pub result: ProbeResult<SourceFinding>,
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Fixed, ordered collection of independent probes
#[derive(Clone)]
pub struct ProbeSet {
    probes: Vec<Arc<dyn SourceProbe>>,
    timeout: Duration,
}

impl ProbeSet {
    pub fn new() -> Self {
        Self {
            probes: Vec::new(),
            timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn SourceProbe>) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn push(&mut self, probe: Arc<dyn SourceProbe>) {
        self.probes.push(probe);
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn names(&self) -> Vec<String> {
        self.probes.iter().map(|p| p.name().to_string()).collect()
    }

    /// Query every probe concurrently and wait for all of them.
    ///
    /// Outcomes are returned in configuration order regardless of which
    /// probe finished first.
    pub async fn fan_out(&self, identity: &Identity) -> Vec<ProbeOutcome> {
        let timeout = self.timeout;

        let handles: Vec<_> = self
            .probes
            .iter()
            .map(|probe| {
                let probe = Arc::clone(probe);
                let identity = identity.clone();
                tokio::spawn(async move {
                    match tokio::time::timeout(timeout, probe.query(&identity)).await {
                        Ok(result) => result,
                        Err(_) => Err(ProbeError::Timeout {
                            probe: probe.name().to_string(),
                            timeout_ms: timeout.as_millis() as u64,
                        }),
                    }
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (probe, handle) in self.probes.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(ProbeError::TaskFailed {
                    probe: probe.name().to_string(),
                    reason: e.to_string(),
                }),
            };

            match &result {
                Ok(finding) => tracing::debug!(
                    source = probe.name(),
                    offenses = finding.offenses.len(),
                    identity_match = finding.identity_match,
                    "Probe returned"
                ),
                Err(e) => tracing::warn!(source = probe.name(), error = %e, "Probe failed"),
            }

            outcomes.push(ProbeOutcome {
                probe: probe.name().to_string(),
                pillar: probe.pillar(),
                result,
            });
        }

        outcomes
    }
}

impl Default for ProbeSet {
    fn default() -> Self {
        Self::new()
    }
}
