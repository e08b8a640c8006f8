//! Source probe trait

use async_trait::async_trait;
use guardscreen_core::{Identity, Pillar, SourceFinding};

use crate::error::ProbeResult;

/// Source Probe trait - interface for screening data sources
///
/// Implementations can be:
/// - StaticProbe: fixed finding or failure (tests)
/// - MockSourceProbe: simulated latency and random outcomes
/// - RandomizedProbe: single-source mode with fixed outcome buckets
/// - real registry clients
///
/// Each probe's latency and failure are independent of its peers.
#[async_trait]
pub trait SourceProbe: Send + Sync {
    /// Source name, reported in offenses and the result's source list
    fn name(&self) -> &str;

    /// Risk category this source covers
    fn pillar(&self) -> Pillar;

    /// Look up an identity
    async fn query(&self, identity: &Identity) -> ProbeResult<SourceFinding>;
}
