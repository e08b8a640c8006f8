//! Guardscreen Source Probes
//!
//! A probe is one independent asynchronous lookup against a named data
//! source. The fan-out in [`ProbeSet`] depends only on the
//! [`SourceProbe`] trait; concrete sources are plugged in behind it.
//!
//! Currently implements mock sources for testing and demo deployments;
//! real registry clients implement the same trait.

mod error;
mod mock;
mod set;
mod single;
mod types;

pub use error::{ProbeError, ProbeResult};
pub use mock::{MockSourceProbe, StaticProbe};
pub use set::{ProbeOutcome, ProbeSet, DEFAULT_PROBE_TIMEOUT_MS};
pub use single::RandomizedProbe;
pub use types::SourceProbe;
