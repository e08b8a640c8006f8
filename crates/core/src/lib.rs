//! Guardscreen Core - Domain types
//!
//! This crate contains the fundamental types shared by the screening engine:
//! - `Identity` / `Fingerprint`: raw PII and its keyed digest
//! - `Offense`, `Pillar`, `SourceFinding`: what a data source reports
//! - `AggregateResult`: the merged, scored outcome of one check
//! - `Check`, `CheckStatus`: the lifecycle record clients poll

pub mod check;
pub mod clock;
pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod offense;
pub mod result;

pub use check::{Check, CheckStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use fingerprint::Fingerprint;
pub use identity::{mask_name, Identity};
pub use offense::{Offense, Pillar, SourceFinding};
pub use result::{AggregateResult, IdentityConfidence};
