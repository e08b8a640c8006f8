//! Guardscreen Result Cache
//!
//! Maps an identity [`Fingerprint`] to the last [`AggregateResult`]
//! computed for it. Entries expire logically: staleness is checked at
//! read time, nothing is physically evicted.
//!
//! [`Fingerprint`]: guardscreen_core::Fingerprint
//! [`AggregateResult`]: guardscreen_core::AggregateResult

mod entry;
mod memory;
mod types;

pub use entry::{CacheEntry, DEFAULT_TTL_SECS};
pub use memory::InMemoryCache;
pub use types::ResultCache;
