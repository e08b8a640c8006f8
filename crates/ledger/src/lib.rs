//! Guardscreen Ledger - Credit budget and circuit breaker
//!
//! Every check must pass this gate before it may run:
//!
//! ```text
//! try_reserve()
//!     │
//!     ├── breaker open?     ──► BreakerOpen
//!     ├── balance <= 0?     ──► InsufficientCredit
//!     └── balance -= 1      ──► Reservation
//!
//! record_failure()          (all sources failed)
//!     └── 5 failures / 60s  ──► open for 60s
//! ```
//!
//! Both operations run under one lock so that concurrent admissions are
//! linearizable against the shared balance.

pub mod breaker;
pub mod config;
pub mod error;
pub mod ledger;

pub use breaker::BreakerState;
pub use config::BreakerConfig;
pub use error::{LedgerError, LedgerResult};
pub use ledger::{CreditLedger, LedgerSnapshot, Reservation};
