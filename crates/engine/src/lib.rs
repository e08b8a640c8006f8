//! Guardscreen Screening Engine
//!
//! ## Pipeline
//!
//! ```text
//! admit_check(identity, fingerprint)
//!     │
//!     ▼
//! ┌──────────────────────┐
//! │ Credit / breaker gate │──► InsufficientCredit | BreakerOpen
//! └──────────┬───────────┘
//!            │ Pending record created, caller returns
//!            ▼                          (background task from here on)
//! ┌──────────────────────┐
//! │ Cache lookup          │──► valid hit: reuse stored result
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │ Probe fan-out         │──► all failed: Error + breaker failure
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │ Aggregate + cache     │
//! └──────────┬───────────┘
//!            ▼
//!     Pending → Hit | Clear | Error
//! ```
//!
//! ## Key Components
//!
//! - [`config::EngineConfig`] - TTLs, timeouts, breaker thresholds
//! - [`settings::SettingsProvider`] - operator settings, read per check
//! - [`aggregate`] - dedup and risk scoring
//! - [`store::CheckStore`] - check records with newest-first paging
//! - [`audit::AuditSink`] - append-only audit events
//! - [`engine::ScreeningEngine`] - main orchestrator

pub mod aggregate;
pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod settings;
pub mod store;

pub use aggregate::{aggregate, aggregate_findings, risk_score, Aggregation};
pub use audit::{AuditSink, InMemoryAuditLog, JsonlAuditLog};
pub use config::EngineConfig;
pub use engine::{EngineBuilder, PipelineHandle, ScreeningEngine};
pub use error::{EngineError, EngineResult};
pub use event::AuditEvent;
pub use settings::{InMemorySettings, ScreeningMode, Settings, SettingsProvider};
pub use store::{CheckStore, InMemoryCheckStore, ListRequest, Page};
