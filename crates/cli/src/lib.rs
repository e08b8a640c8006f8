//! Guardscreen CLI - command orchestration
//!
//! This crate provides the `guardscreen` binary and the commands behind it.

pub mod commands;
pub mod context;

pub use context::{AppContext, ContextOptions};
