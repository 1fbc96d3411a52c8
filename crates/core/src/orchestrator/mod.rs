//! Batch orchestrator: the resumable run loop.
//!
//! One batch at a time is built, validated, classified, merged, organized
//! and logged before the next one starts:
//! - **Backlog**: rescanned every iteration against a fresh skip set
//! - **Oracle**: at most one call in flight
//! - **Catalog**: reloaded and rewritten around every merge

mod config;
mod runner;
mod types;

pub use config::{OrchestratorConfig, RunSettings};
pub use runner::BatchOrchestrator;
pub use types::{BatchOutcome, OrchestratorError, RunSummary, StopReason};
