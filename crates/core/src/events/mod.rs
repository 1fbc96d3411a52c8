//! Append-only record of batch outcomes.
//!
//! The event log is written for audit and diagnosis only. Nothing in the
//! engine reads it back to decide what to process.

mod file_log;
mod types;

pub use file_log::*;
pub use types::*;
