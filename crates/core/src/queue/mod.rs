//! Work queue: source enumeration, skip set and batching.
//!
//! The backlog is recomputed from scratch at the start of every run loop
//! iteration: the source directory is scanned, every name already in the
//! skip set is removed, and the remainder is sorted by name so batch
//! composition is reproducible across runs.

mod builder;
mod skip_set;
mod types;

pub use builder::{build_backlog, into_batches, scan_source, QueueError};
pub use skip_set::{SessionFailures, SkipSet};
pub use types::{Batch, SourceItem};
