//! Product catalog: one entry per reference, one color group per color.
//!
//! The catalog is the only persisted record of success. It is fully
//! reloaded at the start of every run loop iteration and fully rewritten
//! after every merge, so a crash never loses a completed merge and never
//! exposes a partial one.
//!
//! Invariants held by [`merge_result`]:
//! - references are unique across the catalog
//! - colors are unique within an entry
//! - a file name belongs to at most one color group

mod json_store;
mod merge;
mod types;

pub use json_store::JsonCatalogStore;
pub use merge::{merge_result, sanitize_reference, MergeError, MergeInput, MergeOutcome};
pub use types::*;

/// Trait for durable catalog storage.
pub trait CatalogStore: Send + Sync {
    /// Load the catalog.
    ///
    /// Missing or malformed storage yields an empty catalog. Storage that
    /// exists but cannot be read is an error, so nothing overwrites it.
    fn load(&self) -> Result<Catalog, CatalogError>;

    /// Replace the stored catalog with `catalog`.
    fn save(&self, catalog: &Catalog) -> Result<(), CatalogError>;
}
