//! Output organizer: copies matched photographs into reference-named folders.
//!
//! Files are copied, never moved, so organizing is safe to repeat. Target
//! names are `{reference}_{color}_{ordinal}.{extension}` where the ordinal
//! is the file's position among the batch's matched files. A destination
//! that already exists is reported as already organized, not as an error.
//!
//! # Example
//!
//! ```ignore
//! use lenscat_core::organizer::{FsOrganizer, OrganizeJob, Organizer};
//!
//! let organizer = FsOrganizer::with_defaults();
//! let job = OrganizeJob::new("/out", "0037", "C4", vec![key_path, other_path]);
//! let report = organizer.organize(&job).await?;
//! println!("{} copied, {} already present", report.placed.len(), report.already_present.len());
//! ```

mod config;
mod error;
mod fs_organizer;
mod types;

pub use config::OrganizerConfig;
pub use error::OrganizeError;
pub use fs_organizer::FsOrganizer;
pub use types::{target_file_name, FailedFile, OrganizeJob, OrganizeReport, PlacedFile};

use async_trait::async_trait;

/// Materializes a merged classification on disk.
#[async_trait]
pub trait Organizer: Send + Sync {
    /// Returns the name of this organizer implementation.
    fn name(&self) -> &str;

    /// Copy every file of the job into its destination.
    ///
    /// Only a failure affecting the whole job (the destination folder cannot
    /// be created) is returned as an error; per-file failures are reported.
    async fn organize(&self, job: &OrganizeJob) -> Result<OrganizeReport, OrganizeError>;
}
