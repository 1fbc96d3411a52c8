//! Organizer errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The photograph disappeared from the source directory.
    #[error("Source photograph is missing: {path}")]
    SourceMissing { path: PathBuf },

    /// The target name is taken, so the file was organized before.
    #[error("Already organized as {path}")]
    AlreadyOrganized { path: PathBuf },

    #[error("Cannot create reference folder {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy of {from} to {to} failed")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes on disk differ from the bytes read.
    #[error("Copy at {path} is damaged: read {expected}, wrote {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl OrganizeError {
    pub fn copy(from: &std::path::Path, to: &std::path::Path, source: std::io::Error) -> Self {
        Self::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }
    }

    /// Collisions count as done, not as failures.
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::AlreadyOrganized { .. })
    }
}
