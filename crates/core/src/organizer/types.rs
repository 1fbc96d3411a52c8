//! Types for organizing jobs.

use std::path::{Path, PathBuf};

use crate::catalog::sanitize_reference;

/// Build the deterministic target name for one organized file.
pub fn target_file_name(reference: &str, color: &str, ordinal: usize, extension: &str) -> String {
    format!(
        "{}_{}_{}.{}",
        sanitize_reference(reference),
        sanitize_reference(color),
        ordinal,
        extension.trim_start_matches('.')
    )
}

/// The files of one merged batch and where they go.
#[derive(Debug, Clone)]
pub struct OrganizeJob {
    /// Root of the output tree.
    pub output_dir: PathBuf,
    /// Reference; also the destination folder name once sanitized.
    pub reference: String,
    pub color: String,
    /// Matched source files in batch order, key first.
    pub sources: Vec<PathBuf>,
}

impl OrganizeJob {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        reference: impl Into<String>,
        color: impl Into<String>,
        sources: Vec<PathBuf>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            reference: reference.into(),
            color: color.into(),
            sources,
        }
    }

    pub fn target_dir(&self) -> PathBuf {
        self.output_dir.join(sanitize_reference(&self.reference))
    }

    /// `(source, destination)` pairs in ordinal order.
    pub fn placements(&self, extension: &str) -> Vec<(&Path, PathBuf)> {
        let dir = self.target_dir();
        self.sources
            .iter()
            .enumerate()
            .map(|(ordinal, source)| {
                let name = target_file_name(&self.reference, &self.color, ordinal, extension);
                (source.as_path(), dir.join(name))
            })
            .collect()
    }
}

/// A file copied into the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub size_bytes: u64,
    /// SHA-256 of the copied bytes, when verification is enabled.
    pub checksum: Option<String>,
}

/// A file that could not be organized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    pub source: PathBuf,
    pub reason: String,
}

/// Result of organizing one job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizeReport {
    pub placed: Vec<PlacedFile>,
    /// Destinations that already existed and were left untouched.
    pub already_present: Vec<PathBuf>,
    pub failed: Vec<FailedFile>,
}

impl OrganizeReport {
    pub fn total_bytes(&self) -> u64 {
        self.placed.iter().map(|p| p.size_bytes).sum()
    }
}
