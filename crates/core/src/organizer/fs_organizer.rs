//! File system organizer implementation.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};

use super::config::OrganizerConfig;
use super::error::OrganizeError;
use super::types::{FailedFile, OrganizeJob, OrganizeReport, PlacedFile};
use super::Organizer;

/// File system based organizer implementation.
pub struct FsOrganizer {
    config: OrganizerConfig,
}

impl FsOrganizer {
    /// Creates a new file system organizer with the given configuration.
    pub fn new(config: OrganizerConfig) -> Self {
        Self { config }
    }

    /// Creates an organizer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(OrganizerConfig::default())
    }

    /// Copies `source` into a destination that must not exist yet.
    ///
    /// `create_new` makes the existence check and the creation one step, so
    /// an earlier copy is never overwritten. Returns the byte count and, when
    /// `hash` is set, the SHA-256 of the bytes read.
    async fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        hash: bool,
    ) -> Result<(u64, Option<String>), OrganizeError> {
        let input = match File::open(source).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(OrganizeError::SourceMissing {
                    path: source.to_path_buf(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let output = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(OrganizeError::AlreadyOrganized {
                    path: destination.to_path_buf(),
                })
            }
            Err(e) => return Err(OrganizeError::copy(source, destination, e)),
        };
        let fail = |e| OrganizeError::copy(source, destination, e);

        let mut reader = BufReader::with_capacity(self.config.buffer_size, input);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, output);
        let mut hasher = hash.then(Sha256::new);
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut copied = 0u64;

        loop {
            let n = reader.read(&mut buffer).await.map_err(fail)?;
            if n == 0 {
                break;
            }
            let chunk = &buffer[..n];
            if let Some(h) = hasher.as_mut() {
                h.update(chunk);
            }
            writer.write_all(chunk).await.map_err(fail)?;
            copied += n as u64;
        }
        writer.flush().await.map_err(fail)?;

        Ok((copied, hasher.map(|h| format!("{:x}", h.finalize()))))
    }

    /// SHA-256 of a file on disk.
    async fn calculate_checksum(&self, path: &Path) -> Result<String, OrganizeError> {
        let file = File::open(path).await?;
        let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut hasher = Sha256::new();

        loop {
            let bytes_read = reader.read(&mut buffer).await?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Copies one file, verifying the written bytes when configured.
    async fn place_file(&self, source: &Path, destination: &Path) -> Result<PlacedFile, OrganizeError> {
        let verify = self.config.verify_checksums;
        let (size_bytes, checksum) = self.copy_file(source, destination, verify).await?;

        if let Some(expected) = &checksum {
            let actual = self.calculate_checksum(destination).await?;
            if &actual != expected {
                // Leave nothing behind that a later run would mistake for a finished copy
                let _ = fs::remove_file(destination).await;
                return Err(OrganizeError::ChecksumMismatch {
                    path: destination.to_path_buf(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        Ok(PlacedFile {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            size_bytes,
            checksum,
        })
    }
}

#[async_trait]
impl Organizer for FsOrganizer {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn organize(&self, job: &OrganizeJob) -> Result<OrganizeReport, OrganizeError> {
        let target_dir = job.target_dir();
        fs::create_dir_all(&target_dir)
            .await
            .map_err(|source| OrganizeError::CreateDir {
                path: target_dir.clone(),
                source,
            })?;

        let mut report = OrganizeReport::default();

        for (source, destination) in job.placements(&self.config.extension) {
            match self.place_file(source, &destination).await {
                Ok(placed) => {
                    tracing::debug!("Copied {:?} -> {:?}", source, destination);
                    report.placed.push(placed);
                }
                Err(e) if e.is_collision() => {
                    tracing::info!("{:?} already organized as {:?}", source, destination);
                    report.already_present.push(destination);
                }
                Err(e) => {
                    tracing::warn!("Failed to organize {:?}: {}", source, e);
                    report.failed.push(FailedFile {
                        source: source.to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_organize_copies_with_ordinal_names() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let a = write(src.path(), "a.jpg", b"key image");
        let b = write(src.path(), "b.jpg", b"other angle");

        let organizer = FsOrganizer::with_defaults();
        let job = OrganizeJob::new(out.path(), "0037", "C4", vec![a.clone(), b.clone()]);
        let report = organizer.organize(&job).await.unwrap();

        assert_eq!(report.placed.len(), 2);
        assert!(report.already_present.is_empty());
        assert!(report.failed.is_empty());
        assert_eq!(report.total_bytes(), 20);

        let first = out.path().join("0037").join("0037_C4_0.jpg");
        let second = out.path().join("0037").join("0037_C4_1.jpg");
        assert_eq!(std::fs::read(&first).unwrap(), b"key image");
        assert_eq!(std::fs::read(&second).unwrap(), b"other angle");

        // Sources are copied, not moved
        assert!(a.exists());
        assert!(b.exists());
    }

    #[tokio::test]
    async fn test_existing_destination_is_already_present() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let a = write(src.path(), "a.jpg", b"new bytes");
        std::fs::create_dir_all(out.path().join("0037")).unwrap();
        let existing = write(&out.path().join("0037"), "0037_C4_0.jpg", b"old bytes");

        let organizer = FsOrganizer::with_defaults();
        let job = OrganizeJob::new(out.path(), "0037", "C4", vec![a]);
        let report = organizer.organize(&job).await.unwrap();

        assert!(report.placed.is_empty());
        assert_eq!(report.already_present, vec![existing.clone()]);
        assert_eq!(std::fs::read(&existing).unwrap(), b"old bytes");
    }

    #[tokio::test]
    async fn test_organize_twice_is_idempotent() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let a = write(src.path(), "a.jpg", b"bytes");

        let organizer = FsOrganizer::with_defaults();
        let job = OrganizeJob::new(out.path(), "0037", "C4", vec![a]);
        organizer.organize(&job).await.unwrap();
        let second = organizer.organize(&job).await.unwrap();

        assert!(second.placed.is_empty());
        assert_eq!(second.already_present.len(), 1);
        let count = std::fs::read_dir(out.path().join("0037")).unwrap().count();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_missing_source_is_reported() {
        let out = TempDir::new().unwrap();
        let organizer = FsOrganizer::with_defaults();
        let job = OrganizeJob::new(
            out.path(),
            "0037",
            "C4",
            vec![out.path().join("vanished.jpg")],
        );
        let report = organizer.organize(&job).await.unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].reason.contains("missing"));
    }

    #[tokio::test]
    async fn test_checksum_recorded_when_verifying() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let a = write(src.path(), "a.jpg", b"hello");

        let organizer =
            FsOrganizer::new(OrganizerConfig::default().with_checksum_verification(true));
        let job = OrganizeJob::new(out.path(), "0037", "C4", vec![a]);
        let report = organizer.organize(&job).await.unwrap();

        assert_eq!(
            report.placed[0].checksum.as_deref(),
            Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
        );
    }

    #[tokio::test]
    async fn test_sanitized_reference_directory() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let a = write(src.path(), "a.jpg", b"x");

        let organizer = FsOrganizer::with_defaults();
        let job = OrganizeJob::new(out.path(), "AB/12", "C1", vec![a]);
        organizer.organize(&job).await.unwrap();

        assert!(out.path().join("AB_12").join("AB_12_C1_0.jpg").exists());
    }
}
