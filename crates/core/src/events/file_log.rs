use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{EventKind, EventLog, EventLogError, EventRecord};

/// Line-oriented event log file opened in append mode.
///
/// Every record is also emitted through `tracing` so console output and the
/// file stay in step.
pub struct FileEventLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileEventLog {
    /// Create the log, making its parent directory if needed.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, EventLogError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| EventLogError::Write {
                path: path.clone(),
                source,
            })?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn trace(record: &EventRecord) {
        let files = record.files.join(", ");
        match record.kind {
            EventKind::Success | EventKind::Lifecycle => {
                tracing::info!(kind = %record.kind, files = %files, "{}", record.message)
            }
            EventKind::Failure | EventKind::Corruption => {
                tracing::warn!(kind = %record.kind, files = %files, "{}", record.message)
            }
            EventKind::Internal => {
                tracing::error!(kind = %record.kind, files = %files, "{}", record.message)
            }
        }
    }
}

impl EventLog for FileEventLog {
    fn append(&self, record: &EventRecord) -> Result<(), EventLogError> {
        Self::trace(record);

        // Serialize writers within the process so lines never interleave
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let write_err = |source| EventLogError::Write {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;
        writeln!(file, "{}", record).map_err(write_err)?;
        file.flush().map_err(write_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_appends_lines() {
        let dir = TempDir::new().unwrap();
        let log = FileEventLog::new(dir.path().join("logs").join("events.log")).unwrap();

        log.append(&EventRecord::lifecycle("Run started")).unwrap();
        log.append(&EventRecord::failure("No code found").with_files(["a.jpg", "b.jpg"]))
            .unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[lifecycle] Run started"));
        assert!(lines[1].ends_with("[failure] No code found | a.jpg, b.jpg"));
    }

    #[test]
    fn test_existing_content_is_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.log");
        std::fs::write(&path, "earlier line\n").unwrap();

        let log = FileEventLog::new(&path).unwrap();
        log.append(&EventRecord::success("Merged")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("earlier line\n"));
        assert_eq!(content.lines().count(), 2);
    }
}
