use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Status tag of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A batch was merged and organized.
    Success,
    /// The oracle failed, found no code, or produced an unusable reference.
    Failure,
    /// An item could not be decoded as an image.
    Corruption,
    /// The oracle contradicted the batch it was given.
    Internal,
    /// Run start and stop.
    Lifecycle,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Corruption => "corruption",
            Self::Internal => "internal",
            Self::Lifecycle => "lifecycle",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub message: String,
    /// File names involved, empty for lifecycle records.
    pub files: Vec<String>,
}

impl EventRecord {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
            files: Vec::new(),
        }
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(EventKind::Success, message)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(EventKind::Failure, message)
    }

    pub fn corruption(message: impl Into<String>) -> Self {
        Self::new(EventKind::Corruption, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(EventKind::Internal, message)
    }

    pub fn lifecycle(message: impl Into<String>) -> Self {
        Self::new(EventKind::Lifecycle, message)
    }
}

/// `2026-01-02T03:04:05.678Z [success] message | a.jpg, b.jpg`
impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.kind,
            self.message.replace(['\n', '\r'], " ")
        )?;
        if !self.files.is_empty() {
            write!(f, " | {}", self.files.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("Failed to write event log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Sink for event records.
pub trait EventLog: Send + Sync {
    /// Append one record. Records are never rewritten.
    fn append(&self, record: &EventRecord) -> Result<(), EventLogError>;
}
