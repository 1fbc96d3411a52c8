//! Types for the batch orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that end a run.
///
/// Per-batch problems never surface here; they are contained in the loop
/// and recorded as events.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The catalog could not be persisted after a merge.
    #[error("catalog error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),

    /// The source directory could not be scanned.
    #[error("queue error: {0}")]
    Queue(#[from] crate::queue::QueueError),
}

/// Terminal state of one processed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Merged into the catalog and organized.
    Merged {
        reference: String,
        color: String,
        files: usize,
        organized: usize,
        already_present: usize,
        organize_failed: usize,
    },
    /// Every item failed validation; the oracle was not called.
    AllCorrupt,
    /// The oracle call failed.
    OracleFailed,
    /// The oracle found no code in the batch.
    NoKey,
    /// The reference sanitized to an empty string.
    EmptyReference,
    /// The oracle's answer contradicted the batch or the catalog.
    Internal,
}

impl BatchOutcome {
    pub fn state(&self) -> &'static str {
        match self {
            Self::Merged { .. } => "merged",
            Self::AllCorrupt => "all_corrupt",
            Self::OracleFailed => "oracle_failed",
            Self::NoKey => "no_key",
            Self::EmptyReference => "empty_reference",
            Self::Internal => "internal",
        }
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A fresh scan found nothing left to do.
    BacklogEmpty,
    /// The cancellation token fired between batches.
    Cancelled,
    /// `max_batches` was reached.
    BatchLimit,
}

/// Tally of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub batches: usize,
    pub merged: usize,
    pub no_key: usize,
    pub oracle_failed: usize,
    pub empty_reference: usize,
    pub internal: usize,
    pub all_corrupt: usize,
    /// Individual items that failed validation.
    pub corrupt_items: usize,
    pub files_organized: usize,
    pub files_already_present: usize,
    pub organize_failed: usize,
    pub stop_reason: StopReason,
}

impl RunSummary {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            batches: 0,
            merged: 0,
            no_key: 0,
            oracle_failed: 0,
            empty_reference: 0,
            internal: 0,
            all_corrupt: 0,
            corrupt_items: 0,
            files_organized: 0,
            files_already_present: 0,
            organize_failed: 0,
            stop_reason: StopReason::BacklogEmpty,
        }
    }

    pub fn record(&mut self, outcome: &BatchOutcome) {
        match outcome {
            BatchOutcome::Merged {
                organized,
                already_present,
                organize_failed,
                ..
            } => {
                self.merged += 1;
                self.files_organized += organized;
                self.files_already_present += already_present;
                self.organize_failed += organize_failed;
            }
            BatchOutcome::AllCorrupt => self.all_corrupt += 1,
            BatchOutcome::OracleFailed => self.oracle_failed += 1,
            BatchOutcome::NoKey => self.no_key += 1,
            BatchOutcome::EmptyReference => self.empty_reference += 1,
            BatchOutcome::Internal => self.internal += 1,
        }
    }

    /// Batches that did not end in a merge.
    pub fn failed(&self) -> usize {
        self.no_key + self.oracle_failed + self.empty_reference + self.internal + self.all_corrupt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_record() {
        let mut summary = RunSummary::new("run-1");
        summary.record(&BatchOutcome::Merged {
            reference: "0037".to_string(),
            color: "C4".to_string(),
            files: 2,
            organized: 1,
            already_present: 1,
            organize_failed: 0,
        });
        summary.record(&BatchOutcome::NoKey);
        summary.record(&BatchOutcome::Internal);

        assert_eq!(summary.merged, 1);
        assert_eq!(summary.files_organized, 1);
        assert_eq!(summary.files_already_present, 1);
        assert_eq!(summary.failed(), 2);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&BatchOutcome::NoKey).unwrap();
        assert_eq!(json, r#"{"state":"no_key"}"#);
        assert_eq!(BatchOutcome::EmptyReference.state(), "empty_reference");
    }

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::Catalog(crate::catalog::CatalogError::Serialization(
            "bad".to_string(),
        ));
        assert_eq!(err.to_string(), "catalog error: Serialization error: bad");
    }
}
