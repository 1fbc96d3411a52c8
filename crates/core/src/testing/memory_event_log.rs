//! In-memory event log for testing.

use std::sync::Mutex;

use crate::events::{EventKind, EventLog, EventLogError, EventRecord};

/// Keeps every appended record in memory.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    records: Mutex<Vec<EventRecord>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in append order.
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Records of one kind, in append order.
    pub fn records_of(&self, kind: EventKind) -> Vec<EventRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.kind == kind)
            .collect()
    }
}

impl EventLog for MemoryEventLog {
    fn append(&self, record: &EventRecord) -> Result<(), EventLogError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}
