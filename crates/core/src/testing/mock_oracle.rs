//! Mock classification oracle for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::oracle::{BatchImage, ClassificationOracle, ClassificationResult, OracleError};

/// Names of one batch the oracle received.
pub type RecordedBatch = Vec<String>;

/// Produces a result from the names of the batch.
type BatchHandler =
    Box<dyn Fn(&[String]) -> Result<ClassificationResult, OracleError> + Send + Sync>;

/// Mock implementation of the ClassificationOracle trait.
///
/// Answers come from, in order:
/// - the queue of scripted responses
/// - the handler, if one is set
/// - otherwise "no key found"
///
/// Every batch is recorded for assertions.
pub struct MockOracle {
    scripted: Mutex<VecDeque<Result<ClassificationResult, OracleError>>>,
    handler: Mutex<Option<BatchHandler>>,
    calls: Mutex<Vec<RecordedBatch>>,
    media_types: Mutex<Vec<RecordedBatch>>,
}

impl std::fmt::Debug for MockOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockOracle")
            .field("scripted", &"<scripted>")
            .field("handler", &"<handler>")
            .field("calls", &self.calls())
            .finish()
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            handler: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            media_types: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response.
    pub fn push_result(&self, result: ClassificationResult) {
        self.lock_scripted().push_back(Ok(result));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: OracleError) {
        self.lock_scripted().push_back(Err(error));
    }

    /// Answer every unscripted call with `handler`.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(&[String]) -> Result<ClassificationResult, OracleError> + Send + Sync + 'static,
    {
        *self.handler.lock().unwrap_or_else(|e| e.into_inner()) = Some(Box::new(handler));
    }

    /// Every batch received so far, as file names in batch order.
    pub fn calls(&self) -> Vec<RecordedBatch> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Declared MIME type of every image, per batch.
    pub fn media_types(&self) -> Vec<RecordedBatch> {
        self.media_types
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lock_scripted(
        &self,
    ) -> std::sync::MutexGuard<'_, VecDeque<Result<ClassificationResult, OracleError>>> {
        self.scripted.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ClassificationOracle for MockOracle {
    fn name(&self) -> &str {
        "mock"
    }

    async fn classify(&self, batch: &[BatchImage]) -> Result<ClassificationResult, OracleError> {
        let names: Vec<String> = batch.iter().map(|image| image.name.clone()).collect();
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(names.clone());
        self.media_types
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(batch.iter().map(|image| image.mime_type.clone()).collect());

        if let Some(response) = self.lock_scripted().pop_front() {
            return response;
        }

        match self
            .handler
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            Some(handler) => handler(&names),
            None => Ok(ClassificationResult::no_key()),
        }
    }
}
