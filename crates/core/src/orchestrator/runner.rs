//! Batch orchestrator implementation.
//!
//! States of one batch: built, validated, classified, then one of merged /
//! no key / empty reference / internal, then organized and logged.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::catalog::{
    merge_result, sanitize_reference, Catalog, CatalogStore, MergeError, MergeInput,
};
use crate::events::{EventLog, EventRecord};
use crate::oracle::{BatchImage, ClassificationOracle};
use crate::organizer::{OrganizeJob, Organizer};
use crate::queue::{build_backlog, into_batches, Batch, SessionFailures, SkipSet, SourceItem};
use crate::validator::ItemValidator;

use super::config::RunSettings;
use super::types::{BatchOutcome, OrchestratorError, RunSummary, StopReason};

/// Drives the source directory through the oracle into the catalog.
pub struct BatchOrchestrator {
    settings: RunSettings,
    catalog: Arc<dyn CatalogStore>,
    validator: Arc<dyn ItemValidator>,
    oracle: Arc<dyn ClassificationOracle>,
    organizer: Arc<dyn Organizer>,
    events: Arc<dyn EventLog>,
    cancel: CancellationToken,
    config_hash: Option<String>,
}

impl BatchOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        settings: RunSettings,
        catalog: Arc<dyn CatalogStore>,
        validator: Arc<dyn ItemValidator>,
        oracle: Arc<dyn ClassificationOracle>,
        organizer: Arc<dyn Organizer>,
        events: Arc<dyn EventLog>,
    ) -> Self {
        Self {
            settings,
            catalog,
            validator,
            oracle,
            organizer,
            events,
            cancel: CancellationToken::new(),
            config_hash: None,
        }
    }

    /// Use an externally owned token so the caller can stop the run.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Hash of the configuration, recorded in the start event.
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Process batches until the backlog is empty, the token is cancelled or
    /// the batch limit is reached.
    ///
    /// Session failures live only for the duration of this call.
    pub async fn run(&self) -> Result<RunSummary, OrchestratorError> {
        let run_id = Uuid::new_v4().to_string();
        let mut summary = RunSummary::new(run_id.clone());
        let mut session = SessionFailures::new();

        info!(
            run_id = %run_id,
            oracle = %self.oracle.name(),
            batch_size = self.settings.batch_size,
            "Starting run"
        );
        self.record(EventRecord::lifecycle(format!(
            "Run {} started (oracle {}, batch size {}, config {})",
            run_id,
            self.oracle.name(),
            self.settings.batch_size,
            self.config_hash.as_deref().unwrap_or("unknown")
        )));

        match self.run_batches(&mut session, &mut summary).await {
            Ok(reason) => {
                summary.stop_reason = reason;
                info!(
                    run_id = %run_id,
                    batches = summary.batches,
                    merged = summary.merged,
                    failed = summary.failed(),
                    "Run finished: {:?}",
                    reason
                );
                self.record(EventRecord::lifecycle(format!(
                    "Run {} finished ({:?}): {} batches, {} merged, {} failed, {} corrupt items, {} files organized",
                    run_id,
                    reason,
                    summary.batches,
                    summary.merged,
                    summary.failed(),
                    summary.corrupt_items,
                    summary.files_organized
                )));
                Ok(summary)
            }
            Err(e) => {
                error!(run_id = %run_id, "Run aborted: {}", e);
                self.record(EventRecord::lifecycle(format!(
                    "Run {} aborted after {} batches: {}",
                    run_id, summary.batches, e
                )));
                Err(e)
            }
        }
    }

    async fn run_batches(
        &self,
        session: &mut SessionFailures,
        summary: &mut RunSummary,
    ) -> Result<StopReason, OrchestratorError> {
        loop {
            if self.cancel.is_cancelled() {
                info!("Cancellation requested, stopping at batch boundary");
                return Ok(StopReason::Cancelled);
            }
            if let Some(max) = self.settings.orchestrator.max_batches {
                if summary.batches >= max {
                    info!("Reached limit of {} batches", max);
                    return Ok(StopReason::BatchLimit);
                }
            }

            // Reload every iteration so the skip set reflects the persisted catalog
            let catalog = self.catalog.load()?;
            let backlog = {
                let skip = SkipSet::build(&catalog, session);
                debug!(
                    catalogued = skip.persisted_len(),
                    session_failures = skip.session_len(),
                    "Built skip set"
                );
                build_backlog(&self.settings.source_dir, &self.settings.extensions, &skip).await?
            };

            let remaining = backlog.len();
            let Some(batch) = into_batches(backlog, self.settings.batch_size)
                .into_iter()
                .next()
            else {
                info!("Backlog is empty");
                return Ok(StopReason::BacklogEmpty);
            };

            summary.batches += 1;
            let number = summary.batches;
            info!(
                batch = number,
                size = batch.len(),
                remaining = remaining,
                "Processing batch: {}",
                batch.names().join(", ")
            );

            let outcome = self.process_batch(number, catalog, batch, session, summary).await?;
            debug!(batch = number, state = outcome.state(), "Batch done");
            summary.record(&outcome);

            let delay = self.settings.orchestrator.batch_delay_ms;
            if delay > 0 {
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        info!("Cancellation requested during batch delay");
                        return Ok(StopReason::Cancelled);
                    }
                    _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
                }
            }
        }
    }

    async fn process_batch(
        &self,
        number: usize,
        mut catalog: Catalog,
        batch: Batch,
        session: &mut SessionFailures,
        summary: &mut RunSummary,
    ) -> Result<BatchOutcome, OrchestratorError> {
        // Validated
        let valid = self.validate_items(&batch, session, summary);
        if valid.is_empty() {
            info!(batch = number, "No valid items, skipping oracle call");
            return Ok(BatchOutcome::AllCorrupt);
        }
        let valid = Batch::new(valid);
        let names = valid.names();

        let mut images = Vec::with_capacity(valid.len());
        for item in &valid.items {
            match tokio::fs::read(&item.path).await {
                Ok(bytes) => images.push(BatchImage::new(&item.name, mime_type(item, &bytes), bytes)),
                Err(e) => {
                    // Validated a moment ago, so the file changed underneath us
                    warn!(batch = number, "Failed to read {}: {}", item.name, e);
                    session.extend(names.iter().cloned());
                    self.record(
                        EventRecord::failure(format!("Failed to read {}: {}", item.name, e))
                            .with_files(names.iter().cloned()),
                    );
                    return Ok(BatchOutcome::OracleFailed);
                }
            }
        }

        // Classified
        let result = match self.oracle.classify(&images).await {
            Ok(result) => result,
            Err(e) => {
                session.extend(names.iter().cloned());
                self.record(
                    EventRecord::failure(format!("Oracle {} failed: {}", self.oracle.name(), e))
                        .with_files(names.iter().cloned()),
                );
                return Ok(BatchOutcome::OracleFailed);
            }
        };

        let (Some(key), Some(fields)) = (result.key_name, result.fields) else {
            session.extend(names.iter().cloned());
            self.record(
                EventRecord::failure("No identifying code found in batch")
                    .with_files(names.iter().cloned()),
            );
            return Ok(BatchOutcome::NoKey);
        };

        if valid.get(&key).is_none() {
            session.extend(names.iter().cloned());
            self.record(
                EventRecord::internal(format!("Oracle named key '{}' which is not in the batch", key))
                    .with_files(names.iter().cloned()),
            );
            return Ok(BatchOutcome::Internal);
        }

        // Matched names the oracle made up are dropped; the key always belongs
        let additional_files: Vec<String> = names
            .iter()
            .filter(|n| **n != key && result.matched_names.contains(n))
            .cloned()
            .collect();
        let ignored: Vec<&String> = result
            .matched_names
            .iter()
            .filter(|n| valid.get(n).is_none())
            .collect();
        if !ignored.is_empty() {
            warn!(batch = number, "Ignoring matched names not in batch: {:?}", ignored);
        }

        let color = sanitize_reference(&fields.color);
        let input = MergeInput {
            fields,
            key_file: key.clone(),
            additional_files: additional_files.clone(),
        };

        let merged = match merge_result(&mut catalog, input) {
            Ok(merged) => merged,
            Err(e @ MergeError::EmptyReference { .. }) => {
                session.extend(names.iter().cloned());
                self.record(EventRecord::failure(e.to_string()).with_files(names.iter().cloned()));
                return Ok(BatchOutcome::EmptyReference);
            }
            Err(e @ MergeError::AlreadyAttributed { .. }) => {
                session.extend(names.iter().cloned());
                self.record(EventRecord::internal(e.to_string()).with_files(names.iter().cloned()));
                return Ok(BatchOutcome::Internal);
            }
        };

        // Merged: durable before anything else happens
        self.catalog.save(&catalog)?;
        let reference = merged.reference().to_string();

        if !merged.displaced().is_empty() {
            warn!(
                reference = %reference,
                color = %color,
                "Replaced color group, releasing {:?} for the next run",
                merged.displaced()
            );
            session.extend(merged.displaced().iter().cloned());
        }

        let files: Vec<String> = std::iter::once(key).chain(additional_files).collect();

        // Organized
        let sources: Vec<PathBuf> = files
            .iter()
            .filter_map(|name| valid.get(name).map(|item| item.path.clone()))
            .collect();
        let job = OrganizeJob::new(&self.settings.output_dir, &reference, &color, sources);
        let (organized, already_present, organize_failed) =
            match self.organizer.organize(&job).await {
                Ok(report) => {
                    for failed in &report.failed {
                        warn!("Failed to organize {:?}: {}", failed.source, failed.reason);
                    }
                    (
                        report.placed.len(),
                        report.already_present.len(),
                        report.failed.len(),
                    )
                }
                Err(e) => {
                    self.record(
                        EventRecord::failure(format!(
                            "Merged {}/{} but organizing failed: {}",
                            reference, color, e
                        ))
                        .with_files(files.iter().cloned()),
                    );
                    (0, 0, files.len())
                }
            };

        // Logged
        self.record(
            EventRecord::success(format!(
                "Merged {}/{}: {} organized, {} already present",
                reference, color, organized, already_present
            ))
            .with_files(files.iter().cloned()),
        );

        Ok(BatchOutcome::Merged {
            reference,
            color,
            files: files.len(),
            organized,
            already_present,
            organize_failed,
        })
    }

    /// Returns the valid items; rejected ones join the session failures.
    fn validate_items(
        &self,
        batch: &Batch,
        session: &mut SessionFailures,
        summary: &mut RunSummary,
    ) -> Vec<SourceItem> {
        let mut valid = Vec::with_capacity(batch.len());
        for item in &batch.items {
            match self.validator.validate(&item.path) {
                Ok(()) => valid.push(item.clone()),
                Err(e) => {
                    summary.corrupt_items += 1;
                    session.insert(item.name.clone());
                    self.record(
                        EventRecord::corruption(format!(
                            "Rejected by {}: {}",
                            self.validator.name(),
                            e
                        ))
                        .with_files([item.name.clone()]),
                    );
                }
            }
        }
        valid
    }

    fn record(&self, record: EventRecord) {
        if let Err(e) = self.events.append(&record) {
            error!("Failed to write event log: {}", e);
        }
    }
}

/// Media type from the content, falling back to the extension.
fn mime_type(item: &SourceItem, bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .or_else(|_| image::ImageFormat::from_path(&item.path))
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{JsonCatalogStore, ProductFields};
    use crate::events::EventKind;
    use crate::oracle::{ClassificationResult, OracleError};
    use crate::organizer::FsOrganizer;
    use crate::testing::fixtures::{write_corrupt, write_image, write_png_as};
    use crate::testing::{MemoryEventLog, MockOracle};
    use crate::validator::ImageDecodeValidator;
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        source: PathBuf,
        output: PathBuf,
        catalog: Arc<JsonCatalogStore>,
        oracle: Arc<MockOracle>,
        events: Arc<MemoryEventLog>,
    }

    impl Harness {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let source = dir.path().join("in");
            let output = dir.path().join("out");
            std::fs::create_dir_all(&source).unwrap();
            let catalog = Arc::new(JsonCatalogStore::new(dir.path().join("catalog.json")));
            Self {
                _dir: dir,
                source,
                output,
                catalog,
                oracle: Arc::new(MockOracle::new()),
                events: Arc::new(MemoryEventLog::new()),
            }
        }

        fn orchestrator(&self, settings: RunSettings) -> BatchOrchestrator {
            BatchOrchestrator::new(
                settings,
                self.catalog.clone(),
                Arc::new(ImageDecodeValidator::new()),
                self.oracle.clone(),
                Arc::new(FsOrganizer::with_defaults()),
                self.events.clone(),
            )
        }

        fn settings(&self) -> RunSettings {
            RunSettings::new(&self.source, &self.output)
        }
    }

    fn fields(reference: &str, color: &str) -> ProductFields {
        ProductFields {
            reference: reference.to_string(),
            size1: "54".to_string(),
            size2: "18".to_string(),
            size3: "145".to_string(),
            color: color.to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_source_finishes_immediately() {
        let h = Harness::new();
        let summary = h.orchestrator(h.settings()).run().await.unwrap();

        assert_eq!(summary.batches, 0);
        assert_eq!(summary.stop_reason, StopReason::BacklogEmpty);
        assert!(h.oracle.calls().is_empty());

        let kinds: Vec<_> = h.events.records().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![EventKind::Lifecycle, EventKind::Lifecycle]);
    }

    #[tokio::test]
    async fn test_all_corrupt_batch_skips_oracle() {
        let h = Harness::new();
        write_corrupt(&h.source, "x.jpg");
        write_corrupt(&h.source, "y.jpg");

        let summary = h.orchestrator(h.settings()).run().await.unwrap();

        assert_eq!(summary.batches, 1);
        assert_eq!(summary.all_corrupt, 1);
        assert_eq!(summary.corrupt_items, 2);
        assert!(h.oracle.calls().is_empty());
        assert_eq!(h.events.records_of(EventKind::Corruption).len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_items_are_dropped_from_batch() {
        let h = Harness::new();
        write_image(&h.source, "a.jpg");
        write_corrupt(&h.source, "b.jpg");
        h.oracle.push_result(ClassificationResult::found(
            "a.jpg",
            fields("0037", "C4"),
            vec!["a.jpg".to_string()],
        ));

        let summary = h.orchestrator(h.settings()).run().await.unwrap();

        assert_eq!(h.oracle.calls(), vec![vec!["a.jpg".to_string()]]);
        assert_eq!(summary.merged, 1);
        assert_eq!(summary.corrupt_items, 1);
    }

    #[tokio::test]
    async fn test_oracle_error_excludes_batch_for_the_run() {
        let h = Harness::new();
        write_image(&h.source, "a.jpg");
        write_image(&h.source, "b.jpg");
        h.oracle
            .push_error(OracleError::Transport("connection reset".to_string()));

        let summary = h.orchestrator(h.settings()).run().await.unwrap();

        assert_eq!(summary.batches, 1);
        assert_eq!(summary.oracle_failed, 1);
        let failures = h.events.records_of(EventKind::Failure);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].files, vec!["a.jpg", "b.jpg"]);
        assert!(h.catalog.load().unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn test_media_type_follows_content() {
        let h = Harness::new();
        write_image(&h.source, "a.jpg");
        write_png_as(&h.source, "b.jpg");
        write_image(&h.source, "c.png");

        h.orchestrator(h.settings()).run().await.unwrap();

        assert_eq!(
            h.oracle.media_types(),
            vec![vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/png".to_string()
            ]]
        );
    }

    #[tokio::test]
    async fn test_key_outside_batch_is_internal() {
        let h = Harness::new();
        write_image(&h.source, "a.jpg");
        h.oracle.push_result(ClassificationResult::found(
            "zzz.jpg",
            fields("0037", "C4"),
            vec!["zzz.jpg".to_string()],
        ));

        let summary = h.orchestrator(h.settings()).run().await.unwrap();

        assert_eq!(summary.internal, 1);
        assert_eq!(h.events.records_of(EventKind::Internal).len(), 1);
        assert!(h.catalog.load().unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn test_empty_reference_is_failure() {
        let h = Harness::new();
        write_image(&h.source, "a.jpg");
        h.oracle.push_result(ClassificationResult::found(
            "a.jpg",
            fields("   ", "C4"),
            vec!["a.jpg".to_string()],
        ));

        let summary = h.orchestrator(h.settings()).run().await.unwrap();

        assert_eq!(summary.empty_reference, 1);
        assert_eq!(h.events.records_of(EventKind::Failure).len(), 1);
        assert!(!h.output.exists());
    }

    #[tokio::test]
    async fn test_invented_matches_are_ignored() {
        let h = Harness::new();
        write_image(&h.source, "a.jpg");
        write_image(&h.source, "b.jpg");
        h.oracle.push_result(ClassificationResult::found(
            "a.jpg",
            fields("0037", "C4"),
            vec!["b.jpg".to_string(), "ghost.jpg".to_string()],
        ));

        h.orchestrator(h.settings().with_max_batches(1))
            .run()
            .await
            .unwrap();

        let catalog = h.catalog.load().unwrap();
        let group = catalog.get("0037").unwrap().color("C4").unwrap();
        assert_eq!(group.key_file, "a.jpg");
        assert_eq!(group.additional_files, vec!["b.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_first_batch() {
        let h = Harness::new();
        write_image(&h.source, "a.jpg");

        let token = CancellationToken::new();
        token.cancel();
        let summary = h
            .orchestrator(h.settings())
            .with_cancellation(token)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.batches, 0);
        assert!(h.oracle.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_batch_delay() {
        let h = Harness::new();
        write_image(&h.source, "a.jpg");
        write_image(&h.source, "b.jpg");

        let orchestrator = h
            .orchestrator(h.settings().with_batch_size(1).with_batch_delay_ms(60_000));
        let token = orchestrator.cancellation_token();
        let handle = tokio::spawn(async move { orchestrator.run().await });

        tokio::time::sleep(Duration::from_millis(200)).await;
        token.cancel();
        let summary = handle.await.unwrap().unwrap();

        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.batches, 1);
    }

    #[tokio::test]
    async fn test_config_hash_in_start_event() {
        let h = Harness::new();
        h.orchestrator(h.settings())
            .with_config_hash("abc123")
            .run()
            .await
            .unwrap();

        let records = h.events.records();
        assert!(records[0].message.contains("config abc123"));
    }
}
