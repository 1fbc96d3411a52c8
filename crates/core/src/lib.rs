pub mod catalog;
pub mod config;
pub mod events;
pub mod oracle;
pub mod orchestrator;
pub mod organizer;
pub mod queue;
pub mod testing;
pub mod validator;

pub use catalog::{
    merge_result, Catalog, CatalogEntry, CatalogError, CatalogStats, CatalogStore, ColorGroup,
    JsonCatalogStore, MergeError, MergeInput, MergeOutcome, ProductFields,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use events::{EventKind, EventLog, EventLogError, EventRecord, FileEventLog};
pub use oracle::{create_oracle, ClassificationOracle, ClassificationResult, OracleConfig, OracleError};
pub use orchestrator::{BatchOrchestrator, BatchOutcome, OrchestratorError, RunSettings, RunSummary, StopReason};
pub use organizer::{FsOrganizer, Organizer};
pub use queue::{Batch, SessionFailures, SkipSet, SourceItem};
pub use validator::{ImageDecodeValidator, ItemValidator, ValidationError};
