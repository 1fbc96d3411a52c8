use super::{types::Config, ConfigError, MAX_BATCH_SIZE};
use crate::oracle::OracleProvider;

/// Validate configuration
/// Currently validates:
/// - Batch size is within 1..=MAX_BATCH_SIZE
/// - At least one image extension is recognized
/// - Oracle model is set, and an API key is present for hosted providers
/// - The source directory exists and is a directory
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.queue.batch_size == 0 || config.queue.batch_size > MAX_BATCH_SIZE {
        return Err(ConfigError::ValidationError(format!(
            "queue.batch_size must be between 1 and {}, got {}",
            MAX_BATCH_SIZE, config.queue.batch_size
        )));
    }

    if config.queue.extensions.iter().all(|e| e.trim().is_empty()) {
        return Err(ConfigError::ValidationError(
            "queue.extensions cannot be empty".to_string(),
        ));
    }

    if config.organizer.extension.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "organizer.extension cannot be empty".to_string(),
        ));
    }

    if config.oracle.model.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "oracle.model cannot be empty".to_string(),
        ));
    }

    let has_key = config
        .oracle
        .api_key
        .as_ref()
        .is_some_and(|k| !k.trim().is_empty());
    if config.oracle.provider != OracleProvider::Ollama && !has_key {
        return Err(ConfigError::ValidationError(format!(
            "oracle provider {:?} requires api_key",
            config.oracle.provider
        )));
    }

    if !config.paths.source_dir.is_dir() {
        return Err(ConfigError::ValidationError(format!(
            "paths.source_dir is not a readable directory: {}",
            config.paths.source_dir.display()
        )));
    }

    Ok(())
}
