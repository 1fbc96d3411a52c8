//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Config;

/// Pacing and limits for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Pause between batches (milliseconds), for oracle quota limits.
    #[serde(default)]
    pub batch_delay_ms: u64,

    /// Stop after this many batches in one run.
    /// The next invocation resumes from the persisted catalog.
    #[serde(default)]
    pub max_batches: Option<usize>,
}

/// Everything the run loop needs to know, passed in at construction.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub batch_size: usize,
    pub extensions: Vec<String>,
    pub orchestrator: OrchestratorConfig,
}

impl RunSettings {
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            batch_size: 5,
            extensions: ["png", "jpg", "jpeg", "bmp", "tiff"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            orchestrator: OrchestratorConfig::default(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_batches(mut self, max_batches: usize) -> Self {
        self.orchestrator.max_batches = Some(max_batches);
        self
    }

    pub fn with_batch_delay_ms(mut self, delay_ms: u64) -> Self {
        self.orchestrator.batch_delay_ms = delay_ms;
        self
    }
}

impl From<&Config> for RunSettings {
    fn from(config: &Config) -> Self {
        Self {
            source_dir: config.paths.source_dir.clone(),
            output_dir: config.paths.output_dir.clone(),
            batch_size: config.queue.batch_size,
            extensions: config.queue.extensions.clone(),
            orchestrator: config.orchestrator.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.batch_delay_ms, 0);
        assert_eq!(config.max_batches, None);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            batch_delay_ms = 2000
            max_batches = 25
        "#;
        let config: OrchestratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.batch_delay_ms, 2000);
        assert_eq!(config.max_batches, Some(25));
    }

    #[test]
    fn test_settings_builders() {
        let settings = RunSettings::new("/in", "/out")
            .with_batch_size(3)
            .with_max_batches(2);
        assert_eq!(settings.batch_size, 3);
        assert_eq!(settings.orchestrator.max_batches, Some(2));
        assert_eq!(settings.extensions.len(), 5);
    }
}
