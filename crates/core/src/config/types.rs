use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::oracle::{OracleConfig, OracleProvider};
use crate::orchestrator::OrchestratorConfig;
use crate::organizer::OrganizerConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub organizer: OrganizerConfig,
    pub oracle: OracleConfig,
}

/// Filesystem locations used by a run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Directory scanned (non-recursively) for product photographs
    pub source_dir: PathBuf,
    /// Root of the reference-named output tree
    pub output_dir: PathBuf,
    #[serde(default = "default_catalog_file")]
    pub catalog_file: PathBuf,
    #[serde(default = "default_event_log_file")]
    pub event_log_file: PathBuf,
}

fn default_catalog_file() -> PathBuf {
    PathBuf::from("catalog.json")
}

fn default_event_log_file() -> PathBuf {
    PathBuf::from("events.log")
}

/// Backlog and batching configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Recognized image extensions, matched case-insensitively
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            extensions: default_extensions(),
        }
    }
}

pub const MAX_BATCH_SIZE: usize = 16;

fn default_batch_size() -> usize {
    5
}

fn default_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "bmp", "tiff"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub paths: PathsConfig,
    pub queue: QueueConfig,
    pub orchestrator: OrchestratorConfig,
    pub organizer: OrganizerConfig,
    pub oracle: SanitizedOracleConfig,
}

/// Sanitized oracle config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedOracleConfig {
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
    pub match_color: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            paths: config.paths.clone(),
            queue: config.queue.clone(),
            orchestrator: config.orchestrator.clone(),
            organizer: config.organizer.clone(),
            oracle: SanitizedOracleConfig {
                provider: match config.oracle.provider {
                    OracleProvider::Anthropic => "anthropic".to_string(),
                    OracleProvider::Gemini => "gemini".to_string(),
                    OracleProvider::Ollama => "ollama".to_string(),
                },
                model: config.oracle.model.clone(),
                api_base: config.oracle.api_base.clone(),
                api_key_configured: config
                    .oracle
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
                timeout_secs: config.oracle.timeout_secs,
                match_color: config.oracle.match_color,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[paths]
source_dir = "/photos/in"
output_dir = "/photos/out"

[oracle]
provider = "gemini"
model = "gemini-2.5-pro"
api_key = "secret"
"#;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.paths.source_dir.to_str().unwrap(), "/photos/in");
        assert_eq!(config.paths.catalog_file.to_str().unwrap(), "catalog.json");
        assert_eq!(config.paths.event_log_file.to_str().unwrap(), "events.log");
        assert_eq!(config.queue.batch_size, 5);
        assert_eq!(config.queue.extensions.len(), 5);
        assert_eq!(config.oracle.provider, OracleProvider::Gemini);
        assert!(!config.oracle.match_color);
    }

    #[test]
    fn test_deserialize_missing_paths_fails() {
        let toml = r#"
[oracle]
provider = "ollama"
model = "llava"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_custom_queue() {
        let toml = format!(
            "{}\n[queue]\nbatch_size = 3\nextensions = [\"jpg\"]\n",
            MINIMAL
        );
        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.queue.batch_size, 3);
        assert_eq!(config.queue.extensions, vec!["jpg".to_string()]);
    }

    #[test]
    fn test_sanitized_config_hides_key() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.oracle.provider, "gemini");
        assert!(sanitized.oracle.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
    }
}
