//! Oracle configuration types.

use serde::{Deserialize, Serialize};

/// Vision model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleProvider {
    /// Anthropic Messages API.
    Anthropic,
    /// Google Gemini `generateContent` API.
    Gemini,
    /// Local Ollama instance.
    Ollama,
}

/// Oracle client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub provider: OracleProvider,
    /// Model name/identifier.
    pub model: String,
    /// API key (not needed for Ollama).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API base URL (for proxies or self-hosted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Maximum tokens for completions.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Require matched photographs to share the key's color, not just its model.
    #[serde(default)]
    pub match_color: bool,
}

fn default_timeout() -> u32 {
    120
}

fn default_max_tokens() -> u32 {
    1024
}
