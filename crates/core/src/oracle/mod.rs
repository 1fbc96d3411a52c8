//! Classification oracle: the external capability that reads product codes.
//!
//! Given a batch of photographs, an oracle finds the one image carrying an
//! identifying code, parses the code into [`ProductFields`], and reports
//! which other images show the same product. The engine depends only on the
//! [`ClassificationOracle`] contract; [`LlmOracle`] implements it on top of
//! a vision-capable [`LlmClient`].
//!
//! ```text
//!   batch ──► LlmOracle ──► LlmClient (Anthropic | Gemini | Ollama)
//!                │
//!                └─► parse JSON reply ─► ClassificationResult
//! ```
//!
//! [`ProductFields`]: crate::catalog::ProductFields

mod code;
mod config;
mod llm;
mod llm_oracle;
mod traits;
mod types;

pub use code::parse_product_code;
pub use config::{OracleConfig, OracleProvider};
pub use llm::{
    AnthropicClient, CompletionRequest, CompletionResponse, GeminiClient, ImageAttachment,
    LlmClient, LlmError, LlmUsage, OllamaClient,
};
pub use llm_oracle::{LlmOracle, LlmOracleConfig, MatchPolicy};
pub use traits::{ClassificationOracle, OracleError};
pub use types::{BatchImage, ClassificationResult};

use std::sync::Arc;
use std::time::Duration;

/// Factory function to create the configured oracle
pub fn create_oracle(config: &OracleConfig) -> Result<Arc<dyn ClassificationOracle>, OracleError> {
    let timeout = Duration::from_secs(u64::from(config.timeout_secs));
    let oracle_config = LlmOracleConfig {
        max_tokens: config.max_tokens,
        match_policy: if config.match_color {
            MatchPolicy::SameReferenceAndColor
        } else {
            MatchPolicy::SameReference
        },
        ..LlmOracleConfig::default()
    };
    let api_key = || {
        config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                OracleError::NotConfigured(format!(
                    "api_key must be set when using the {:?} provider",
                    config.provider
                ))
            })
    };

    let oracle: Arc<dyn ClassificationOracle> = match config.provider {
        OracleProvider::Anthropic => {
            let mut client = AnthropicClient::new(api_key()?, &config.model).with_timeout(timeout);
            if let Some(base) = &config.api_base {
                client = client.with_api_base(base);
            }
            Arc::new(LlmOracle::with_config(Arc::new(client), oracle_config))
        }
        OracleProvider::Gemini => {
            let mut client = GeminiClient::new(api_key()?, &config.model).with_timeout(timeout);
            if let Some(base) = &config.api_base {
                client = client.with_api_base(base);
            }
            Arc::new(LlmOracle::with_config(Arc::new(client), oracle_config))
        }
        OracleProvider::Ollama => {
            let mut client = OllamaClient::new(&config.model).with_timeout(timeout);
            if let Some(base) = &config.api_base {
                client = client.with_api_base(base);
            }
            Arc::new(LlmOracle::with_config(Arc::new(client), oracle_config))
        }
    };
    Ok(oracle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: OracleProvider, api_key: Option<&str>) -> OracleConfig {
        OracleConfig {
            provider,
            model: "vision-model".to_string(),
            api_key: api_key.map(String::from),
            api_base: None,
            timeout_secs: 30,
            max_tokens: 512,
            match_color: false,
        }
    }

    #[test]
    fn test_create_oracle_anthropic() {
        let oracle = create_oracle(&config(OracleProvider::Anthropic, Some("sk-test"))).unwrap();
        assert_eq!(oracle.name(), "llm:anthropic/vision-model");
    }

    #[test]
    fn test_create_oracle_ollama_without_key() {
        let oracle = create_oracle(&config(OracleProvider::Ollama, None)).unwrap();
        assert_eq!(oracle.name(), "llm:ollama/vision-model");
    }

    #[test]
    fn test_create_oracle_missing_key() {
        let result = create_oracle(&config(OracleProvider::Gemini, Some("")));
        assert!(matches!(result, Err(OracleError::NotConfigured(_))));
    }
}
