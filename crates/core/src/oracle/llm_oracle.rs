//! LLM-powered classification oracle.
//!
//! Sends a whole batch to a vision model in one request and asks it to
//! find the key image, read its temple code, and group the batch.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

use crate::catalog::ProductFields;

use super::code::parse_product_code;
use super::llm::{CompletionRequest, ImageAttachment, LlmClient, LlmError};
use super::traits::{ClassificationOracle, OracleError};
use super::types::{BatchImage, ClassificationResult};

/// Which images count as "the same product" as the key image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Same frame model, any color.
    #[default]
    SameReference,
    /// Same frame model and same color.
    SameReferenceAndColor,
}

/// Configuration for the LLM oracle.
#[derive(Debug, Clone)]
pub struct LlmOracleConfig {
    /// Maximum tokens for the LLM response.
    pub max_tokens: u32,
    /// Temperature for generation.
    pub temperature: f32,
    pub match_policy: MatchPolicy,
}

impl Default for LlmOracleConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.0,
            match_policy: MatchPolicy::default(),
        }
    }
}

/// Classification oracle backed by a vision LLM.
///
/// Generic over the LLM client type to support different backends
/// (Anthropic, Gemini, Ollama).
pub struct LlmOracle<C: LlmClient> {
    client: Arc<C>,
    config: LlmOracleConfig,
    name: String,
}

impl<C: LlmClient> LlmOracle<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self::with_config(client, LlmOracleConfig::default())
    }

    pub fn with_config(client: Arc<C>, config: LlmOracleConfig) -> Self {
        let name = format!("llm:{}/{}", client.provider(), client.model());
        Self {
            client,
            config,
            name,
        }
    }

    fn build_system_prompt(&self) -> String {
        let grouping = match self.config.match_policy {
            MatchPolicy::SameReference => {
                "3. GROUP: list every image in the batch (including the key image) that shows \
the SAME frame model as the key image. Ignore color for this step; judge shape, design and \
material only."
            }
            MatchPolicy::SameReferenceAndColor => {
                "3. GROUP: list every image in the batch (including the key image) that shows \
EXACTLY the same pair of glasses as the key image: same frame model AND same color."
            }
        };

        format!(
            r#"You catalogue product photographs of eyeglass frames.

Follow these steps:
1. FIND THE KEY IMAGE: exactly one image may show the code printed on the temple, in the
   format "Reference Size1[]Size2-Size3 Color" (example: "0037 54[]18-145 C4").
2. EXTRACT: from the key image, read reference, size1, size2, size3 and color, and copy the
   whole printed code verbatim.
{grouping}

Respond with JSON only:
{{
  "key_name": "file_with_code.jpg",
  "code": "0037 54[]18-145 C4",
  "fields": {{"reference": "0037", "size1": "54", "size2": "18", "size3": "145", "color": "C4"}},
  "matched_names": ["file_with_code.jpg", "same_model_1.jpg"]
}}

If NO image shows a code in that exact format, respond with:
{{"key_name": null, "code": null, "fields": null, "matched_names": []}}"#
        )
    }

    fn build_user_prompt(&self, batch: &[BatchImage]) -> String {
        let mut prompt = format!(
            "The batch contains {} images, attached in this order:\n",
            batch.len()
        );
        for (i, image) in batch.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, image.name));
        }
        prompt.push_str("\nUse these exact file names in your answer.");
        prompt
    }
}

#[async_trait]
impl<C: LlmClient + 'static> ClassificationOracle for LlmOracle<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, batch: &[BatchImage]) -> Result<ClassificationResult, OracleError> {
        let mut request = CompletionRequest::new(self.build_user_prompt(batch))
            .with_system(self.build_system_prompt())
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature)
            .with_json_output();
        for image in batch {
            request = request.with_image(ImageAttachment::new(
                image.mime_type.clone(),
                image.bytes.clone(),
            ));
        }

        let response = self.client.complete(request).await.map_err(|e| match e {
            LlmError::Timeout(d) => OracleError::Timeout(d),
            LlmError::Json(msg) => OracleError::Malformed(msg),
            LlmError::NotConfigured => OracleError::NotConfigured(self.name.clone()),
            other => OracleError::Transport(other.to_string()),
        })?;

        tracing::debug!(
            oracle = %self.name,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Oracle responded"
        );

        parse_reply(&response.text)
    }
}

/// Raw reply shape; also accepts the older `key_image_name` / `data` /
/// `matched_filenames` keys.
#[derive(Debug, Deserialize)]
struct OracleReply {
    #[serde(default, alias = "key_image_name", alias = "keyName")]
    key_name: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default, alias = "data")]
    fields: Option<ReplyFields>,
    #[serde(default, alias = "matched_filenames", alias = "matchedNames")]
    matched_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyFields {
    #[serde(default, deserialize_with = "lenient_string")]
    reference: String,
    #[serde(default, deserialize_with = "lenient_string")]
    size1: String,
    #[serde(default, deserialize_with = "lenient_string")]
    size2: String,
    #[serde(default, deserialize_with = "lenient_string")]
    size3: String,
    #[serde(default, deserialize_with = "lenient_string")]
    color: String,
}

/// Models sometimes emit sizes as numbers.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Slice out the outermost JSON object, dropping Markdown fences or prose.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_reply(text: &str) -> Result<ClassificationResult, OracleError> {
    let json = extract_json_object(text)
        .ok_or_else(|| OracleError::Malformed(format!("no JSON object in reply: {}", text)))?;
    let reply: OracleReply = serde_json::from_str(json)
        .map_err(|e| OracleError::Malformed(format!("{}: {}", e, json)))?;

    let reported = reply.fields.map(|f| ProductFields {
        reference: f.reference,
        size1: f.size1,
        size2: f.size2,
        size3: f.size3,
        color: f.color,
    });
    // An empty reference is passed on as is so the merge can reject it
    let fields = match reported {
        Some(f) if !f.reference.is_empty() => Some(f),
        reported => reply
            .code
            .as_deref()
            .and_then(parse_product_code)
            .or(reported),
    };

    let key_name = reply
        .key_name
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());

    match (key_name, fields) {
        (Some(key_name), Some(fields)) => Ok(ClassificationResult::found(
            key_name,
            fields,
            reply
                .matched_names
                .into_iter()
                .map(|n| n.trim().to_string())
                .collect(),
        )),
        _ => Ok(ClassificationResult::no_key()),
    }
}
