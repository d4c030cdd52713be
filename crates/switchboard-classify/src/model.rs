//! Language-understanding model seam.
//!
//! The classifier talks to its model through [`IntentModel`], so tests can
//! substitute a scripted implementation.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ClassifyError;
use switchboard_core::config::ClassifyConfig;

/// A language-understanding call with a constrained output space.
#[async_trait]
pub trait IntentModel: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError>;
}

/// `IntentModel` backed by a Gemini-style `generateContent` endpoint.
pub struct GeminiIntentModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiIntentModel {
    /// Build a model client from configuration, reading the API key from the
    /// configured environment variable.
    pub fn from_config(config: &ClassifyConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!(
                env = %config.api_key_env,
                "Classification API key not set; model calls will fail and \
                 every turn will degrade to out-of-scope"
            );
        }
        Self::new(&config.api_base, &config.model, &api_key)
    }

    /// Build a model client from explicit parts.
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Extract the concatenated text parts of the first candidate.
    fn extract_text(body: &Value) -> Result<String, ClassifyError> {
        let parts = body
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .ok_or_else(|| ClassifyError::Parse("no candidates in reply".to_string()))?;

        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();

        if text.is_empty() {
            return Err(ClassifyError::Parse("empty candidate text".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl IntentModel for GeminiIntentModel {
    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let request = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassifyError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Provider(format!(
                "HTTP {}: {}",
                status, detail
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ClassifyError::Parse(e.to_string()))?;
        Self::extract_text(&body)
    }
}
