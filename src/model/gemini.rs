//! Google Gemini backend over the `generateContent` REST endpoint.

use anyhow::Result;
use serde_json::{json, Value};

use super::{http_client, GenerationOptions, LanguageModel, ModelError};
use crate::config::ModelConfig;

pub struct GeminiBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        if config.gemini_api_key.is_empty() {
            tracing::warn!("gemini selected but GEMINI_API_KEY is not set; extraction will fall back");
        }
        Ok(Self {
            client: http_client(config)?,
            endpoint: config.gemini_endpoint.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key.clone(),
        })
    }

    fn request_body(prompt: &str, options: &GenerationOptions) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_tokens,
                "responseMimeType": "application/json",
            }
        })
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    (!text.trim().is_empty()).then(|| text.trim().to_string())
}

impl LanguageModel for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn complete(&self, prompt: &str, options: &GenerationOptions) -> Result<String, ModelError> {
        if self.api_key.is_empty() {
            return Err(ModelError::MissingApiKey("gemini"));
        }

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        tracing::debug!(model = %self.model, "calling gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(prompt, options))
            .send()?;

        if !response.status().is_success() {
            return Err(ModelError::Status(response.status().as_u16()));
        }

        let body: Value = response.json()?;
        response_text(&body).ok_or(ModelError::MissingField("candidates[0].content.parts"))
    }

    fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            return false;
        }
        self.client
            .get(format!("{}/models/{}", self.endpoint, self.model))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
