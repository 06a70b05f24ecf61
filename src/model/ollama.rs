//! Local Ollama backend (`POST /api/generate`, JSON output mode).

use anyhow::Result;
use serde_json::{json, Value};

use super::{http_client, GenerationOptions, LanguageModel, ModelError};
use crate::config::ModelConfig;

pub struct OllamaBackend {
    client: reqwest::blocking::Client,
    host: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            host: config.ollama_host.trim_end_matches('/').to_string(),
            model: config.ollama_model.clone(),
        })
    }

    fn request_body(&self, prompt: &str, options: &GenerationOptions) -> Value {
        json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "format": "json",
            "options": {
                "temperature": options.temperature,
                "num_predict": options.max_tokens,
            }
        })
    }
}

/// Pull the completion text out of a non-streaming `/api/generate` response.
fn response_text(body: &Value) -> Option<String> {
    body.get("response")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
}

impl LanguageModel for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn complete(&self, prompt: &str, options: &GenerationOptions) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.host);
        tracing::debug!(url = %url, model = %self.model, "calling ollama");

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(prompt, options))
            .send()?;

        if !response.status().is_success() {
            return Err(ModelError::Status(response.status().as_u16()));
        }

        let body: Value = response.json()?;
        response_text(&body).ok_or(ModelError::MissingField("response"))
    }

    fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.host))
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
