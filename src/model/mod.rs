//! Generative model backends used for topic extraction.
//!
//! Provides the [`LanguageModel`] trait with a local Ollama implementation and a
//! cloud Gemini implementation. The backend is created once via [`create_backend`]
//! from configuration; it is never switched per request.

pub mod gemini;
pub mod ollama;

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::Deserialize;

use crate::config::ModelConfig;

/// Confidence assigned when the topic had to be scraped out of malformed output.
pub const SCRAPED_CONFIDENCE: f64 = 0.7;

/// Confidence assumed when the model omits it.
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

static TOPIC_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:topic|lema)"\s*:\s*"([^"]+)""#).expect("valid topic field regex")
});

/// Sampling knobs passed to every backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&ModelConfig> for GenerationOptions {
    fn from(config: &ModelConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Why a backend call produced no usable text.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model returned HTTP {0}")]
    Status(u16),
    #[error("no API key configured for {0}")]
    MissingApiKey(&'static str),
    #[error("model response is missing field `{0}`")]
    MissingField(&'static str),
}

/// A topic as proposed by the model, before normalization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelTopic {
    #[serde(alias = "lema")]
    pub topic: String,
    #[serde(alias = "confianza", default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

/// A text-generation backend.
///
/// Calls are blocking; async callers should use `tokio::task::spawn_blocking`.
pub trait LanguageModel: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Send `prompt` and return the raw completion text.
    fn complete(&self, prompt: &str, options: &GenerationOptions) -> Result<String, ModelError>;

    /// Whether the backend answers at all.
    fn is_available(&self) -> bool;

    /// Ask for a `{topic, confidence}` object. Transport failures and unparsable
    /// output are logged and reported as `None`.
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Option<ModelTopic> {
        match self.complete(prompt, options) {
            Ok(raw) => {
                let parsed = parse_topic_response(&raw);
                if parsed.is_none() {
                    tracing::warn!(backend = self.name(), raw = %raw, "unparsable model output");
                }
                parsed
            }
            Err(e) => {
                tracing::warn!(backend = self.name(), error = %e, "model call failed");
                None
            }
        }
    }
}

/// Parse model output into a [`ModelTopic`].
///
/// Strips markdown code fences, tries strict JSON, then falls back to scraping the
/// topic field with a fixed [`SCRAPED_CONFIDENCE`].
pub fn parse_topic_response(raw: &str) -> Option<ModelTopic> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    match serde_json::from_str::<ModelTopic>(cleaned) {
        Ok(mut parsed) => {
            parsed.confidence = parsed.confidence.clamp(0.0, 1.0);
            Some(parsed)
        }
        Err(_) => TOPIC_FIELD_RE.captures(cleaned).map(|caps| ModelTopic {
            topic: caps[1].to_string(),
            confidence: SCRAPED_CONFIDENCE,
        }),
    }
}

/// Create the configured backend.
///
/// Supported providers: `"ollama"` and `"gemini"`.
pub fn create_backend(config: &ModelConfig) -> Result<Box<dyn LanguageModel>> {
    match config.provider.as_str() {
        "ollama" => Ok(Box::new(ollama::OllamaBackend::new(config)?)),
        "gemini" => Ok(Box::new(gemini::GeminiBackend::new(config)?)),
        other => anyhow::bail!("unknown model provider: {other}. Supported: ollama, gemini"),
    }
}

/// Build the blocking HTTP client shared by the backends.
fn http_client(config: &ModelConfig) -> Result<reqwest::blocking::Client> {
    use anyhow::Context;

    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()
        .context("failed to build HTTP client")
}
