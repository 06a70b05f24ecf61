//! Question → (topic, period) extraction.
//!
//! [`TopicExtractor::extract`] tries the [`TopicCache`] first and only calls the
//! language model when no known vocabulary matches. Whatever happens, it returns an
//! [`ExtractionResult`]; a `None` topic means the question could not be mapped.

pub mod cache;
pub mod period;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::model::{GenerationOptions, LanguageModel};
pub use cache::TopicCache;
pub use period::{resolve_period, PeriodDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Cache,
    Llm,
    Fallback,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Llm => "llm",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub topic: Option<String>,
    pub period: Option<PeriodDescriptor>,
    pub method: ExtractionMethod,
    /// In `[0.0, 1.0]`; 1.0 for cache hits, 0.0 on failure.
    pub confidence: f64,
}

pub struct TopicExtractor {
    cache: TopicCache,
    model: Box<dyn LanguageModel>,
    options: GenerationOptions,
}

impl TopicExtractor {
    pub fn new(cache: TopicCache, model: Box<dyn LanguageModel>, options: GenerationOptions) -> Self {
        Self {
            cache,
            model,
            options,
        }
    }

    /// Extract against today's local date.
    pub fn extract(&self, question: &str) -> ExtractionResult {
        self.extract_at(question, Local::now().date_naive())
    }

    /// Extract with an explicit reference date for period resolution.
    pub fn extract_at(&self, question: &str, today: NaiveDate) -> ExtractionResult {
        let period = resolve_period(question, today);

        if let Some(topic) = self.cache.lookup(question) {
            tracing::debug!(topic, "topic cache hit");
            return ExtractionResult {
                topic: Some(topic.to_string()),
                period,
                method: ExtractionMethod::Cache,
                confidence: 1.0,
            };
        }

        let prompt = build_prompt(question);
        if let Some(proposed) = self.model.generate(&prompt, &self.options) {
            match self.normalize_topic(&proposed.topic) {
                Some(topic) => {
                    tracing::info!(topic = %topic, backend = self.model.name(), "topic from model");
                    return ExtractionResult {
                        topic: Some(topic),
                        period,
                        method: ExtractionMethod::Llm,
                        confidence: proposed.confidence.clamp(0.0, 1.0),
                    };
                }
                None => tracing::warn!(raw = %proposed.topic, "model proposed an empty topic"),
            }
        }

        tracing::info!("no topic identified");
        ExtractionResult {
            topic: None,
            period,
            method: ExtractionMethod::Fallback,
            confidence: 0.0,
        }
    }

    /// Lowercase the first word of the model's answer, reduce it to singular and
    /// map known variants to their canonical topic.
    fn normalize_topic(&self, raw: &str) -> Option<String> {
        let word: String = raw
            .split_whitespace()
            .next()?
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();

        if word.is_empty() {
            return None;
        }

        if let Some(topic) = self.cache.canonical(&word) {
            return Some(topic.to_string());
        }
        let singular = singularize(&word);
        Some(
            self.cache
                .canonical(&singular)
                .map(str::to_string)
                .unwrap_or(singular),
        )
    }

    /// Canonical topics the cache answers instantly.
    pub fn known_topics(&self) -> Vec<&str> {
        self.cache.topics()
    }

    pub fn backend_name(&self) -> &'static str {
        self.model.name()
    }

    pub fn backend_available(&self) -> bool {
        self.model.is_available()
    }
}

/// Spanish plural to singular for a lowercase word.
///
/// `-ces` becomes `-z`, `-es` is dropped after a consonant a singular can end in
/// (`l n r d j y`), otherwise a trailing `-s` after a vowel is dropped. Words
/// ending in `-is` or `-us` and words of three letters or fewer are kept.
pub fn singularize(word: &str) -> String {
    if word.chars().count() <= 3 || word.ends_with("is") || word.ends_with("us") {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ces") {
        return format!("{stem}z");
    }
    if let Some(stem) = word.strip_suffix("es") {
        if stem.ends_with(['l', 'n', 'r', 'd', 'j', 'y']) {
            return stem.to_string();
        }
    }
    match word.strip_suffix('s') {
        Some(stem) if stem.ends_with(['a', 'e', 'i', 'o', 'u']) => stem.to_string(),
        _ => word.to_string(),
    }
}

/// Instruction prompt for the model fallback.
pub fn build_prompt(question: &str) -> String {
    format!(
        r#"Analiza esta pregunta sobre transcripciones de cobranza.

PREGUNTA: "{question}"

CONTEXTO: Transcripciones con temas como:
- alquiler (pagos de alquiler/renta)
- juicio (temas legales, demandas, abogados)
- pago (pagos, deudas, préstamos)
- trabajo (empleo, desempleo, situación laboral)
- promesa (promesas de pago, compromisos)

Responde SOLO este JSON (sin markdown, sin explicaciones):
{{
  "topic": "palabra_clave",
  "confidence": 0.95
}}

Reglas:
- topic en SINGULAR y en minúsculas
- Corregir errores ortográficos
- Una sola palabra clave principal"#
    )
}
