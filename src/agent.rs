//! The analytics agent: question in, conversational analysis out.
//!
//! Chains extraction → analysis → session update → reply. Every expected failure
//! (no topic, no data) becomes an [`AskResponse`] with `success: false` and a
//! guiding message, never an error.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;

use crate::analysis::{AnalysisEngine, ResultMap, TopicAnalysis};
use crate::config::LemaConfig;
use crate::db::SqliteExecutor;
use crate::extract::{ExtractionMethod, PeriodDescriptor, TopicCache, TopicExtractor};
use crate::model::{self, GenerationOptions};
use crate::session::{ContextUpdate, ConversationContext, SessionStore};

pub const NO_TOPIC_REPLY: &str = "No pude identificar un tema específico en tu pregunta. \
¿Podrías reformularla? Por ejemplo: 'Analiza los casos de juicio este mes'";

#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<PeriodDescriptor>,
    pub method: ExtractionMethod,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResultMap>,
    pub insights: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ConversationContext>,
    pub reply: String,
}

pub struct AnalyticsAgent {
    extractor: TopicExtractor,
    engine: AnalysisEngine,
    sessions: Arc<SessionStore>,
}

impl AnalyticsAgent {
    pub fn new(extractor: TopicExtractor, engine: AnalysisEngine, sessions: Arc<SessionStore>) -> Self {
        Self {
            extractor,
            engine,
            sessions,
        }
    }

    /// Wire the configured model backend and the SQLite executor together.
    ///
    /// Builds a blocking HTTP client, so call it off the async runtime.
    pub fn from_config(
        config: &LemaConfig,
        conn: Arc<Mutex<Connection>>,
        sessions: Arc<SessionStore>,
    ) -> Result<Self> {
        let backend = model::create_backend(&config.model)?;
        let extractor = TopicExtractor::new(
            TopicCache::default(),
            backend,
            GenerationOptions::from(&config.model),
        );
        let engine = AnalysisEngine::with_topic_limit(
            Arc::new(SqliteExecutor::new(conn)),
            config.analysis.topic_limit,
        );
        Ok(Self::new(extractor, engine, sessions))
    }

    pub fn extractor(&self) -> &TopicExtractor {
        &self.extractor
    }

    pub fn engine(&self) -> &AnalysisEngine {
        &self.engine
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn ask(&self, session_id: &str, question: &str) -> AskResponse {
        self.ask_at(session_id, question, Local::now().date_naive())
    }

    /// [`ask`](Self::ask) with an explicit reference date for period resolution.
    pub fn ask_at(&self, session_id: &str, question: &str, today: NaiveDate) -> AskResponse {
        let extraction = self.extractor.extract_at(question, today);
        tracing::info!(
            session = session_id,
            method = %extraction.method,
            topic = ?extraction.topic,
            "question extracted"
        );

        let Some(topic) = extraction.topic.clone() else {
            return AskResponse {
                success: false,
                topic: None,
                period: extraction.period,
                method: extraction.method,
                confidence: extraction.confidence,
                data: None,
                insights: Vec::new(),
                query: None,
                context: None,
                reply: NO_TOPIC_REPLY.to_string(),
            };
        };

        let analysis = match self.engine.analyze_topic(&topic, extraction.period.as_ref()) {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::info!(session = session_id, error = %e, "analysis returned nothing");
                return AskResponse {
                    success: false,
                    topic: Some(topic.clone()),
                    period: extraction.period,
                    method: extraction.method,
                    confidence: extraction.confidence,
                    data: None,
                    insights: Vec::new(),
                    query: None,
                    context: None,
                    reply: no_data_reply(&topic),
                };
            }
        };

        let reply = compose_reply(&analysis);
        let context = self.sessions.record_exchange(
            session_id,
            question,
            ContextUpdate {
                topic: Some(topic.clone()),
                period: extraction.period.clone(),
                last_analysis: Some(analysis.clone()),
            },
            &reply,
            Some(json!({ "lema": topic })),
        );

        AskResponse {
            success: true,
            topic: Some(topic),
            period: extraction.period,
            method: extraction.method,
            confidence: extraction.confidence,
            query: Some(analysis.query.sql.clone()),
            insights: analysis.insights.clone(),
            data: Some(analysis.data),
            context: Some(context),
            reply,
        }
    }
}

pub fn no_data_reply(topic: &str) -> String {
    format!("No encontré datos para '{topic}'. Intenta con: juicio, alquiler, pago, trabajo, deuda.")
}

/// Markdown reply: header, one bullet per insight, total cases, closing hint.
pub fn compose_reply(analysis: &TopicAnalysis) -> String {
    let mut reply = format!("📊 **Análisis de '{}'**\n\n", analysis.topic);

    for insight in &analysis.insights {
        reply.push_str(&format!("• {insight}\n"));
    }

    let has_topics = analysis
        .data
        .get(crate::analysis::results::TOPICS_KEY)
        .is_some_and(|rows| !rows.is_empty());
    if has_topics {
        reply.push_str(&format!(
            "\n**Total de casos encontrados:** {}\n",
            analysis.total_cases()
        ));
    }

    reply.push_str("\n💡 *Puedes pedirme más detalles o hacer otra pregunta.*");
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalyticalQuery, QueryExecutor, Row};
    use crate::model::{LanguageModel, ModelError};
    use crate::session::Role;
    use serde_json::Value;

    struct Silent;

    impl LanguageModel for Silent {
        fn name(&self) -> &'static str {
            "silent"
        }
        fn complete(&self, _: &str, _: &GenerationOptions) -> Result<String, ModelError> {
            Err(ModelError::Status(500))
        }
        fn is_available(&self) -> bool {
            false
        }
    }

    struct Fixed(Vec<Row>);

    impl QueryExecutor for Fixed {
        fn execute(&self, _: &AnalyticalQuery) -> Result<Vec<Row>> {
            Ok(self.0.clone())
        }
    }

    fn agent(rows: Vec<Value>) -> AnalyticsAgent {
        let rows = rows
            .into_iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect();
        let extractor = TopicExtractor::new(
            TopicCache::default(),
            Box::new(Silent),
            GenerationOptions {
                temperature: 0.1,
                max_tokens: 50,
            },
        );
        AnalyticsAgent::new(
            extractor,
            AnalysisEngine::new(Arc::new(Fixed(rows))),
            Arc::new(SessionStore::new(10)),
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    #[test]
    fn unknown_topic_guides_the_user() {
        let agent = agent(vec![]);
        let response = agent.ask_at("s", "hola, ¿cómo estás?", today());
        assert!(!response.success);
        assert_eq!(response.reply, NO_TOPIC_REPLY);
        assert_eq!(agent.sessions().session_count(), 0);
    }

    #[test]
    fn no_data_suggests_topics_and_leaves_session_untouched() {
        let agent = agent(vec![]);
        let response = agent.ask_at("s", "casos de deuda", today());
        assert!(!response.success);
        assert_eq!(response.topic.as_deref(), Some("deuda"));
        assert!(response.reply.starts_with("No encontré datos para 'deuda'"));
        assert!(agent.sessions().history("s", None).is_empty());
    }

    #[test]
    fn success_records_both_turns_and_context() {
        let agent = agent(vec![json!({
            "tipo_resultado": "temas",
            "datos": [{"temas": "juicio", "frecuencia": 3}, {"temas": "pago", "frecuencia": 1}]
        })]);
        let response = agent.ask_at("s", "juicios este mes", today());

        assert!(response.success);
        assert_eq!(response.period.as_ref().map(|p| p.value()), Some("2024-06"));
        assert!(response.reply.starts_with("📊 **Análisis de 'juicio'**"));
        assert!(response.reply.contains("**Total de casos encontrados:** 4"));
        assert!(response.reply.ends_with("otra pregunta.*"));

        let history = agent.sessions().history("s", None);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].text, "juicios este mes");
        assert_eq!(history[1].role, Role::Agent);
        assert_eq!(history[1].metadata, Some(json!({"lema": "juicio"})));

        let ctx = response.context.unwrap();
        assert_eq!(ctx.last_topic.as_deref(), Some("juicio"));
        assert!(ctx.last_analysis.is_some());
    }
}
