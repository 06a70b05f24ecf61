pub mod ask;
pub mod compare_periods;
pub mod session;
pub mod top_supervisors;

use ask::AskParams;
use compare_periods::ComparePeriodsParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde_json::json;
use session::{ClearSessionParams, SessionHistoryParams};
use std::sync::Arc;
use top_supervisors::TopSupervisorsParams;

use lema::agent::AnalyticsAgent;
use lema::analysis::{AnalysisError, QueryOutcome};
use lema::config::LemaConfig;

const DEFAULT_SESSION: &str = "default";

/// The lema MCP tool handler. Holds the shared analytics agent and config and
/// exposes every tool via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct LemaTools {
    tool_router: ToolRouter<Self>,
    agent: Arc<AnalyticsAgent>,
    config: Arc<LemaConfig>,
}

impl LemaTools {
    /// Run `f` against the agent on the blocking pool. Model calls and SQLite
    /// queries are synchronous.
    async fn blocking<T, F>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&AnalyticsAgent) -> T + Send + 'static,
        T: Send + 'static,
    {
        let agent = Arc::clone(&self.agent);
        tokio::task::spawn_blocking(move || f(&agent))
            .await
            .map_err(|e| format!("analysis task failed: {e}"))
    }
}

/// `{"success": true, "data": [...]}` or `{"success": false, "error": "..."}`.
fn outcome_json(result: Result<QueryOutcome, AnalysisError>) -> Result<String, String> {
    let value = match result {
        Ok(outcome) => json!({
            "success": true,
            "data": outcome.data,
            "query": outcome.query.sql,
        }),
        Err(e) => json!({ "success": false, "error": e.to_string() }),
    };
    serde_json::to_string(&value).map_err(|e| format!("serialization failed: {e}"))
}

#[tool_router]
impl LemaTools {
    pub fn new(agent: Arc<AnalyticsAgent>, config: Arc<LemaConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            agent,
            config,
        }
    }

    /// Answer a natural-language question about the transcripts.
    #[tool(description = "Ask a question in Spanish about collection-call transcripts. Extracts the topic (lema) and period, runs the analysis and returns data, insights and a conversational reply.")]
    async fn ask(&self, Parameters(params): Parameters<AskParams>) -> Result<String, String> {
        if params.question.trim().is_empty() {
            return Err("question must not be empty".into());
        }

        let session = params
            .session_id
            .unwrap_or_else(|| DEFAULT_SESSION.to_string());
        tracing::info!(session = %session, question_len = params.question.len(), "ask called");

        let question = params.question;
        let response = self
            .blocking(move |agent| agent.ask(&session, &question))
            .await?;

        serde_json::to_string(&response).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Dataset-wide totals.
    #[tool(description = "General statistics over all transcripts: total records, distinct days, date range, regions, supervisors, average duration and customer turns.")]
    async fn general_stats(&self) -> Result<String, String> {
        tracing::info!("general_stats called");
        let result = self.blocking(|agent| agent.engine().general_stats()).await?;
        outcome_json(result)
    }

    #[tool(description = "Compare case counts and average duration for a topic between two months (YYYY-MM), with percent variation.")]
    async fn compare_periods(
        &self,
        Parameters(params): Parameters<ComparePeriodsParams>,
    ) -> Result<String, String> {
        tracing::info!(
            topic = %params.topic,
            period1 = %params.period1,
            period2 = %params.period2,
            "compare_periods called"
        );
        let result = self
            .blocking(move |agent| {
                agent
                    .engine()
                    .compare_periods(&params.topic, &params.period1, &params.period2)
            })
            .await?;
        outcome_json(result)
    }

    #[tool(description = "Rank supervisors by number of transcripts matching a topic.")]
    async fn top_supervisors(
        &self,
        Parameters(params): Parameters<TopSupervisorsParams>,
    ) -> Result<String, String> {
        let limit = params
            .limit
            .unwrap_or(self.config.analysis.supervisor_limit)
            .max(1);
        tracing::info!(topic = %params.topic, limit, "top_supervisors called");

        let result = self
            .blocking(move |agent| agent.engine().top_supervisors(&params.topic, limit))
            .await?;
        outcome_json(result)
    }

    /// Conversation history of a session.
    #[tool(description = "Get the conversation history of a session, oldest first.")]
    async fn session_history(
        &self,
        Parameters(params): Parameters<SessionHistoryParams>,
    ) -> Result<String, String> {
        let limit = params.limit.unwrap_or(self.config.session.history_limit);
        let history = self.agent.sessions().history(&params.session_id, Some(limit));

        Ok(json!({
            "session_id": params.session_id,
            "total_messages": history.len(),
            "summary": self.agent.sessions().summary(&params.session_id),
            "history": history,
        })
        .to_string())
    }

    #[tool(description = "Delete a conversation session and its context.")]
    async fn clear_session(
        &self,
        Parameters(params): Parameters<ClearSessionParams>,
    ) -> Result<String, String> {
        self.agent.sessions().clear_session(&params.session_id);
        Ok(json!({
            "success": true,
            "message": format!("Sesión {} limpiada", params.session_id),
        })
        .to_string())
    }

    /// Topics answered from the built-in vocabulary.
    #[tool(description = "List the topics (lemas) the system recognizes without calling the language model.")]
    async fn list_topics(&self) -> Result<String, String> {
        let topics = self.agent.extractor().known_topics();
        Ok(json!({ "total": topics.len(), "topics": topics }).to_string())
    }
}

#[tool_handler]
impl ServerHandler for LemaTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "lema answers questions about collection-call transcripts. Use ask for \
                 natural-language analysis, compare_periods and top_supervisors for \
                 targeted queries, and general_stats for dataset totals."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
