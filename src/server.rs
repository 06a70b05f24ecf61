//! MCP server initialization for the stdio transport.

use crate::tools::LemaTools;
use anyhow::{Context, Result};
use lema::agent::AnalyticsAgent;
use lema::config::LemaConfig;
use lema::db;
use lema::session::SessionStore;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};

/// Open the database and build the analytics agent. The model backend owns a
/// blocking HTTP client, so the agent is assembled on the blocking pool.
pub async fn build_agent(config: &LemaConfig) -> Result<Arc<AnalyticsAgent>> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let conn = Arc::new(Mutex::new(conn));
    let sessions = Arc::new(SessionStore::new(config.session.history_limit));
    let config = config.clone();

    let agent = tokio::task::spawn_blocking(move || {
        AnalyticsAgent::from_config(&config, conn, sessions)
    })
    .await
    .context("agent setup task failed")??;

    tracing::info!(
        backend = agent.extractor().backend_name(),
        "analytics agent ready"
    );
    Ok(Arc::new(agent))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: LemaConfig) -> Result<()> {
    tracing::info!("starting lema MCP server on stdio");

    let agent = build_agent(&config).await?;
    let tools = LemaTools::new(agent, Arc::new(config));
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}
