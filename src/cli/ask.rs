use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};

use lema::agent::AnalyticsAgent;
use lema::config::LemaConfig;
use lema::db;
use lema::session::SessionStore;

/// Ask one question from the terminal and print the conversational reply.
pub async fn ask(config: &LemaConfig, question: &str, session: &str, verbose: bool) -> Result<()> {
    let conn = db::open_database(config.resolved_db_path())?;
    let config = config.clone();
    let question = question.to_string();
    let session = session.to_string();

    let response = tokio::task::spawn_blocking(move || -> Result<_> {
        let sessions = Arc::new(SessionStore::new(config.session.history_limit));
        let agent = AnalyticsAgent::from_config(&config, Arc::new(Mutex::new(conn)), sessions)?;
        Ok(agent.ask(&session, &question))
    })
    .await
    .context("ask task failed")??;

    println!("{}", response.reply);

    if verbose {
        println!();
        println!("Topic:       {}", response.topic.as_deref().unwrap_or("(none)"));
        println!(
            "Period:      {}",
            response.period.as_ref().map(|p| p.value()).unwrap_or("(none)")
        );
        println!("Method:      {} (confidence {:.2})", response.method, response.confidence);
        if let Some(ref sql) = response.query {
            println!();
            println!("{sql}");
        }
    }

    Ok(())
}
