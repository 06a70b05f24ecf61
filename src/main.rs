mod cli;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use lema::config::LemaConfig;

#[derive(Parser)]
#[command(
    name = "lema",
    version,
    about = "Natural-language analytics over collection-call transcripts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport)
    Serve,
    /// Ask a question, e.g. "¿Cuántos casos de alquiler hay este mes?"
    Ask {
        question: String,
        /// Conversation session id
        #[arg(long, default_value = "default")]
        session: String,
        /// Also print topic, period, extraction method and the SQL
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show dataset-wide statistics
    Stats,
    /// Compare a topic between two months (YYYY-MM)
    Compare {
        topic: String,
        period1: String,
        period2: String,
    },
    /// Rank supervisors by cases matching a topic
    Supervisors {
        topic: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List topics recognized without the language model
    Topics,
    /// Import transcripts from a JSON array file
    Import { file: PathBuf },
    /// Check database integrity and model backend reachability
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = LemaConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve_stdio(config).await?,
        Command::Ask {
            question,
            session,
            verbose,
        } => cli::ask::ask(&config, &question, &session, verbose).await?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Compare {
            topic,
            period1,
            period2,
        } => cli::compare::compare(&config, &topic, &period1, &period2)?,
        Command::Supervisors { topic, limit } => {
            cli::supervisors::supervisors(&config, &topic, limit)?
        }
        Command::Topics => cli::topics::topics(),
        Command::Import { file } => cli::import::import(&config, &file)?,
        Command::Doctor => cli::doctor::doctor(&config).await?,
    }

    Ok(())
}
