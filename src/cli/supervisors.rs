use anyhow::Result;

use lema::config::LemaConfig;

/// Rank supervisors by transcripts matching `topic`.
pub fn supervisors(config: &LemaConfig, topic: &str, limit: Option<usize>) -> Result<()> {
    let engine = super::open_engine(config)?;
    let limit = limit.unwrap_or(config.analysis.supervisor_limit).max(1);

    match engine.top_supervisors(topic, limit) {
        Ok(outcome) => {
            println!("Supervisores con más casos de '{topic}'\n");
            super::print_table(&outcome.data);
        }
        Err(e) => println!("{e}"),
    }

    Ok(())
}
