use anyhow::Result;

use lema::config::LemaConfig;

/// Compare a topic between two `YYYY-MM` months.
pub fn compare(config: &LemaConfig, topic: &str, period1: &str, period2: &str) -> Result<()> {
    let engine = super::open_engine(config)?;

    match engine.compare_periods(topic, period1, period2) {
        Ok(outcome) => {
            println!("Comparación de '{topic}': {period1} vs {period2}\n");
            super::print_table(&outcome.data);
        }
        Err(e) => println!("{e}"),
    }

    Ok(())
}
