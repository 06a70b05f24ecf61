use anyhow::Result;

use lema::config::LemaConfig;

/// Display dataset-wide statistics in the terminal.
pub fn stats(config: &LemaConfig) -> Result<()> {
    let engine = super::open_engine(config)?;

    let outcome = match engine.general_stats() {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("{e}");
            return Ok(());
        }
    };

    println!("Estadísticas generales");
    println!("{}", "=".repeat(40));
    for row in &outcome.data {
        for (column, value) in row {
            println!("  {:<22} {}", column, super::display(value));
        }
    }

    Ok(())
}
