pub mod ask;
pub mod compare;
pub mod doctor;
pub mod import;
pub mod stats;
pub mod supervisors;
pub mod topics;

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

use lema::analysis::{AnalysisEngine, Row};
use lema::config::LemaConfig;
use lema::db::{self, SqliteExecutor};

/// Engine over the configured database. No model backend involved.
fn open_engine(config: &LemaConfig) -> Result<AnalysisEngine> {
    let conn = db::open_database(config.resolved_db_path())?;
    Ok(AnalysisEngine::with_topic_limit(
        Arc::new(SqliteExecutor::from_connection(conn)),
        config.analysis.topic_limit,
    ))
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Print rows as a left-aligned table using the first row's column order.
fn print_table(rows: &[Row]) {
    let Some(first) = rows.first() else {
        return;
    };
    let columns: Vec<&String> = first.keys().collect();
    let widths: Vec<usize> = columns
        .iter()
        .map(|c| {
            rows.iter()
                .map(|r| r.get(*c).map(display).unwrap_or_default().chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", c, w = *w))
        .collect();
    println!("  {}", header.join("  "));
    println!("  {}", "-".repeat(header.join("  ").chars().count()));

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", row.get(*c).map(display).unwrap_or_default(), w = *w))
            .collect();
        println!("  {}", cells.join("  "));
    }
}
