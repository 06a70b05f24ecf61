//! CLI `doctor` command: database diagnostics and model backend reachability.

use anyhow::{Context, Result};

use lema::config::LemaConfig;
use lema::{db, model};

/// Run diagnostics and print a health report.
pub async fn doctor(config: &LemaConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    println!("lema Health Report");
    println!("==================");
    println!();

    let mut db_ok = false;
    if db_path.exists() {
        let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

        let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;
        let report = db::check_database_health(&conn).context("failed to run health check")?;
        db_ok = report.integrity_ok;

        println!("Database:          {}", db_path.display());
        println!("File size:         {}", format_bytes(file_size));
        println!("Schema version:    {}", report.schema_version);
        println!("Transcripts:       {}", report.transcript_count);
        if report.integrity_ok {
            println!("Integrity check:   PASSED");
        } else {
            println!("Integrity check:   FAILED ({})", report.integrity_details);
        }
    } else {
        println!("Database:          not found at {}", db_path.display());
        println!("Run `lema import <file>` to create and load it.");
    }
    println!();

    let model_config = config.model.clone();
    let (backend, available) = tokio::task::spawn_blocking(move || -> Result<_> {
        let backend = model::create_backend(&model_config)?;
        Ok((backend.name(), backend.is_available()))
    })
    .await
    .context("model probe task failed")??;

    println!("Model backend:     {backend}");
    println!(
        "Reachable:         {}",
        if available { "yes" } else { "no (extraction falls back to the topic cache)" }
    );
    println!();
    println!(
        "Status:            {}",
        if db_ok && available { "healthy" } else { "degraded" }
    );

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
