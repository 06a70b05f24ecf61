use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use lema::config::LemaConfig;
use lema::db::{self, Transcript};

/// Import transcripts from a JSON array file. Existing `uid`s are skipped.
pub fn import(config: &LemaConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;

    let transcripts: Vec<Transcript> =
        serde_json::from_str(&json).context("failed to parse import JSON")?;

    let mut conn = db::open_database(config.resolved_db_path())?;

    println!("Importing {} transcripts...", transcripts.len());

    let pb = ProgressBar::new(transcripts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")
            .context("invalid progress template")?
            .progress_chars("##-"),
    );

    let tx = conn.transaction()?;
    let mut imported = 0u64;
    let mut skipped = 0u64;

    for transcript in &transcripts {
        if db::insert_transcript(&tx, transcript)
            .with_context(|| format!("failed to insert transcript {}", transcript.uid))?
        {
            imported += 1;
        } else {
            skipped += 1;
        }
        pb.inc(1);
    }

    tx.commit()?;
    pb.finish_and_clear();

    tracing::info!(imported, skipped, "import complete");
    println!("Import complete: {imported} imported, {skipped} skipped (already exist)");

    Ok(())
}
