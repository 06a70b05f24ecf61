//! SQLite storage: opening, schema, the `similarity()` function, health checks,
//! transcript writes and the [`QueryExecutor`](crate::analysis::QueryExecutor)
//! implementation.

pub mod executor;
pub mod functions;
pub mod schema;
pub mod transcripts;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub use executor::SqliteExecutor;
pub use transcripts::{insert_transcript, Transcript};

/// Configure a freshly opened connection: pragmas, functions, schema.
fn prepare(conn: &Connection) -> Result<()> {
    conn.busy_timeout(Duration::from_millis(5000))?;
    functions::register_functions(conn).context("failed to register SQL functions")?;
    schema::init_schema(conn).context("failed to initialize schema")?;
    Ok(())
}

/// Open (or create) the transcript database at the given path, with SQL
/// functions registered and schema initialized.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    prepare(&conn)?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open an in-memory database, ready for queries. Used by tests and dry runs.
pub fn open_memory_database() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    prepare(&conn)?;
    Ok(conn)
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    pub schema_version: u32,
    pub transcript_count: u64,
    pub integrity_ok: bool,
    pub integrity_details: String,
}

/// Schema version, row count and `PRAGMA integrity_check` result.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let schema_version = schema::get_schema_version(conn).context("failed to read schema version")?;

    let transcript_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transcripciones_procesadas", [], |row| {
            row.get(0)
        })
        .context("failed to count transcripts")?;

    let integrity: String = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .context("failed to run integrity check")?;

    Ok(HealthReport {
        schema_version,
        transcript_count: transcript_count.max(0) as u64,
        integrity_ok: integrity == "ok",
        integrity_details: integrity,
    })
}
