//! SQL DDL for the transcript store.
//!
//! Defines `transcripciones_procesadas` (one row per processed collection call)
//! and `schema_meta`. All DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// Schema version written on first initialization.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = r#"
-- Processed call transcripts
CREATE TABLE IF NOT EXISTS transcripciones_procesadas (
    uid TEXT PRIMARY KEY,
    fecha TEXT NOT NULL,
    region TEXT,
    supervisor TEXT,
    temas_detectados TEXT,
    duracion_seg REAL,
    num_turnos_cliente INTEGER,
    lemas TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_transcripciones_fecha ON transcripciones_procesadas(fecha);
CREATE INDEX IF NOT EXISTS idx_transcripciones_supervisor ON transcripciones_procesadas(supervisor);
CREATE INDEX IF NOT EXISTS idx_transcripciones_region ON transcripciones_procesadas(region);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Read the stored schema version.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}
