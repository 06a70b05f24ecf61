//! Writes to `transcripciones_procesadas`.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// One processed collection call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Generated (UUIDv7) when an import record has none.
    #[serde(default = "new_uid")]
    pub uid: String,
    /// `YYYY-MM-DD` or any SQLite date/time string.
    pub fecha: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub supervisor: Option<String>,
    #[serde(default)]
    pub temas_detectados: Option<String>,
    #[serde(default)]
    pub duracion_seg: Option<f64>,
    #[serde(default)]
    pub num_turnos_cliente: Option<i64>,
    /// Space-separated lemmatized keywords of the call.
    #[serde(default)]
    pub lemas: String,
}

fn new_uid() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Insert `transcript` unless its `uid` exists. Returns whether a row was written.
pub fn insert_transcript(conn: &Connection, transcript: &Transcript) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO transcripciones_procesadas
            (uid, fecha, region, supervisor, temas_detectados, duracion_seg, num_turnos_cliente, lemas)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            transcript.uid,
            transcript.fecha,
            transcript.region,
            transcript.supervisor,
            transcript.temas_detectados,
            transcript.duracion_seg,
            transcript.num_turnos_cliente,
            transcript.lemas,
        ],
    )?;
    Ok(inserted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn sample(uid: &str) -> Transcript {
        Transcript {
            uid: uid.into(),
            fecha: "2024-03-02".into(),
            region: Some("norte".into()),
            supervisor: Some("ana".into()),
            temas_detectados: Some("juicio".into()),
            duracion_seg: Some(120.0),
            num_turnos_cliente: Some(4),
            lemas: "juicio abogado".into(),
        }
    }

    #[test]
    fn duplicate_uid_is_skipped() {
        let conn = open_memory_database().unwrap();
        assert!(insert_transcript(&conn, &sample("a")).unwrap());
        assert!(!insert_transcript(&conn, &sample("a")).unwrap());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM transcripciones_procesadas", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn optional_fields_deserialize_as_missing() {
        let t: Transcript = serde_json::from_str(r#"{"uid": "x", "fecha": "2024-01-01"}"#).unwrap();
        assert_eq!(t.lemas, "");
        assert!(t.supervisor.is_none());
    }

    #[test]
    fn missing_uid_is_generated() {
        let a: Transcript = serde_json::from_str(r#"{"fecha": "2024-01-01"}"#).unwrap();
        let b: Transcript = serde_json::from_str(r#"{"fecha": "2024-01-01"}"#).unwrap();
        assert_eq!(a.uid.len(), 36);
        assert_ne!(a.uid, b.uid);
    }
}
