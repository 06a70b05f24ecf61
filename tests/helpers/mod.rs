#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use lema::analysis::AnalysisEngine;
use lema::db::{self, SqliteExecutor, Transcript};
use lema::extract::{TopicCache, TopicExtractor};
use lema::model::{GenerationOptions, LanguageModel, ModelError};
use rusqlite::Connection;

/// Open a fresh in-memory database with functions and schema applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Insert one transcript with the fields the analyses look at.
pub fn insert(
    conn: &Connection,
    uid: &str,
    fecha: &str,
    lemas: &str,
    tema: &str,
    supervisor: &str,
    duracion_seg: f64,
) {
    let transcript = Transcript {
        uid: uid.into(),
        fecha: fecha.into(),
        region: Some("centro".into()),
        supervisor: Some(supervisor.into()),
        temas_detectados: Some(tema.into()),
        duracion_seg: Some(duracion_seg),
        num_turnos_cliente: Some(3),
        lemas: lemas.into(),
    };
    assert!(db::insert_transcript(conn, &transcript).unwrap());
}

/// Insert `count` transcripts sharing everything but the uid.
pub fn insert_many(
    conn: &Connection,
    prefix: &str,
    count: usize,
    fecha: &str,
    lemas: &str,
    tema: &str,
    supervisor: &str,
    duracion_seg: f64,
) {
    for i in 0..count {
        insert(
            conn,
            &format!("{prefix}-{i}"),
            fecha,
            lemas,
            tema,
            supervisor,
            duracion_seg,
        );
    }
}

pub fn engine(conn: Connection) -> AnalysisEngine {
    AnalysisEngine::new(Arc::new(SqliteExecutor::new(Arc::new(Mutex::new(conn)))))
}

/// Model double that replays a fixed reply (or fails) and counts calls.
pub struct CountingModel {
    pub reply: Option<String>,
    pub calls: Arc<AtomicUsize>,
}

impl LanguageModel for CountingModel {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn complete(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().ok_or(ModelError::Status(503))
    }

    fn is_available(&self) -> bool {
        self.reply.is_some()
    }
}

/// Extractor over the default cache and a counting model. Returns the call counter.
pub fn extractor(reply: Option<&str>) -> (TopicExtractor, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let model = CountingModel {
        reply: reply.map(str::to_string),
        calls: Arc::clone(&calls),
    };
    let options = GenerationOptions {
        temperature: 0.1,
        max_tokens: 50,
    };
    (
        TopicExtractor::new(TopicCache::default(), Box::new(model), options),
        calls,
    )
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
