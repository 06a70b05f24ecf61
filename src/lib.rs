//! Natural-language analytics over collection-call transcripts.
//!
//! `lema` turns a Spanish question such as *"¿Cuántos casos de alquiler hay este
//! mes?"* into a topic ("lema") plus an optional month, synthesizes a parameterized
//! analytical query, runs it, and derives human-readable insights. Conversation
//! history and the last analysis are kept per session.
//!
//! # Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Topic + period extraction | [`extract`] | [`extract::ExtractionResult`] |
//! | Query synthesis | [`analysis::query`] | [`analysis::AnalyticalQuery`] |
//! | Execution | [`db::SqliteExecutor`] | rows |
//! | Shaping + insights | [`analysis`] | [`analysis::TopicAnalysis`] |
//! | Conversation | [`session`], [`agent`] | [`agent::AskResponse`] |
//!
//! Topic extraction answers from a fixed vocabulary first and only falls back to a
//! language model ([`model`], Ollama or Gemini) on a miss.
//!
//! # Modules
//!
//! - [`agent`]: Composes extraction, analysis and session updates into a reply
//! - [`analysis`]: Query synthesis, result shaping and insight rules
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite storage, the `similarity()` function and health checks
//! - [`extract`]: Topic cache, model fallback and period resolution
//! - [`model`]: Language model backends
//! - [`session`]: Per-session history and context

pub mod agent;
pub mod analysis;
pub mod config;
pub mod db;
pub mod extract;
pub mod model;
pub mod session;
