//! Per-session conversation history and last-known analysis context.
//!
//! [`SessionStore`] is an in-process component with an explicit lifecycle: the
//! caller constructs it with a history bound and shares it (usually behind an
//! `Arc`). Sessions are created lazily on first write and live until
//! [`SessionStore::clear_session`].
//!
//! Locking is two-level: the map sits behind an `RwLock`, and each session behind
//! its own `Mutex`, so writes to one session are serialized while writes to
//! different sessions proceed independently.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::analysis::TopicAnalysis;
use crate::extract::PeriodDescriptor;

/// Default number of messages retained per session.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationEntry {
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ConversationEntry {
    fn new(role: Role, text: &str, metadata: Option<Value>) -> Self {
        Self {
            timestamp: Utc::now(),
            role,
            text: text.to_string(),
            metadata,
        }
    }
}

/// What the session last talked about. Each field is overwritten independently.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationContext {
    pub last_topic: Option<String>,
    pub last_period: Option<PeriodDescriptor>,
    pub last_analysis: Option<TopicAnalysis>,
}

/// Partial context update. `None` fields leave the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ContextUpdate {
    pub topic: Option<String>,
    pub period: Option<PeriodDescriptor>,
    pub last_analysis: Option<TopicAnalysis>,
}

#[derive(Debug)]
struct Session {
    created_at: DateTime<Utc>,
    history: VecDeque<ConversationEntry>,
    context: ConversationContext,
    /// Set under the session lock once the session leaves the map. Writers that
    /// find it set retry against a fresh session.
    cleared: bool,
}

impl Session {
    fn new() -> Self {
        Self {
            created_at: Utc::now(),
            history: VecDeque::new(),
            context: ConversationContext::default(),
            cleared: false,
        }
    }

    fn push(&mut self, entry: ConversationEntry, max_history: usize) {
        self.history.push_back(entry);
        while self.history.len() > max_history {
            self.history.pop_front();
        }
    }

    fn apply(&mut self, update: ContextUpdate) {
        if let Some(topic) = update.topic {
            self.context.last_topic = Some(topic);
        }
        if let Some(period) = update.period {
            self.context.last_period = Some(period);
        }
        if let Some(analysis) = update.last_analysis {
            self.context.last_analysis = Some(analysis);
        }
    }
}

type SessionHandle = Arc<Mutex<Session>>;

/// A poisoned session lock still guards consistent data: every mutation below
/// completes before it can panic.
fn lock(handle: &SessionHandle) -> MutexGuard<'_, Session> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SessionStore {
    max_history: usize,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl SessionStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    fn get_or_create(&self, session_id: &str) -> SessionHandle {
        if let Some(handle) = self.get(session_id) {
            return handle;
        }

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(sessions.entry(session_id.to_string()).or_insert_with(|| {
            tracing::debug!(session = session_id, "session created");
            Arc::new(Mutex::new(Session::new()))
        }))
    }

    /// Run `f` on the live session, creating it if needed. Holds the session lock
    /// for the whole call.
    fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let handle = self.get_or_create(session_id);
        let mut session = lock(&handle);
        if session.cleared {
            drop(session);
            return self.with_session(session_id, f);
        }
        f(&mut session)
    }

    /// Append a message, then drop the oldest entries beyond the history bound.
    pub fn append_message(&self, session_id: &str, text: &str, role: Role, metadata: Option<Value>) {
        let entry = ConversationEntry::new(role, text, metadata);
        self.with_session(session_id, |session| session.push(entry, self.max_history));
    }

    pub fn update_context(&self, session_id: &str, update: ContextUpdate) {
        self.with_session(session_id, |session| session.apply(update));
    }

    /// Record a full question/answer exchange atomically: the user message, the
    /// context update and the agent reply. Returns the resulting context.
    pub fn record_exchange(
        &self,
        session_id: &str,
        question: &str,
        update: ContextUpdate,
        reply: &str,
        reply_metadata: Option<Value>,
    ) -> ConversationContext {
        let asked = ConversationEntry::new(Role::User, question, None);
        let answered = ConversationEntry::new(Role::Agent, reply, reply_metadata);
        self.with_session(session_id, |session| {
            session.push(asked, self.max_history);
            session.apply(update);
            session.push(answered, self.max_history);
            session.context.clone()
        })
    }

    /// Current context; empty for unknown sessions.
    pub fn context(&self, session_id: &str) -> ConversationContext {
        let Some(handle) = self.get(session_id) else {
            return ConversationContext::default();
        };
        let context = lock(&handle).context.clone();
        context
    }

    /// Retained history, oldest first. With a non-zero `limit`, only the most
    /// recent `limit`; `Some(0)` means the whole history.
    pub fn history(&self, session_id: &str, limit: Option<usize>) -> Vec<ConversationEntry> {
        let Some(handle) = self.get(session_id) else {
            return Vec::new();
        };
        let session = lock(&handle);
        let skip = limit
            .filter(|&n| n > 0)
            .map(|n| session.history.len().saturating_sub(n))
            .unwrap_or(0);
        session.history.iter().skip(skip).cloned().collect()
    }

    /// Drop the session and everything in it. Returns whether it existed.
    pub fn clear_session(&self, session_id: &str) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id);
        let Some(handle) = removed else {
            return false;
        };
        lock(&handle).cleared = true;
        tracing::info!(session = session_id, "session cleared");
        true
    }

    /// One-line description: creation time, message count, last topic.
    pub fn summary(&self, session_id: &str) -> String {
        let Some(handle) = self.get(session_id) else {
            return "Sin historial de conversación".to_string();
        };
        let session = lock(&handle);
        format!(
            "Sesión iniciada: {}\nMensajes: {}\nÚltimo tema: {}",
            session.created_at.format("%Y-%m-%d %H:%M"),
            session.history.len(),
            session.context.last_topic.as_deref().unwrap_or("Ninguno")
        )
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
