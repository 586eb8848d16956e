//! Chat sessions: an append-only turn log per visitor.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use omicscope_common::Language;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::router::Intent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub query: String,
    /// Final, possibly translated, answer text.
    pub response: String,
    pub intent: Intent,
    pub language: Language,
    pub answered_at: DateTime<Utc>,
}

/// Turns are only ever appended; existing entries are never edited.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    turns: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4(), created_at: Utc::now(), turns: Vec::new() }
    }

    pub fn append(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    /// Turns in submission order.
    pub fn history(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Held for the whole route → translate → append chain, so two submissions
/// to one session never interleave.
pub type SessionHandle = Arc<Mutex<ChatSession>>;

/// In-memory registry of live sessions. Sessions end when the visitor ends
/// them or the process stops.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a new session.
    pub async fn start(&self) -> (Uuid, SessionHandle) {
        let session = ChatSession::new();
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.register(id, handle.clone()).await;
        (id, handle)
    }

    /// Make `handle` a live session under `id`.
    pub async fn register(&self, id: Uuid, handle: SessionHandle) {
        self.sessions.write().await.insert(id, handle);
        tracing::debug!(session_id = %id, "Chat session started");
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// The session for `id` if it is still live, otherwise a fresh session
    /// that is not registered yet. The flag is `true` for a live session.
    pub async fn resume_or_new(&self, id: Option<Uuid>) -> (Uuid, SessionHandle, bool) {
        if let Some(id) = id {
            if let Some(handle) = self.get(id).await {
                return (id, handle, true);
            }
        }
        let session = ChatSession::new();
        (session.id, Arc::new(Mutex::new(session)), false)
    }

    /// Discard the session. Returns whether it existed.
    pub async fn end(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::debug!(session_id = %id, "Chat session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(query: &str) -> ChatTurn {
        ChatTurn {
            query: query.to_string(),
            response: format!("answer to {query}"),
            intent: Intent::GeneralLlmQuery,
            language: Language::English,
            answered_at: Utc::now(),
        }
    }

    #[test]
    fn test_history_keeps_submission_order() {
        let mut session = ChatSession::new();
        for q in ["first", "second", "third"] {
            session.append(turn(q));
        }
        let queries: Vec<&str> = session.history().iter().map(|t| t.query.as_str()).collect();
        assert_eq!(queries, vec!["first", "second", "third"]);
        assert_eq!(session.len(), 3);
    }

    #[tokio::test]
    async fn test_resume_or_new() {
        let store = SessionStore::new();
        let (id, handle) = store.start().await;
        handle.lock().await.append(turn("hello"));

        let (resumed, handle, live) = store.resume_or_new(Some(id)).await;
        assert_eq!(resumed, id);
        assert!(live);
        assert_eq!(handle.lock().await.len(), 1);

        let (fresh, handle, live) = store.resume_or_new(Some(Uuid::new_v4())).await;
        assert_ne!(fresh, id);
        assert!(!live);
        assert!(handle.lock().await.is_empty());
        assert_eq!(store.len().await, 1);

        store.register(fresh, handle).await;
        assert!(store.get(fresh).await.is_some());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_new_sessions_are_not_stored_until_registered() {
        let store = SessionStore::new();
        for _ in 0..100 {
            store.resume_or_new(None).await;
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_end_discards_session() {
        let store = SessionStore::new();
        let (id, _) = store.start().await;
        assert!(store.end(id).await);
        assert!(!store.end(id).await);
        assert!(store.get(id).await.is_none());
        assert!(store.is_empty().await);
    }
}
