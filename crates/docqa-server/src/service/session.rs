//! Per-browser sessions.
//!
//! A session holds the chat transcript and, once initialized, the chatbot
//! pipeline. Sessions are identified by the [`SESSION_COOKIE`] and dropped
//! after [`DEFAULT_SESSION_TTL`] without activity.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use docqa_rig::rag::{RagPipeline, Reply};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use crate::TRACING_TARGET_SESSION;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "docqa_session";

/// Idle time after which a session is discarded.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Set on assistant messages describing a failure.
    #[serde(default)]
    pub failed: bool,
    pub created_at: Timestamp,
}

impl ChatMessage {
    /// A question typed by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            failed: false,
            created_at: Timestamp::now(),
        }
    }

    /// The assistant's reply.
    pub fn assistant(reply: &Reply) -> Self {
        Self {
            role: Role::Assistant,
            content: reply.content.clone(),
            failed: reply.failed,
            created_at: Timestamp::now(),
        }
    }
}

/// Mutable state of one session.
#[derive(Debug, Default)]
pub struct SessionData {
    messages: Vec<ChatMessage>,
    chatbot: Option<RagPipeline>,
}

impl SessionData {
    /// Returns the transcript.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Appends a message.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Empties the transcript, keeping the chatbot.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Returns the chatbot if initialized.
    pub fn chatbot(&self) -> Option<&RagPipeline> {
        self.chatbot.as_ref()
    }

    /// Installs the chatbot, replacing any previous one.
    pub fn set_chatbot(&mut self, chatbot: RagPipeline) {
        self.chatbot = Some(chatbot);
    }

    /// Returns true once a chatbot is installed.
    pub fn is_initialized(&self) -> bool {
        self.chatbot.is_some()
    }
}

/// Handle to one session. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SessionContext {
    id: Uuid,
    data: Arc<Mutex<SessionData>>,
}

impl SessionContext {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            data: Arc::new(Mutex::new(SessionData::default())),
        }
    }

    /// Returns the session id carried by the cookie.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Locks the session for one interaction.
    pub async fn lock(&self) -> MutexGuard<'_, SessionData> {
        self.data.lock().await
    }
}

struct SessionEntry {
    context: SessionContext,
    last_seen: Instant,
}

/// In-memory session registry with idle expiry.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Returns the idle timeout.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the live session for `id`, or starts a new one.
    ///
    /// The boolean is true when a new session was created. Expired sessions
    /// are dropped on the way.
    pub async fn resolve(&self, id: Option<Uuid>) -> (SessionContext, bool) {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(target: TRACING_TARGET_SESSION, evicted, "Expired sessions dropped");
        }

        if let Some(entry) = id.and_then(|id| sessions.get_mut(&id)) {
            entry.last_seen = now;
            return (entry.context.clone(), false);
        }

        let context = SessionContext::new();
        sessions.insert(
            context.id(),
            SessionEntry {
                context: context.clone(),
                last_seen: now,
            },
        );
        tracing::debug!(target: TRACING_TARGET_SESSION, session = %context.id(), "Session started");

        (context, true)
    }

    /// Returns the session for `id` without touching it.
    pub async fn get(&self, id: Uuid) -> Option<SessionContext> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .filter(|entry| entry.last_seen.elapsed() < self.ttl)
            .map(|entry| entry.context.clone())
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns true if no session is stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_existing_sessions() {
        let store = SessionStore::default();

        let (first, created) = store.resolve(None).await;
        assert!(created);

        let (again, created) = store.resolve(Some(first.id())).await;
        assert!(!created);
        assert_eq!(again.id(), first.id());

        let (other, created) = store.resolve(Some(Uuid::new_v4())).await;
        assert!(created);
        assert_ne!(other.id(), first.id());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn sessions_share_state_across_handles() {
        let store = SessionStore::default();
        let (session, _) = store.resolve(None).await;

        session.lock().await.push(ChatMessage::user("hello"));

        let handle = store.get(session.id()).await.map(|s| s.id());
        assert_eq!(handle, Some(session.id()));
        let (same, _) = store.resolve(Some(session.id())).await;
        assert_eq!(same.lock().await.messages().len(), 1);
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let store = SessionStore::new(Duration::ZERO);
        let (session, _) = store.resolve(None).await;

        assert!(store.get(session.id()).await.is_none());
        let (fresh, created) = store.resolve(Some(session.id())).await;
        assert!(created);
        assert_ne!(fresh.id(), session.id());
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn assistant_messages_keep_failure_flag() {
        let reply = Reply {
            content: "Error generating response: timeout".to_owned(),
            failed: true,
        };
        let message = ChatMessage::assistant(&reply);
        assert_eq!(message.role, Role::Assistant);
        assert!(message.failed);
    }
}
