//! In-memory conversation history, keyed by session.

use async_trait::async_trait;
use reactor_core::message::Message;
use reactor_core::store::{MemoryStore, StoreError};
use std::collections::HashMap;
use tokio::sync::RwLock;

const DEFAULT_MAX_MESSAGES_PER_SESSION: usize = 1000;

struct Session {
    /// Messages paired with the user id that authored them.
    entries: Vec<(Message, String)>,
}

/// In-memory [`MemoryStore`], suitable for tests and single-process
/// deployments. Sessions are trimmed to `max_messages_per_session` on every
/// append, dropping the oldest messages first.
pub struct InMemoryMemoryStore {
    sessions: RwLock<HashMap<String, Session>>,
    max_messages_per_session: usize,
}

impl InMemoryMemoryStore {
    /// Create a store that trims each session to `max_messages_per_session`.
    pub fn new(max_messages_per_session: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_messages_per_session,
        }
    }
}

impl Default for InMemoryMemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES_PER_SESSION)
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn get(&self, session_id: &str) -> Result<Vec<Message>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .map(|s| s.entries.iter().map(|(m, _)| m.clone()).collect())
            .unwrap_or_default())
    }

    async fn add_message(
        &self,
        session_id: &str,
        message: Message,
        user_id: &str,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(session_id.to_string()).or_insert_with(|| Session {
            entries: Vec::new(),
        });
        session.entries.push((message, user_id.to_string()));
        if session.entries.len() > self.max_messages_per_session {
            let excess = session.entries.len() - self.max_messages_per_session;
            session.entries.drain(0..excess);
        }
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.sessions.read().await.keys().cloned().collect())
    }

    async fn list_sessions_by_user_id(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .iter()
            .filter(|(_, session)| {
                !session.entries.is_empty()
                    && session.entries.iter().all(|(_, uid)| uid == user_id)
            })
            .map(|(id, _)| id.clone())
            .collect())
    }

    async fn get_session_owner(&self, session_id: &str) -> Result<String, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .and_then(|s| s.entries.first())
            .map(|(_, uid)| if uid.is_empty() { "anonymous".to_string() } else { uid.clone() })
            .unwrap_or_else(|| "anonymous".to_string()))
    }

    async fn remove(&self, session_id: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_and_get_round_trips() {
        let store = InMemoryMemoryStore::default();
        store
            .add_message("s1", Message::user("hi"), "u1")
            .await
            .unwrap();
        let messages = store.get("s1").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hi");
    }

    #[tokio::test]
    async fn get_on_unknown_session_returns_empty() {
        let store = InMemoryMemoryStore::default();
        assert!(store.get("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn trims_to_max_messages_per_session() {
        let store = InMemoryMemoryStore::new(3);
        for i in 0..5 {
            store
                .add_message("s1", Message::user(format!("m{i}")), "u1")
                .await
                .unwrap();
        }
        let messages = store.get("s1").await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "m2");
        assert_eq!(messages.last().unwrap().content, "m4");
    }

    #[tokio::test]
    async fn list_sessions_by_user_id_requires_full_ownership() {
        let store = InMemoryMemoryStore::default();
        store.add_message("s1", Message::user("a"), "u1").await.unwrap();
        store.add_message("s1", Message::assistant("b"), "u1").await.unwrap();
        store.add_message("s2", Message::user("c"), "u1").await.unwrap();
        store.add_message("s2", Message::assistant("d"), "u2").await.unwrap();

        let mut owned = store.list_sessions_by_user_id("u1").await.unwrap();
        owned.sort();
        assert_eq!(owned, vec!["s1".to_string()]);
    }

    #[tokio::test]
    async fn session_owner_is_first_messages_author() {
        let store = InMemoryMemoryStore::default();
        store.add_message("s1", Message::user("a"), "u1").await.unwrap();
        store.add_message("s1", Message::assistant("b"), "u2").await.unwrap();
        assert_eq!(store.get_session_owner("s1").await.unwrap(), "u1");
    }

    #[tokio::test]
    async fn session_owner_defaults_to_anonymous() {
        let store = InMemoryMemoryStore::default();
        assert_eq!(store.get_session_owner("nope").await.unwrap(), "anonymous");
    }

    #[tokio::test]
    async fn remove_clears_session() {
        let store = InMemoryMemoryStore::default();
        store.add_message("s1", Message::user("a"), "u1").await.unwrap();
        store.remove("s1").await.unwrap();
        assert!(store.get("s1").await.unwrap().is_empty());
    }
}
