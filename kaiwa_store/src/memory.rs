use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use kaiwa_core::{ChatMessage, ConversationStore, StoreError};

/// In-memory [`ConversationStore`].
///
/// Backs local development and tests; state is lost on restart. Applies
/// the same tail-truncation bound as the durable store.
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, Vec<ChatMessage>>>,
    max_pairs: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new(max_pairs: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_pairs,
        }
    }

    /// Number of users with a stored history entry.
    pub async fn user_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    const fn cap(&self) -> usize {
        self.max_pairs * 2
    }

    fn tail(&self, messages: &[ChatMessage]) -> Vec<ChatMessage> {
        let start = messages.len().saturating_sub(self.cap());
        messages[start..].to_vec()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn fetch(&self, user_id: &str) -> Vec<ChatMessage> {
        let sessions = self.sessions.read().await;
        sessions
            .get(user_id)
            .map_or_else(Vec::new, |messages| self.tail(messages))
    }

    async fn persist(&self, user_id: &str, history: &[ChatMessage]) -> Result<(), StoreError> {
        let limited = self.tail(history);
        let mut sessions = self.sessions.write().await;
        sessions.insert(user_id.to_string(), limited);
        Ok(())
    }

    async fn reset(&self, user_id: &str) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(user_id.to_string(), Vec::new());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaiwa_core::Role;

    fn message(i: usize) -> ChatMessage {
        let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
        ChatMessage::new(role, format!("Message {i}"))
    }

    #[tokio::test]
    async fn fetch_unknown_user_is_empty() {
        let store = MemoryStore::new(10);
        assert!(store.fetch("U-missing").await.is_empty());
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn persist_truncates_to_last_two_times_max_pairs() {
        let store = MemoryStore::new(2);
        let history: Vec<ChatMessage> = (0..9).map(message).collect();

        store
            .persist("U1", &history)
            .await
            .expect("Failed to persist");

        let fetched = store.fetch("U1").await;
        assert_eq!(fetched.len(), 4);
        // Oldest entries dropped first.
        assert_eq!(fetched[0].content, "Message 5");
        assert_eq!(fetched[3].content, "Message 8");
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn reset_then_fetch_is_empty_for_any_prior_state() {
        let store = MemoryStore::new(10);
        let history: Vec<ChatMessage> = (0..6).map(message).collect();
        store
            .persist("U1", &history)
            .await
            .expect("Failed to persist");

        store.reset("U1").await.expect("Failed to reset");

        assert!(store.fetch("U1").await.is_empty());
        // The entry itself survives the reset.
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn reset_before_any_write_creates_empty_entry() {
        let store = MemoryStore::new(10);
        store.reset("U-new").await.expect("Failed to reset");
        assert!(store.fetch("U-new").await.is_empty());
    }
}
