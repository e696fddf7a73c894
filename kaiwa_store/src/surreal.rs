use async_trait::async_trait;
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::{info, warn};

use kaiwa_config::StoreConfig;
use kaiwa_core::{ChatMessage, ConversationStore, StoreError};

const CONVERSATION_TABLE: &str = "conversations";

/// SurrealDB-backed [`ConversationStore`].
///
/// Reads are fail-open: any backing failure or malformed stored value
/// degrades to an empty history so the conversation continues without
/// memory instead of blocking the user. Writes are fail-closed.
pub struct SurrealStore {
    db: Surreal<Client>,
    max_pairs: usize,
}

impl SurrealStore {
    /// Connect, authenticate, and select the configured namespace/database.
    ///
    /// An unreachable store here is a fatal startup condition for the
    /// caller; per-turn operations never propagate read failures.
    pub async fn connect(config: &StoreConfig, max_pairs: usize) -> Result<Self, StoreError> {
        let db = Surreal::new::<Ws>(config.url.as_str())
            .await
            .map_err(|e| StoreError::Backend(format!("failed to connect to store: {e}")))?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            db.signin(Root { username, password })
                .await
                .map_err(|e| StoreError::Backend(format!("store authentication failed: {e}")))?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| StoreError::Backend(format!("failed to select database: {e}")))?;

        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connected to conversation store"
        );

        Ok(Self { db, max_pairs })
    }

    const fn cap(&self) -> usize {
        self.max_pairs * 2
    }
}

/// Marker for a stored `messages` value that is not a well-formed sequence
/// of role-tagged entries.
#[derive(Debug, PartialEq, Eq)]
struct MalformedHistory;

/// Decode the `messages` field of a stored user document.
///
/// `Ok(vec)` for a well-formed (or absent) field; `Err(MalformedHistory)`
/// when the stored value cannot be validated, in which case the caller
/// self-heals by resetting the field.
fn decode_messages(
    document: Option<&serde_json::Value>,
) -> Result<Vec<ChatMessage>, MalformedHistory> {
    let Some(doc) = document else {
        return Ok(Vec::new());
    };
    match doc.get("messages") {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone()).map_err(|_| MalformedHistory),
    }
}

fn tail(messages: Vec<ChatMessage>, cap: usize) -> Vec<ChatMessage> {
    let start = messages.len().saturating_sub(cap);
    messages[start..].to_vec()
}

#[async_trait]
impl ConversationStore for SurrealStore {
    async fn fetch(&self, user_id: &str) -> Vec<ChatMessage> {
        let document: Option<serde_json::Value> =
            match self.db.select((CONVERSATION_TABLE, user_id)).await {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(user_id, "Store read failed, continuing without history: {e}");
                    return Vec::new();
                }
            };

        match decode_messages(document.as_ref()) {
            Ok(messages) => tail(messages, self.cap()),
            Err(MalformedHistory) => {
                // Corrupt history field: reset it so the next turn starts clean.
                warn!(user_id, "Stored history is malformed, resetting to empty");
                if let Err(e) = self.reset(user_id).await {
                    warn!(user_id, "Failed to self-heal malformed history: {e}");
                }
                Vec::new()
            }
        }
    }

    async fn persist(&self, user_id: &str, history: &[ChatMessage]) -> Result<(), StoreError> {
        let limited = tail(history.to_vec(), self.cap());
        let payload =
            serde_json::to_value(&limited).map_err(|e| StoreError::Encode(e.to_string()))?;

        let _: Option<serde_json::Value> = self
            .db
            .upsert((CONVERSATION_TABLE, user_id))
            .merge(json!({ "messages": payload }))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn reset(&self, user_id: &str) -> Result<(), StoreError> {
        // MERGE keeps the document and its unrelated fields alive.
        let _: Option<serde_json::Value> = self
            .db
            .upsert((CONVERSATION_TABLE, user_id))
            .merge(json!({ "messages": [] }))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaiwa_core::Role;

    #[test]
    fn missing_document_decodes_to_empty() {
        assert_eq!(decode_messages(None), Ok(Vec::new()));
    }

    #[test]
    fn document_without_messages_field_decodes_to_empty() {
        let doc = json!({ "nickname": "taro" });
        assert_eq!(decode_messages(Some(&doc)), Ok(Vec::new()));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn well_formed_messages_decode() {
        let doc = json!({
            "messages": [
                { "role": "user", "content": "こんにちは" },
                { "role": "assistant", "content": "こんにちは！" },
            ],
            "nickname": "taro",
        });

        let messages = decode_messages(Some(&doc)).expect("Failed to decode messages");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn non_sequence_messages_field_is_malformed() {
        let doc = json!({ "messages": "oops" });
        assert!(decode_messages(Some(&doc)).is_err());
    }

    #[test]
    fn entry_with_unknown_role_is_malformed() {
        let doc = json!({ "messages": [{ "role": "wizard", "content": "hi" }] });
        assert!(decode_messages(Some(&doc)).is_err());
    }

    #[test]
    fn tail_keeps_most_recent_entries() {
        let messages: Vec<ChatMessage> = (0..7)
            .map(|i| ChatMessage::new(Role::User, format!("m{i}")))
            .collect();

        let kept = tail(messages, 4);
        assert_eq!(kept.len(), 4);
        assert_eq!(kept[0].content, "m3");
        assert_eq!(kept[3].content, "m6");
    }
}
