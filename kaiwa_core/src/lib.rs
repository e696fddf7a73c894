#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of user/assistant pairs kept per conversation.
///
/// The stored history is bounded to `2 * pairs` messages.
pub const DEFAULT_MAX_HISTORY_PAIRS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Failure taxonomy for the completion API.
///
/// Every variant maps to a localized, user-facing fallback string via
/// [`CompletionError::user_message`]; a raw transport error is never relayed
/// to the chat platform.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion API rejected the configured credentials")]
    Auth,

    #[error("completion API rate limit reached")]
    RateLimited,

    #[error("completion API upstream error (status {0})")]
    Upstream(u16),

    #[error("completion request failed: {0}")]
    Other(String),
}

impl CompletionError {
    /// Localized apology text that stands in for the real reply.
    ///
    /// Always non-empty, so the caller has something to relay.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth => "AIサービスの認証に失敗しました。設定を確認してください。".to_string(),
            Self::RateLimited => {
                "AIサービスの利用制限に達しました。しばらくしてからお試しください。".to_string()
            }
            Self::Upstream(status) => {
                format!("AIサービスでエラーが発生しました (エラーコード: {status})。")
            }
            Self::Other(_) => {
                "申し訳ありません、AIの応答生成中に予期せぬエラーが発生しました。".to_string()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store error: {0}")]
    Backend(String),

    #[error("failed to encode history: {0}")]
    Encode(String),
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<LLMResponse, CompletionError>;
}

#[async_trait]
impl<T: LLMProvider + ?Sized> LLMProvider for std::sync::Arc<T> {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<LLMResponse, CompletionError> {
        (**self).chat(messages).await
    }
}

/// Durable per-user conversation log, keyed by the platform user id.
///
/// `fetch` is fail-open (a backing failure degrades to an empty history);
/// `persist` and `reset` are fail-closed and surface backing failures.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Stored history truncated to the most recent `2 * max_pairs` entries.
    ///
    /// Returns an empty vec when no document exists, the stored value is
    /// malformed, or the backing store fails.
    async fn fetch(&self, user_id: &str) -> Vec<ChatMessage>;

    /// Write `history` (truncated to the bound) into the user document,
    /// leaving unrelated sibling fields untouched.
    async fn persist(&self, user_id: &str, history: &[ChatMessage]) -> Result<(), StoreError>;

    /// Set the history field to an empty sequence; the document survives.
    async fn reset(&self, user_id: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: ConversationStore + ?Sized> ConversationStore for std::sync::Arc<T> {
    async fn fetch(&self, user_id: &str) -> Vec<ChatMessage> {
        (**self).fetch(user_id).await
    }

    async fn persist(&self, user_id: &str, history: &[ChatMessage]) -> Result<(), StoreError> {
        (**self).persist(user_id, history).await
    }

    async fn reset(&self, user_id: &str) -> Result<(), StoreError> {
        (**self).reset(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn role_serializes_lowercase() {
        let msg = ChatMessage::new(Role::Assistant, "hi");
        let json = serde_json::to_string(&msg).expect("Failed to serialize message");
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn role_round_trips() {
        let parsed: ChatMessage = serde_json::from_str(r#"{"role":"user","content":"こんにちは"}"#)
            .expect("Failed to deserialize message");
        assert_eq!(parsed.role, Role::User);
        assert_eq!(parsed.content, "こんにちは");
    }

    #[test]
    fn every_completion_error_has_nonempty_user_message() {
        let errors = [
            CompletionError::Auth,
            CompletionError::RateLimited,
            CompletionError::Upstream(502),
            CompletionError::Other("boom".to_string()),
        ];
        for e in errors {
            assert!(!e.user_message().is_empty());
        }
    }

    #[test]
    fn upstream_message_embeds_status_code() {
        assert!(CompletionError::Upstream(503).user_message().contains("503"));
    }
}
