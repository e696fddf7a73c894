//! Turn engine: one inbound message in, exactly one reply text out.
//!
//! Two paths per message. The reset path clears stored history and answers
//! with a fixed confirmation; the conversation path runs
//! fetch → append user turn → complete → append assistant turn → persist.
//! Failed or empty generations reply with fallback text and skip the
//! persist, leaving the stored history exactly as it was before the turn.

use tracing::{debug, error, info, warn};

use kaiwa_core::{ChatMessage, ConversationStore, DEFAULT_MAX_HISTORY_PAIRS, LLMProvider, Role};

use crate::history::{HistoryWindow, is_reset_command};

/// Confirmation sent after the reset command.
pub const RESET_CONFIRMATION: &str = "会話履歴をリセットしました。新しい会話を始めましょう！";

/// Reply when the completion API returned an unusable (empty) string.
pub const EMPTY_REPLY_FALLBACK: &str = "申し訳ありません、現在応答を生成できません。";

/// Per-engine settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// System instruction prepended to every completion request.
    pub system_prompt: String,
    /// Localized command that clears history instead of conversing.
    pub reset_keyword: String,
    /// History bound: at most `2 * max_history_pairs` stored entries.
    pub max_history_pairs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            system_prompt:
                "あなたは親切なAIアシスタントです。ユーザーの質問に答えたり、会話を楽しんだりします。"
                    .to_string(),
            reset_keyword: "リセット".to_string(),
            max_history_pairs: DEFAULT_MAX_HISTORY_PAIRS,
        }
    }
}

/// Orchestrates one conversation turn over a store and a provider.
///
/// Owns the in-memory working copy of the history for exactly one turn;
/// nothing is cached across calls.
pub struct TurnEngine<P, S>
where
    P: LLMProvider,
    S: ConversationStore,
{
    provider: P,
    store: S,
    config: EngineConfig,
    window: HistoryWindow,
}

impl<P, S> TurnEngine<P, S>
where
    P: LLMProvider,
    S: ConversationStore,
{
    #[must_use]
    pub const fn new(provider: P, store: S, config: EngineConfig) -> Self {
        let window = HistoryWindow::new(config.max_history_pairs);
        Self {
            provider,
            store,
            config,
            window,
        }
    }

    /// Process one inbound text message and return the reply to relay.
    ///
    /// Always returns a non-empty string; per-turn failures degrade to
    /// localized fallback text instead of propagating.
    pub async fn handle_message(&self, user_id: &str, text: &str) -> String {
        if is_reset_command(text, &self.config.reset_keyword) {
            return self.handle_reset(user_id).await;
        }
        self.handle_conversation(user_id, text).await
    }

    async fn handle_reset(&self, user_id: &str) -> String {
        info!(user_id, "Reset command received");

        // Best-effort: a failed reset still gets the confirmation reply.
        if let Err(e) = self.store.reset(user_id).await {
            error!(user_id, "Failed to reset conversation history: {e}");
        }

        RESET_CONFIRMATION.to_string()
    }

    async fn handle_conversation(&self, user_id: &str, text: &str) -> String {
        let mut history = self.store.fetch(user_id).await;
        self.window.append(&mut history, Role::User, text);

        let prompt = self.build_prompt(&history);

        match self.provider.chat(&prompt).await {
            Ok(response) if !response.content.trim().is_empty() => {
                let reply = response.content;
                self.window
                    .append(&mut history, Role::Assistant, reply.clone());

                // Write failure loses this turn's memory but must not eat
                // the reply the user is already owed.
                if let Err(e) = self.store.persist(user_id, &history).await {
                    error!(user_id, "Failed to persist conversation history: {e}");
                }

                debug!(user_id, turns = history.len(), "Turn completed");
                reply
            }
            Ok(_) => {
                // Unusable generation: the user turn is not recorded.
                warn!(user_id, "Completion returned an empty reply, skipping persist");
                EMPTY_REPLY_FALLBACK.to_string()
            }
            Err(e) => {
                warn!(user_id, "Completion failed, skipping persist: {e}");
                e.user_message()
            }
        }
    }

    fn build_prompt(&self, history: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut prompt = Vec::with_capacity(history.len() + 1);
        prompt.push(ChatMessage::new(
            Role::System,
            self.config.system_prompt.clone(),
        ));
        prompt.extend(history.iter().cloned());
        prompt
    }
}
