//! Bounded history window and reset-command detection.
//!
//! Pure logic: no IO, no clocks. The window keeps the most recent
//! `2 * max_pairs` entries and always drops from the front (oldest first).

use kaiwa_core::{ChatMessage, Role};

/// Sliding window over a conversation history.
#[derive(Debug, Clone, Copy)]
pub struct HistoryWindow {
    max_pairs: usize,
}

impl HistoryWindow {
    #[must_use]
    pub const fn new(max_pairs: usize) -> Self {
        Self { max_pairs }
    }

    /// Maximum number of entries the window retains.
    #[must_use]
    pub const fn max_entries(&self) -> usize {
        self.max_pairs * 2
    }

    /// Drop the oldest entries until the history fits the window.
    pub fn truncate(&self, messages: &mut Vec<ChatMessage>) {
        let overflow = messages.len().saturating_sub(self.max_entries());
        if overflow > 0 {
            messages.drain(..overflow);
        }
    }

    /// Append one turn and re-apply the bound.
    pub fn append(&self, messages: &mut Vec<ChatMessage>, role: Role, content: impl Into<String>) {
        messages.push(ChatMessage::new(role, content));
        self.truncate(messages);
    }
}

/// Whether `text` is the reset command.
///
/// Matching is whitespace-trimmed and case-insensitive but requires
/// whole-string equality; a message merely containing the keyword does
/// not trigger a reset.
#[must_use]
pub fn is_reset_command(text: &str, keyword: &str) -> bool {
    text.trim().to_lowercase() == keyword.trim().to_lowercase()
}
