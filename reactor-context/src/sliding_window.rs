//! Sliding-window context compaction: drop oldest messages first.

use crate::counter::TokenCounter;
use reactor_turn::context::ContextStrategy;
use reactor_turn::types::ProviderMessage;

/// Drops the oldest messages when context exceeds a limit, keeping the
/// first message (typically the initial user message) and as much of the
/// recent tail as fits half the original token budget.
pub struct SlidingWindow {
    counter: TokenCounter,
}

impl SlidingWindow {
    /// Create a new sliding window strategy with the default [`TokenCounter`].
    pub fn new() -> Self {
        Self {
            counter: TokenCounter::new(),
        }
    }

    /// Create a sliding window strategy backed by a custom [`TokenCounter`].
    pub fn with_counter(counter: TokenCounter) -> Self {
        Self { counter }
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStrategy for SlidingWindow {
    fn token_estimate(&self, messages: &[ProviderMessage]) -> usize {
        self.counter.estimate_messages(messages)
    }

    fn should_compact(&self, messages: &[ProviderMessage], limit: usize) -> bool {
        self.token_estimate(messages) > limit
    }

    fn compact(&self, messages: Vec<ProviderMessage>) -> Vec<ProviderMessage> {
        if messages.len() <= 2 {
            return messages;
        }

        let first = messages[0].clone();
        let rest = &messages[1..];

        // Work backwards, accumulating messages until we hit roughly half
        // the original size (heuristic: keep recent context, drop old).
        let total_tokens = self.counter.estimate_messages(&messages);
        let target = total_tokens / 2;

        let mut kept = Vec::new();
        let mut current_tokens = self.counter.estimate_message(&first);

        for msg in rest.iter().rev() {
            let msg_tokens = self.counter.estimate_message(msg);
            if current_tokens + msg_tokens > target && !kept.is_empty() {
                break;
            }
            kept.push(msg.clone());
            current_tokens += msg_tokens;
        }

        kept.reverse();
        let mut result = vec![first];
        result.extend(kept);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactor_turn::types::{ContentPart, Role};

    fn text_message(role: Role, text: &str) -> ProviderMessage {
        ProviderMessage {
            role,
            content: vec![ContentPart::Text {
                text: text.to_string(),
            }],
        }
    }

    #[test]
    fn sliding_window_estimates_tokens() {
        let sw = SlidingWindow::new();
        let messages = vec![text_message(Role::User, &"a".repeat(400))];
        assert_eq!(sw.token_estimate(&messages), 104); // 400/4 + 4 overhead
    }

    #[test]
    fn sliding_window_should_compact() {
        let sw = SlidingWindow::new();
        let messages = vec![text_message(Role::User, &"a".repeat(400))];
        assert!(sw.should_compact(&messages, 50));
        assert!(!sw.should_compact(&messages, 200));
    }

    #[test]
    fn sliding_window_compact_preserves_first_and_recent() {
        let sw = SlidingWindow::new();
        let messages = vec![
            text_message(Role::User, &"first ".repeat(100)),
            text_message(Role::Assistant, &"old ".repeat(100)),
            text_message(Role::User, &"middle ".repeat(100)),
            text_message(Role::Assistant, &"recent ".repeat(100)),
            text_message(Role::User, &"latest ".repeat(100)),
        ];

        let compacted = sw.compact(messages.clone());

        assert_eq!(compacted[0].role, Role::User);
        assert_eq!(compacted[0].content[0], messages[0].content[0]);
        assert!(compacted.len() < messages.len());
        assert!(compacted.len() >= 2);
        assert_eq!(
            compacted.last().unwrap().content[0],
            messages.last().unwrap().content[0]
        );
    }

    #[test]
    fn sliding_window_short_messages_unchanged() {
        let sw = SlidingWindow::new();
        let messages = vec![
            text_message(Role::User, "hi"),
            text_message(Role::Assistant, "hello"),
        ];

        let compacted = sw.compact(messages.clone());
        assert_eq!(compacted.len(), messages.len());
    }

    #[test]
    fn sliding_window_single_message_unchanged() {
        let sw = SlidingWindow::new();
        let messages = vec![text_message(Role::User, "hi")];
        let compacted = sw.compact(messages.clone());
        assert_eq!(compacted.len(), 1);
    }

    #[test]
    fn sliding_window_cjk_text_estimates_more_tokens_than_chars_suggest() {
        let sw = SlidingWindow::new();
        let messages = vec![text_message(Role::User, &"文".repeat(100))];
        // Under a flat 4-chars/token estimate this would be 25; CJK density
        // awareness should push it much higher.
        assert!(sw.token_estimate(&messages) > 50);
    }
}
