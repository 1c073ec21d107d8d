//! Context compaction that clears stale tool results rather than dropping
//! whole messages.

use crate::counter::TokenCounter;
use reactor_turn::context::ContextStrategy;
use reactor_turn::types::{ContentPart, ProviderMessage};

/// Replaces old tool result content with a placeholder to reduce token
/// usage while keeping the conversation's shape intact.
///
/// Keeps the most recent `keep_recent_n` tool results untouched and replaces
/// older ones with `[tool result cleared]`, preserving `tool_use_id` so the
/// conversation still makes semantic sense to the model.
pub struct ToolResultClearing {
    keep_recent_n: usize,
    counter: TokenCounter,
}

impl ToolResultClearing {
    /// Create a new strategy keeping the most recent `keep_recent_n` tool
    /// results untouched.
    pub fn new(keep_recent_n: usize) -> Self {
        Self {
            keep_recent_n,
            counter: TokenCounter::new(),
        }
    }

    /// Create with a custom [`TokenCounter`].
    pub fn with_counter(keep_recent_n: usize, counter: TokenCounter) -> Self {
        Self {
            keep_recent_n,
            counter,
        }
    }
}

impl ContextStrategy for ToolResultClearing {
    fn token_estimate(&self, messages: &[ProviderMessage]) -> usize {
        self.counter.estimate_messages(messages)
    }

    fn should_compact(&self, messages: &[ProviderMessage], limit: usize) -> bool {
        self.token_estimate(messages) > limit
    }

    fn compact(&self, mut messages: Vec<ProviderMessage>) -> Vec<ProviderMessage> {
        let mut tool_result_positions: Vec<(usize, usize)> = Vec::new();
        for (msg_idx, msg) in messages.iter().enumerate() {
            for (part_idx, part) in msg.content.iter().enumerate() {
                if matches!(part, ContentPart::ToolResult { .. }) {
                    tool_result_positions.push((msg_idx, part_idx));
                }
            }
        }

        let total = tool_result_positions.len();
        let to_clear_count = total.saturating_sub(self.keep_recent_n);
        if to_clear_count == 0 {
            return messages;
        }

        for &(msg_idx, part_idx) in &tool_result_positions[..to_clear_count] {
            if let ContentPart::ToolResult { content, is_error, .. } =
                &mut messages[msg_idx].content[part_idx]
            {
                *content = "[tool result cleared]".to_string();
                *is_error = false;
            }
        }

        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactor_turn::types::Role;

    fn tool_result(id: &str, content: &str) -> ProviderMessage {
        ProviderMessage {
            role: Role::User,
            content: vec![ContentPart::ToolResult {
                tool_use_id: id.into(),
                content: content.into(),
                is_error: false,
            }],
        }
    }

    #[test]
    fn clears_all_but_most_recent_n() {
        let strategy = ToolResultClearing::new(1);
        let messages = vec![
            tool_result("t1", "first result"),
            tool_result("t2", "second result"),
            tool_result("t3", "third result"),
        ];

        let compacted = strategy.compact(messages);
        let ContentPart::ToolResult { content, .. } = &compacted[0].content[0] else {
            unreachable!()
        };
        assert_eq!(content, "[tool result cleared]");
        let ContentPart::ToolResult { content, .. } = &compacted[1].content[0] else {
            unreachable!()
        };
        assert_eq!(content, "[tool result cleared]");
        let ContentPart::ToolResult { content, .. } = &compacted[2].content[0] else {
            unreachable!()
        };
        assert_eq!(content, "third result");
    }

    #[test]
    fn keeps_tool_use_id_after_clearing() {
        let strategy = ToolResultClearing::new(0);
        let messages = vec![tool_result("t1", "result")];
        let compacted = strategy.compact(messages);
        let ContentPart::ToolResult { tool_use_id, .. } = &compacted[0].content[0] else {
            unreachable!()
        };
        assert_eq!(tool_use_id, "t1");
    }

    #[test]
    fn no_clearing_needed_when_under_keep_count() {
        let strategy = ToolResultClearing::new(5);
        let messages = vec![tool_result("t1", "result")];
        let compacted = strategy.compact(messages.clone());
        assert_eq!(compacted, messages);
    }

    #[test]
    fn non_tool_result_messages_are_untouched() {
        let strategy = ToolResultClearing::new(0);
        let messages = vec![ProviderMessage {
            role: Role::User,
            content: vec![ContentPart::Text { text: "hi".into() }],
        }];
        let compacted = strategy.compact(messages.clone());
        assert_eq!(compacted, messages);
    }
}
