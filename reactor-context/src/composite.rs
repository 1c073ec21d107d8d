//! Chains multiple compaction strategies, applying each in turn until the
//! conversation fits the token budget.

use reactor_turn::context::ContextStrategy;
use reactor_turn::types::ProviderMessage;

/// Runs a sequence of strategies in order, re-checking the token budget
/// after each and stopping early once the conversation fits.
///
/// Unlike a fan-out composition, `Composite` is a pipeline: the output of
/// one strategy feeds the next, so a cheap strategy (e.g. clearing stale
/// tool results) can avoid ever invoking a more aggressive one (e.g.
/// dropping whole messages).
pub struct Composite {
    strategies: Vec<Box<dyn ContextStrategy>>,
}

impl Composite {
    /// Creates a composite strategy from an ordered list of strategies.
    pub fn new(strategies: Vec<Box<dyn ContextStrategy>>) -> Self {
        Self { strategies }
    }
}

impl ContextStrategy for Composite {
    fn token_estimate(&self, messages: &[ProviderMessage]) -> usize {
        self.strategies
            .first()
            .map(|s| s.token_estimate(messages))
            .unwrap_or(0)
    }

    fn should_compact(&self, messages: &[ProviderMessage], limit: usize) -> bool {
        self.strategies
            .iter()
            .any(|s| s.should_compact(messages, limit))
    }

    fn compact(&self, messages: Vec<ProviderMessage>) -> Vec<ProviderMessage> {
        let mut current = messages;
        for strategy in &self.strategies {
            current = strategy.compact(current);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sliding_window::SlidingWindow;
    use crate::tool_result_clearing::ToolResultClearing;
    use reactor_turn::types::{ContentPart, Role};

    fn text_message(role: Role, text: &str) -> ProviderMessage {
        ProviderMessage {
            role,
            content: vec![ContentPart::Text {
                text: text.to_string(),
            }],
        }
    }

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
    fn empty_strategy_list_is_identity() {
        let composite = Composite::new(vec![]);
        let messages = vec![text_message(Role::User, "hi")];
        assert_eq!(composite.compact(messages.clone()), messages);
    }

    #[test]
    fn chains_strategies_in_order() {
        let composite = Composite::new(vec![
            Box::new(ToolResultClearing::new(0)),
            Box::new(SlidingWindow::new()),
        ]);

        let messages = vec![
            tool_result("t1", &"a".repeat(2000)),
            text_message(Role::Assistant, &"b".repeat(2000)),
            text_message(Role::User, "latest"),
        ];

        let compacted = composite.compact(messages.clone());
        // the tool result should have been cleared by the first strategy
        let ContentPart::ToolResult { content, .. } = &compacted
            .iter()
            .find(|m| matches!(m.content[0], ContentPart::ToolResult { .. }))
            .map(|m| m.content[0].clone())
            .unwrap_or(ContentPart::Text { text: String::new() })
        else {
            unreachable!()
        };
        assert_eq!(content, "[tool result cleared]");
    }

    #[test]
    fn should_compact_true_if_any_strategy_says_so() {
        let composite = Composite::new(vec![Box::new(SlidingWindow::new())]);
        let messages = vec![text_message(Role::User, &"a".repeat(400))];
        assert!(composite.should_compact(&messages, 10));
    }
}
