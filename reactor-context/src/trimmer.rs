//! Trims stable conversation history to a maximum turn count.
//!
//! Unlike [`crate::sliding_window::SlidingWindow`] and the other
//! [`reactor_turn::context::ContextStrategy`] implementations, which operate
//! on a single provider call's message list, the trimmer operates on the
//! persisted [`reactor_core::message::Message`] history kept by a
//! `MemoryStore` across turns.

use reactor_core::message::{Message, Role};

/// Keeps at most the most recent `max_conversation_turns * 2` messages
/// (one user + one assistant message per turn, approximately), without ever
/// separating a `Role::Tool` message from the `Role::Assistant` message
/// whose tool call it answers.
pub struct MessageTrimmer {
    max_conversation_turns: usize,
}

impl MessageTrimmer {
    /// Creates a trimmer that keeps roughly `max_conversation_turns` turns.
    pub fn new(max_conversation_turns: usize) -> Self {
        Self {
            max_conversation_turns,
        }
    }

    /// Trims `messages` down to the configured window, preserving
    /// assistant/tool pairing.
    pub fn trim(&self, messages: Vec<Message>) -> Vec<Message> {
        let keep = self.max_conversation_turns.saturating_mul(2);
        if messages.len() <= keep {
            return messages;
        }

        let mut start = messages.len() - keep;
        while start > 0 && messages[start].role == Role::Tool {
            start -= 1;
        }

        messages[start..].to_vec()
    }
}
