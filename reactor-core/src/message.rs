//! Conversation messages and roles.

use crate::tool::ToolCall;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// The role a message was authored under.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// A system/instruction message.
    System,
    /// A message authored by the end user.
    User,
    /// A message authored by the model.
    Assistant,
    /// A tool result message, always paired with an assistant tool call.
    Tool,
}

/// One turn in a conversation.
///
/// Ordering within a session is semantically significant: once trimmed,
/// USER and ASSISTANT messages alternate, and a TOOL message always
/// immediately follows the ASSISTANT message whose tool call it answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who authored this message.
    pub role: Role,
    /// The message body.
    pub content: String,
    /// When the message was recorded.
    #[serde(with = "time_serde")]
    pub timestamp: SystemTime,
    /// For `Role::Tool` messages, the id of the tool call being answered.
    pub tool_call_id: Option<String>,
    /// For `Role::Assistant` messages, any outstanding tool calls the model
    /// requested in this turn.
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    /// Construct a plain user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: SystemTime::now(),
            tool_call_id: None,
            tool_calls: None,
        }
    }

    /// Construct a plain assistant message with no tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: SystemTime::now(),
            tool_call_id: None,
            tool_calls: None,
        }
    }

    /// Construct an assistant message that also requests tool calls.
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: SystemTime::now(),
            tool_call_id: None,
            tool_calls: Some(tool_calls),
        }
    }

    /// Construct a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            timestamp: SystemTime::now(),
            tool_call_id: None,
            tool_calls: None,
        }
    }

    /// Construct a tool-result message answering `tool_call_id`.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            timestamp: SystemTime::now(),
            tool_call_id: Some(tool_call_id.into()),
            tool_calls: None,
        }
    }

    /// Whether this assistant message carries outstanding tool calls.
    pub fn has_tool_calls(&self) -> bool {
        matches!(&self.tool_calls, Some(calls) if !calls.is_empty())
    }
}

mod time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S: Serializer>(t: &SystemTime, s: S) -> Result<S::Ok, S::Error> {
        let millis = t
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        millis.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SystemTime, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(UNIX_EPOCH + Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_with_tool_calls_reports_has_tool_calls() {
        let msg = Message::assistant_with_tool_calls(
            "",
            vec![ToolCall {
                id: "t1".into(),
                tool_name: "search".into(),
                arguments: serde_json::json!({}),
                index: 0,
            }],
        );
        assert!(msg.has_tool_calls());
    }

    #[test]
    fn plain_assistant_has_no_tool_calls() {
        assert!(!Message::assistant("hi").has_tool_calls());
    }

    #[test]
    fn round_trips_through_json() {
        let msg = Message::tool("abc", "result");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tool_call_id.as_deref(), Some("abc"));
        assert_eq!(back.content, "result");
    }
}
