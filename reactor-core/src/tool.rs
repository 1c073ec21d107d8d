//! Tool specifications, calls, and results that cross the engine/tool boundary.

use crate::duration::DurationMs;
use serde::{Deserialize, Serialize};

/// Declares one invocable tool: its name, how to describe it to a model,
/// and the JSON Schema its arguments must satisfy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique name within a single request's exposed tool set.
    pub name: String,
    /// Free-text description, also used by keyword/semantic selection.
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub input_schema: serde_json::Value,
    /// Per-tool timeout override; falls back to the engine default.
    pub timeout: Option<DurationMs>,
    /// Coarse category tag, used by the keyword selection strategy.
    pub category: Option<String>,
    /// Whether invoking this tool requires human approval.
    pub requires_approval: bool,
}

impl ToolSpec {
    /// Construct a minimal tool spec with no timeout/category overrides.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            timeout: None,
            category: None,
            requires_approval: false,
        }
    }
}

/// A single tool invocation requested by the model within one assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque id issued by the model; echoed back in the paired `ToolResult`.
    pub id: String,
    /// Name of the tool to invoke.
    pub tool_name: String,
    /// Arguments, validated by the tool implementation against its schema.
    pub arguments: serde_json::Value,
    /// Position within the assistant turn that requested it.
    pub index: usize,
}

/// The outcome of executing one `ToolCall`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Echoes the originating `ToolCall::id`.
    pub id: String,
    /// Stringified tool output (or error detail, when `success` is false).
    pub output: String,
    /// Whether the tool call completed without error.
    pub success: bool,
    /// Error message, truncated to 500 characters, when `success` is false.
    pub error_message: Option<String>,
    /// Wall time spent inside the tool call.
    pub duration: DurationMs,
}

impl ToolResult {
    /// Maximum length retained for a tool's error message.
    pub const ERROR_MESSAGE_LIMIT: usize = 500;

    /// Construct a successful result.
    pub fn ok(id: impl Into<String>, output: impl Into<String>, duration: DurationMs) -> Self {
        Self {
            id: id.into(),
            output: output.into(),
            success: true,
            error_message: None,
            duration,
        }
    }

    /// Construct a failed result, truncating the error message to the
    /// recorded-error limit.
    pub fn error(id: impl Into<String>, message: impl Into<String>, duration: DurationMs) -> Self {
        let message = message.into();
        let truncated = truncate(&message, Self::ERROR_MESSAGE_LIMIT);
        Self {
            id: id.into(),
            output: format!("Error: {truncated}"),
            success: false,
            error_message: Some(truncated),
            duration,
        }
    }
}

/// Truncate `s` to at most `limit` bytes on a UTF-8 boundary.
pub(crate) fn truncate(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        return s.to_string();
    }
    let mut end = limit;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
