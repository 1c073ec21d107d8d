//! The engine's inbound request type.

use crate::duration::DurationMs;
use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How the terminal assistant response should be shaped.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseFormat {
    /// Free-form text, the default.
    Text,
    /// Must parse as JSON, optionally validated against `response_schema`.
    Json,
    /// Must parse as YAML.
    Yaml,
}

impl Default for ResponseFormat {
    fn default() -> Self {
        ResponseFormat::Text
    }
}

/// A media attachment carried alongside a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAttachment {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Raw bytes, typically base64-encoded on the wire.
    pub data: Vec<u8>,
    /// Optional display name.
    pub name: Option<String>,
}

/// One request to the Agent Execution Engine.
///
/// Immutable for the duration of its execution: the engine never mutates
/// a command it's given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCommand {
    /// System/instruction prompt.
    pub system_prompt: String,
    /// The user's prompt text.
    pub user_prompt: String,
    /// Override the configured default model for this request.
    pub model: Option<String>,
    /// Free-form metadata. Recognized keys: `user_id`, `session_id`,
    /// `channel`, `tenant_id`.
    pub metadata: HashMap<String, String>,
    /// Override the configured `max_tool_calls` for this request.
    pub max_tool_calls: Option<u32>,
    /// Desired shape of the terminal response.
    pub response_format: ResponseFormat,
    /// JSON Schema the response must satisfy, when `response_format` is
    /// `Json`.
    pub response_schema: Option<String>,
    /// Media attachments alongside the prompt.
    pub media: Vec<MediaAttachment>,
    /// Verbatim conversation history supplied by the caller. When present,
    /// the Conversation Manager uses it as-is instead of loading from a
    /// memory store.
    pub conversation_history: Option<Vec<Message>>,
}

impl AgentCommand {
    /// Construct the minimal command: a system prompt and a user prompt.
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            model: None,
            metadata: HashMap::new(),
            max_tool_calls: None,
            response_format: ResponseFormat::Text,
            response_schema: None,
            media: Vec::new(),
            conversation_history: None,
        }
    }

    /// Attach a metadata key/value pair, builder-style.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Read the `session_id` metadata key, if present.
    pub fn session_id(&self) -> Option<&str> {
        self.metadata.get("session_id").map(String::as_str)
    }

    /// Read the `user_id` metadata key, if present.
    pub fn user_id(&self) -> Option<&str> {
        self.metadata.get("user_id").map(String::as_str)
    }

    /// Read the `tenant_id` metadata key, if present.
    pub fn tenant_id(&self) -> Option<&str> {
        self.metadata.get("tenant_id").map(String::as_str)
    }

    /// Read the `channel` metadata key, if present.
    pub fn channel(&self) -> Option<&str> {
        self.metadata.get("channel").map(String::as_str)
    }

    /// Whether this command requests a streamed execution with an
    /// incompatible response format (streaming only supports TEXT).
    pub fn streaming_incompatible_with_format(&self) -> bool {
        !matches!(self.response_format, ResponseFormat::Text)
    }
}

/// A request-level timeout budget, carried separately from `AgentCommand`
/// so adapters can override it per call without mutating the command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RequestTimeout(pub DurationMs);
