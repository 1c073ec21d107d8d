//! Conversions between the stable conversation history
//! (`reactor_core::message`) and one provider call's wire shape
//! (`reactor_turn::types`).
//!
//! `reactor_turn::types::Role` has no `Tool` variant — providers in the
//! Anthropic mold fold tool results into a user-role message carrying a
//! `ContentPart::ToolResult` block. [`history_to_provider_messages`] applies
//! that folding; nothing downstream needs to know the stable history ever
//! had a distinct tool role.

use reactor_core::message::{Message, Role as CoreRole};
use reactor_core::tool::ToolSpec;
use reactor_turn::types::{ContentPart, ProviderMessage, Role as TurnRole, ToolSchema};

/// Convert a stable message history into one provider call's message list.
///
/// `Role::System` messages are dropped — callers pass the system prompt via
/// `ProviderRequest::system` instead, matching how every supported provider
/// treats the system role as out-of-band.
pub fn history_to_provider_messages(messages: &[Message]) -> Vec<ProviderMessage> {
    messages
        .iter()
        .filter_map(message_to_provider_message)
        .collect()
}

fn message_to_provider_message(message: &Message) -> Option<ProviderMessage> {
    match message.role {
        CoreRole::System => None,
        CoreRole::User => Some(ProviderMessage {
            role: TurnRole::User,
            content: vec![ContentPart::Text {
                text: message.content.clone(),
            }],
        }),
        CoreRole::Assistant => Some(assistant_to_provider_message(message)),
        CoreRole::Tool => Some(ProviderMessage {
            role: TurnRole::User,
            content: vec![ContentPart::ToolResult {
                tool_use_id: message.tool_call_id.clone().unwrap_or_default(),
                content: message.content.clone(),
                is_error: false,
            }],
        }),
    }
}

fn assistant_to_provider_message(message: &Message) -> ProviderMessage {
    let mut content = Vec::new();
    if !message.content.is_empty() {
        content.push(ContentPart::Text {
            text: message.content.clone(),
        });
    }
    if let Some(calls) = &message.tool_calls {
        for call in calls {
            content.push(ContentPart::ToolUse {
                id: call.id.clone(),
                name: call.tool_name.clone(),
                input: call.arguments.clone(),
            });
        }
    }
    if content.is_empty() {
        content.push(ContentPart::Text {
            text: String::new(),
        });
    }
    ProviderMessage {
        role: TurnRole::Assistant,
        content,
    }
}

/// Convert a registry tool spec into the wire schema a `ProviderRequest`
/// carries.
pub fn tool_spec_to_schema(spec: &ToolSpec) -> ToolSchema {
    ToolSchema {
        name: spec.name.clone(),
        description: spec.description.clone(),
        input_schema: spec.input_schema.clone(),
    }
}
