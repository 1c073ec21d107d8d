//! Composition integration tests.
//!
//! These exercise [`reactor_engine::Engine`] wired to a scripted provider,
//! verifying the shapes described in the crate's prelude actually compose:
//! a plain text turn, tool calls round-tripping through the registry, and
//! guard rejection short-circuiting before any provider call.

use reactor::prelude::*;
use reactor_core::config::EngineConfig;
use reactor_core::tool::ToolSpec;
use reactor_memory::{InMemoryApprovalStore, InMemoryMemoryStore, InMemorySummaryStore};
use reactor_tool::{ToolError, ToolRegistry};
use reactor_turn::types::{
    ContentPart, ProviderRequest, ProviderResponse, StopReason, TokenUsage as ProviderTokenUsage,
};
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
        }
    }
}

impl Provider for ScriptedProvider {
    fn complete(
        &self,
        _request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        let response = self.responses.lock().unwrap().remove(0);
        async move { Ok(response) }
    }
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        content: vec![ContentPart::Text { text: text.into() }],
        stop_reason: StopReason::EndTurn,
        usage: ProviderTokenUsage::default(),
        model: "scripted".into(),
        cost: None,
        truncated: None,
    }
}

fn tool_use_response(id: &str, name: &str, input: Value) -> ProviderResponse {
    ProviderResponse {
        content: vec![ContentPart::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }],
        stop_reason: StopReason::ToolUse,
        usage: ProviderTokenUsage::default(),
        model: "scripted".into(),
        cost: None,
        truncated: None,
    }
}

struct Echo;

impl ToolDyn for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "echoes its input back"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"text": {"type": "string"}}})
    }

    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move { Ok(input) })
    }
}

fn stores() -> (
    Arc<InMemoryMemoryStore>,
    Arc<InMemorySummaryStore>,
    Arc<InMemoryApprovalStore>,
) {
    (
        Arc::new(InMemoryMemoryStore::new(200)),
        Arc::new(InMemorySummaryStore::new()),
        Arc::new(InMemoryApprovalStore::new()),
    )
}

#[tokio::test]
async fn minimal_engine_text_response() {
    let provider = Arc::new(ScriptedProvider::new(vec![text_response("Paris")]));
    let (memory, summaries, approvals) = stores();
    let engine = EngineBuilder::new(provider, memory, summaries, approvals).build();

    let command = AgentCommand::new("You are a helpful assistant.", "What is the capital of France?");
    let result = engine.run(command).await;

    assert!(result.success);
    assert_eq!(result.content.as_deref(), Some("Paris"));
}

#[tokio::test]
async fn engine_dispatches_tool_calls_before_finishing() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_use_response("call-1", "echo", json!({"text": "hello"})),
        text_response("I echoed: hello"),
    ]));
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(Echo));
    let (memory, summaries, approvals) = stores();

    let engine = EngineBuilder::new(provider, memory, summaries, approvals)
        .with_tools(Arc::new(registry))
        .build();

    let command = AgentCommand::new("You can echo text.", "Echo hello");
    let result = engine.run(command).await;

    assert!(result.success);
    assert_eq!(result.content.as_deref(), Some("I echoed: hello"));
    assert_eq!(result.tools_used.len(), 1);
}

#[tokio::test]
async fn guard_rejection_short_circuits_before_any_provider_call() {
    // An empty response list proves the provider is never called: guard
    // rejection happens before the first `complete`.
    let provider = Arc::new(ScriptedProvider::new(vec![]));
    let (memory, summaries, approvals) = stores();
    let engine = EngineBuilder::new(provider, memory, summaries, approvals).build();

    let huge_prompt = "x".repeat(20_000);
    let command = AgentCommand::new("You are a helpful assistant.", huge_prompt);
    let result = engine.run(command).await;

    assert!(!result.success);
    assert_eq!(result.error_code, Some(ErrorCode::GuardRejected));
}

#[test]
fn prelude_types_accessible() {
    let _message = Message::user("hello");
    let _usage = TokenUsage::default();
    let _config = EngineConfig::default();
    let _spec = ToolSpec::new("noop", "does nothing", json!({"type": "object"}));
}
