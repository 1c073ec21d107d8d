//! Integration test: a real OpenAI call through the full engine.

use reactor_core::command::AgentCommand;
use reactor_engine::EngineBuilder;
use reactor_memory::{InMemoryApprovalStore, InMemoryMemoryStore, InMemorySummaryStore};
use reactor_provider_openai::OpenAIProvider;
use std::sync::Arc;

#[tokio::test]
#[ignore] // Requires OPENAI_API_KEY environment variable
async fn real_gpt4o_mini_simple_completion() {
    let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");

    let provider = Arc::new(OpenAIProvider::new(api_key));
    let memory = Arc::new(InMemoryMemoryStore::new(50));
    let summaries = Arc::new(InMemorySummaryStore::new());
    let approvals = Arc::new(InMemoryApprovalStore::new());
    let engine = EngineBuilder::new(provider, memory, summaries, approvals).build();

    let command = AgentCommand {
        model: Some("gpt-4o-mini".into()),
        ..AgentCommand::new(
            "You are a helpful assistant. Be very concise.",
            "Say hello in exactly 3 words.",
        )
    };

    let result = engine.run(command).await;

    assert!(result.success, "run should succeed: {:?}", result.error_message);
    let text = result.content.expect("expected response text");
    assert!(!text.is_empty());
    assert!(result.token_usage.prompt_tokens > 0);
    assert!(result.token_usage.completion_tokens > 0);
    assert!(result.cost > rust_decimal::Decimal::ZERO);
}

#[tokio::test]
#[ignore] // Requires OPENAI_API_KEY environment variable
async fn conversation_history_persists_across_turns() {
    let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");

    let provider = Arc::new(OpenAIProvider::new(api_key));
    let memory = Arc::new(InMemoryMemoryStore::new(50));
    let summaries = Arc::new(InMemorySummaryStore::new());
    let approvals = Arc::new(InMemoryApprovalStore::new());
    let engine = EngineBuilder::new(provider, memory.clone(), summaries, approvals).build();

    let mut metadata = std::collections::HashMap::new();
    metadata.insert("session_id".to_string(), "gpt4o-history-test".to_string());

    let first = AgentCommand {
        model: Some("gpt-4o-mini".into()),
        metadata: metadata.clone(),
        ..AgentCommand::new("You are a helpful assistant.", "My favorite color is teal.")
    };
    let first_result = engine.run(first).await;
    assert!(first_result.success, "first turn should succeed: {:?}", first_result.error_message);

    let second = AgentCommand {
        model: Some("gpt-4o-mini".into()),
        metadata,
        ..AgentCommand::new("You are a helpful assistant.", "What is my favorite color?")
    };
    let second_result = engine.run(second).await;
    assert!(second_result.success, "second turn should succeed: {:?}", second_result.error_message);
    assert!(second_result
        .content
        .unwrap_or_default()
        .to_lowercase()
        .contains("teal"));
}
