#![cfg(feature = "provider-ollama")]
//! Smoke tests against a local Ollama instance.
//!
//! Ignored by default. Run with:
//!
//!     cargo test -p reactor --features provider-ollama --test smoke_ollama -- --ignored
//!
//! Requires a running Ollama server with `llama3.2` pulled:
//! `ollama serve` then `ollama pull llama3.2`.

use reactor::prelude::*;
use reactor_memory::{InMemoryApprovalStore, InMemoryMemoryStore, InMemorySummaryStore};
use reactor_turn::provider::Provider;
use reactor_turn::types::{ContentPart, ProviderRequest, Role};
use std::sync::Arc;

fn ollama() -> OllamaProvider {
    OllamaProvider::new().with_keep_alive("0")
}

#[tokio::test]
#[ignore = "requires local Ollama"]
async fn smoke_basic_completion() {
    let provider = ollama();

    let request = ProviderRequest {
        model: Some("llama3.2".into()),
        messages: vec![reactor_turn::types::ProviderMessage {
            role: Role::User,
            content: vec![ContentPart::Text {
                text: "What is 2+2? Reply with just the number.".into(),
            }],
        }],
        tools: vec![],
        max_tokens: Some(64),
        temperature: Some(0.0),
        system: Some("You are a helpful assistant. Reply concisely with only the answer.".into()),
        extra: serde_json::Value::Null,
    };

    let response = provider.complete(request).await.unwrap();

    let text = response
        .content
        .iter()
        .find_map(|part| match part {
            ContentPart::Text { text } => Some(text.clone()),
            _ => None,
        })
        .expect("expected a text content part");

    assert!(text.contains('4'), "expected '4' in response, got: {text}");
    println!("  response: {text}");
}

#[tokio::test]
#[ignore = "requires local Ollama"]
async fn smoke_full_engine_run() {
    let provider = Arc::new(ollama());
    let memory = Arc::new(InMemoryMemoryStore::new(50));
    let summaries = Arc::new(InMemorySummaryStore::new());
    let approvals = Arc::new(InMemoryApprovalStore::new());

    let engine = EngineBuilder::new(provider, memory, summaries, approvals).build();

    let command = AgentCommand {
        model: Some("llama3.2".into()),
        ..AgentCommand::new(
            "You are a helpful assistant. Answer concisely in one sentence.",
            "What is the capital of France?",
        )
    };

    let result = engine.run(command).await;

    println!("  response: {:?}", result.content);
    assert!(result.success);
    assert!(
        result
            .content
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
            .contains("paris"),
        "expected 'paris' in: {:?}",
        result.content
    );
}
