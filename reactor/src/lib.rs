#![deny(missing_docs)]
//! # reactor — umbrella crate
//!
//! A single import surface for the Arc Reactor multi-tenant agent runtime.
//! Re-exports the protocol crate and its implementations behind feature
//! flags, plus a `prelude` for the common case: one [`reactor_engine::Engine`]
//! wired to one [`reactor_turn::provider::Provider`], a tool registry, guard
//! pipeline, hook chain, and memory backend.

#[cfg(feature = "core")]
pub use reactor_context;
#[cfg(feature = "core")]
pub use reactor_core;
#[cfg(feature = "core")]
pub use reactor_tool;
#[cfg(feature = "core")]
pub use reactor_turn;

#[cfg(feature = "engine")]
pub use reactor_engine;
#[cfg(feature = "guard")]
pub use reactor_guard;
#[cfg(feature = "hooks")]
pub use reactor_hooks;
#[cfg(feature = "mcp")]
pub use reactor_mcp;
#[cfg(feature = "metrics")]
pub use reactor_metrics;
#[cfg(feature = "quota")]
pub use reactor_quota;

#[cfg(feature = "state-memory")]
pub use reactor_memory;

#[cfg(feature = "provider-anthropic")]
pub use reactor_provider_anthropic;
#[cfg(feature = "provider-ollama")]
pub use reactor_provider_ollama;
#[cfg(feature = "provider-openai")]
pub use reactor_provider_openai;

/// Happy-path imports for composing Arc Reactor agents.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use reactor_core::{
        AgentCommand, AgentResult, EngineConfig, ErrorCode, Message, Role, TokenUsage,
    };

    #[cfg(feature = "core")]
    pub use reactor_tool::{ToolDyn, ToolError, ToolRegistry};

    #[cfg(feature = "core")]
    pub use reactor_turn::provider::{Provider, ProviderError};

    #[cfg(feature = "hooks")]
    pub use reactor_hooks::HookChain;

    #[cfg(feature = "guard")]
    pub use reactor_guard::GuardPipeline;

    #[cfg(feature = "quota")]
    pub use reactor_quota::QuotaEnforcer;

    #[cfg(feature = "metrics")]
    pub use reactor_metrics::MetricEmitter;

    #[cfg(feature = "engine")]
    pub use reactor_engine::{Engine, EngineBuilder, StreamEvent};

    #[cfg(feature = "state-memory")]
    pub use reactor_memory::{InMemoryApprovalStore, InMemoryMemoryStore, InMemorySummaryStore};

    #[cfg(feature = "provider-anthropic")]
    pub use reactor_provider_anthropic::AnthropicProvider;

    #[cfg(feature = "provider-ollama")]
    pub use reactor_provider_ollama::OllamaProvider;

    #[cfg(feature = "provider-openai")]
    pub use reactor_provider_openai::OpenAIProvider;
}
