//! # reactor-core — shared data model for the Arc Reactor agent runtime
//!
//! This crate owns the types that cross every boundary in the runtime:
//! the inbound [`AgentCommand`] and outbound [`AgentResult`], the
//! conversation [`Message`] and [`ConversationSummary`] model, the
//! [`ToolSpec`]/[`ToolCall`]/[`ToolResult`] tool protocol types, the
//! [`PendingApproval`] human-in-the-loop record, the [`MetricEvent`]
//! tagged union, the [`EngineConfig`] configuration surface, the
//! [`EngineError`] taxonomy, and the [`MemoryStore`]/[`SummaryStore`]/
//! [`ApprovalStore`] persistence contracts.
//!
//! It intentionally contains no execution logic — the guard pipeline
//! (`reactor-guard`), the hook chain (`reactor-hooks`), the ReAct loop
//! (`reactor-engine`), and every other component import these types rather
//! than redefine them.

#![deny(missing_docs)]

pub mod approval;
pub mod command;
pub mod config;
pub mod content;
pub mod duration;
pub mod error;
pub mod hook;
pub mod id;
pub mod message;
pub mod metrics;
pub mod result;
pub mod store;
pub mod summary;
pub mod tool;

pub use approval::{ApprovalOutcome, ApprovalStatus, PendingApproval};
pub use command::{AgentCommand, MediaAttachment, ResponseFormat};
pub use config::{
    ApprovalConfig, CircuitBreakerConfig, ConcurrencyConfig, EngineConfig, GuardConfig,
    RetryConfig, SummaryConfig, ToolSelectionConfig, ToolSelectionStrategy,
};
pub use content::{Content, ContentBlock};
pub use duration::DurationMs;
pub use error::{DefaultResolver, EngineError, ErrorMessageResolver, GuardError, HookError, ToolError};
pub use hook::{AgentStartDecision, HookContext, ToolCallContext, ToolCallDecision, ToolCallOutcome};
pub use id::{RunId, SessionId, TenantId, ToolCallId, UserId, ANONYMOUS_USER};
pub use message::{Message, Role};
pub use metrics::{
    AgentExecutionEvent, GuardEvent, HitlEvent, McpHealthEvent, MetricEvent, SessionEvent,
    TokenUsageEvent, ToolCallEvent as ToolCallMetricEvent,
};
pub use result::{AgentResult, ErrorCode, TokenUsage};
pub use store::{ApprovalStore, MemoryStore, StoreError, SummaryStore};
pub use summary::{ConversationSummary, FactCategory, SummaryFact};
pub use tool::{ToolCall, ToolResult, ToolSpec};

#[cfg(feature = "test-utils")]
pub mod test_utils {
    //! Fixtures shared across this workspace's integration tests.

    use crate::command::AgentCommand;
    use crate::id::RunId;

    /// A minimal command useful as a test fixture.
    pub fn sample_command() -> AgentCommand {
        AgentCommand::new("Be concise.", "2+2?")
            .with_metadata("session_id", "s1")
            .with_metadata("user_id", "u1")
            .with_metadata("tenant_id", "t1")
    }

    /// A deterministic run id useful as a test fixture.
    pub fn sample_run_id() -> RunId {
        RunId::new("test-run-0001")
    }
}
