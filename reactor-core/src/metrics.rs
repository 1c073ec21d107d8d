//! The metric event vocabulary published to the ring buffer.
//!
//! A tagged enum of lifecycle events, every variant carrying at least a
//! tenant id, a run id, and a timestamp — the shared shape the Metric Event
//! Emitter (`reactor-metrics`) publishes without interpreting.

use crate::duration::DurationMs;
use crate::id::RunId;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Outcome recorded for a completed or failed execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecutionEvent {
    /// Tenant the execution ran under.
    pub tenant_id: String,
    /// The execution's run id.
    pub run_id: RunId,
    /// When the event was recorded.
    pub timestamp: SystemTime,
    /// Whether the execution succeeded.
    pub success: bool,
    /// Total wall time.
    pub duration: DurationMs,
    /// Closed error code string, when not successful.
    pub error_code: Option<String>,
}

/// Outcome recorded for one tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallEvent {
    /// Tenant the call ran under.
    pub tenant_id: String,
    /// The owning execution's run id.
    pub run_id: RunId,
    /// When the event was recorded.
    pub timestamp: SystemTime,
    /// Name of the tool invoked.
    pub tool_name: String,
    /// Whether the call succeeded.
    pub success: bool,
    /// Wall time spent in the tool.
    pub duration: DurationMs,
    /// Whether this call required human approval.
    pub hitl_required: bool,
}

/// Outcome recorded for one guard pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardEvent {
    /// Tenant the request belonged to.
    pub tenant_id: String,
    /// The execution's run id (or a synthetic one if rejected pre-run-id).
    pub run_id: RunId,
    /// When the event was recorded.
    pub timestamp: SystemTime,
    /// Name of the guard stage.
    pub stage: String,
    /// Whether the stage allowed the request.
    pub allowed: bool,
    /// Rejection reason, when not allowed.
    pub reason: Option<String>,
}

/// Token accounting recorded for one model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsageEvent {
    /// Tenant the call ran under.
    pub tenant_id: String,
    /// The owning execution's run id.
    pub run_id: RunId,
    /// When the event was recorded.
    pub timestamp: SystemTime,
    /// Prompt tokens for this one model call.
    pub prompt_tokens: u64,
    /// Completion tokens for this one model call.
    pub completion_tokens: u64,
    /// Model name used for this call.
    pub model: String,
}

/// Recorded session-store activity (load/save/trim).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Tenant the session belongs to.
    pub tenant_id: String,
    /// The owning execution's run id.
    pub run_id: RunId,
    /// When the event was recorded.
    pub timestamp: SystemTime,
    /// The session id affected.
    pub session_id: String,
    /// Kind of activity: `"load"`, `"save"`, `"trim"`, `"summarize"`.
    pub activity: String,
    /// Message count involved, when relevant.
    pub message_count: Option<usize>,
}

/// Recorded human-in-the-loop activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitlEvent {
    /// Tenant the approval belongs to.
    pub tenant_id: String,
    /// The owning execution's run id.
    pub run_id: RunId,
    /// When the event was recorded.
    pub timestamp: SystemTime,
    /// The approval id.
    pub approval_id: uuid::Uuid,
    /// Outcome string: `"approved"`, `"rejected"`, `"timed_out"`.
    pub outcome: String,
    /// Milliseconds spent waiting for the decision.
    pub wait_ms: u64,
}

/// Recorded MCP server connection health transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpHealthEvent {
    /// Tenant context this connection serves, when scoped per tenant.
    pub tenant_id: String,
    /// The owning execution's run id, if the transition happened inline
    /// with a request; otherwise a synthetic id.
    pub run_id: RunId,
    /// When the event was recorded.
    pub timestamp: SystemTime,
    /// Name of the MCP server.
    pub server_name: String,
    /// New health status string.
    pub status: String,
}

/// The tagged union of every event the engine publishes to the metric ring
/// buffer.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MetricEvent {
    /// A completed or failed `execute` call.
    AgentExecution(AgentExecutionEvent),
    /// A completed tool invocation.
    ToolCall(ToolCallEvent),
    /// A guard pipeline stage decision.
    Guard(GuardEvent),
    /// Token accounting for one model call.
    TokenUsage(TokenUsageEvent),
    /// Session-store activity.
    Session(SessionEvent),
    /// Human-in-the-loop activity.
    Hitl(HitlEvent),
    /// An MCP server health transition.
    McpHealth(McpHealthEvent),
}

impl MetricEvent {
    /// The tenant id carried by every variant.
    pub fn tenant_id(&self) -> &str {
        match self {
            MetricEvent::AgentExecution(e) => &e.tenant_id,
            MetricEvent::ToolCall(e) => &e.tenant_id,
            MetricEvent::Guard(e) => &e.tenant_id,
            MetricEvent::TokenUsage(e) => &e.tenant_id,
            MetricEvent::Session(e) => &e.tenant_id,
            MetricEvent::Hitl(e) => &e.tenant_id,
            MetricEvent::McpHealth(e) => &e.tenant_id,
        }
    }

    /// The run id carried by every variant.
    pub fn run_id(&self) -> &RunId {
        match self {
            MetricEvent::AgentExecution(e) => &e.run_id,
            MetricEvent::ToolCall(e) => &e.run_id,
            MetricEvent::Guard(e) => &e.run_id,
            MetricEvent::TokenUsage(e) => &e.run_id,
            MetricEvent::Session(e) => &e.run_id,
            MetricEvent::Hitl(e) => &e.run_id,
            MetricEvent::McpHealth(e) => &e.run_id,
        }
    }
}
