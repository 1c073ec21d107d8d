//! Shared data types for the lifecycle hook chain (`reactor-hooks` owns the
//! dispatch logic; this crate only owns the vocabulary hooks exchange).

use crate::id::RunId;
use crate::tool::{ToolCall, ToolResult};
use std::collections::HashMap;
use std::time::Instant;

/// Context threaded through every hook firing during one execution.
///
/// Owned exclusively by the engine for the lifetime of one `execute` call
/// and passed to hooks by reference; hooks may write into `metadata` but
/// never replace the context itself.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Unique id for this execution.
    pub run_id: RunId,
    /// The user on whose behalf this execution runs.
    pub user_id: Option<String>,
    /// The original user prompt text.
    pub user_prompt: String,
    /// The channel the request arrived on (e.g. `"slack"`), if any.
    pub channel: Option<String>,
    /// When this execution started.
    pub start_instant: Instant,
    /// Mutable scratch space hooks may use to pass data to later hooks.
    pub metadata: HashMap<String, String>,
}

impl HookContext {
    /// Construct a context at the start of an execution.
    pub fn new(run_id: RunId, user_prompt: impl Into<String>) -> Self {
        Self {
            run_id,
            user_id: None,
            user_prompt: user_prompt.into(),
            channel: None,
            start_instant: Instant::now(),
            metadata: HashMap::new(),
        }
    }
}

/// Context passed to `BeforeToolCall`/`AfterToolCall` hooks.
#[derive(Debug, Clone)]
pub struct ToolCallContext {
    /// The execution this tool call belongs to.
    pub run_id: RunId,
    /// The tool call about to run (or that just ran).
    pub tool_call: ToolCall,
    /// True if this tool is on the configured approval list.
    pub requires_approval: bool,
}

/// Outcome of a `BeforeAgentStart` hook.
#[derive(Debug, Clone)]
pub enum AgentStartDecision {
    /// Proceed with execution.
    Continue,
    /// Abort the execution with this reason.
    Reject(String),
}

/// Outcome of a `BeforeToolCall` hook.
#[derive(Debug, Clone)]
pub enum ToolCallDecision {
    /// Proceed with the tool call as requested.
    Continue,
    /// Abort this tool call with a synthetic error result.
    Reject(String),
    /// Suspend this tool call pending human approval, identified by id.
    PendingApproval(uuid::Uuid),
}

/// Final outcome of one tool call, handed to `AfterToolCall` hooks and used
/// by the Tool Invocation Orchestrator to record HITL bookkeeping.
#[derive(Debug, Clone)]
pub struct ToolCallOutcome {
    /// The tool's result.
    pub result: ToolResult,
    /// Whether a human-in-the-loop wait was detected for this call.
    pub hitl_required: bool,
    /// Milliseconds spent waiting beyond the tool's own reported duration.
    pub hitl_wait_ms: Option<u64>,
    /// Whether an approval, if one occurred, was granted.
    pub hitl_approved: Option<bool>,
    /// Error classification label (e.g. `"TimeoutException"`), set only
    /// when `result.success` is false.
    pub failure_kind: Option<String>,
}
