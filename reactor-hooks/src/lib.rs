#![deny(missing_docs)]
//! The Hook Chain — ordered, fail-open-by-default lifecycle listeners.
//!
//! Four lifecycle points are modeled as four distinct traits (each point
//! carries a different payload shape, so a single `on_event` signature
//! would force every hook to pattern-match out the cases that don't apply
//! to it). [`HookChain`] dispatches each point's hooks sequentially in
//! ascending `order()`. A `BeforeAgentStart`/`BeforeToolCall` hook that
//! returns `Reject` short-circuits the rest of that point's hooks.
//! After-hooks always run, even when the execution failed, so teardown,
//! auditing, and metric emission happen unconditionally.

pub mod builtin;

use async_trait::async_trait;
use reactor_core::error::HookError;
use reactor_core::hook::{AgentStartDecision, HookContext, ToolCallContext, ToolCallDecision, ToolCallOutcome};
use reactor_core::result::AgentResult;
use std::sync::Arc;
use tracing::warn;

/// Fires once before an execution's first model call.
#[async_trait]
pub trait BeforeAgentStart: Send + Sync {
    /// Stable name, used in logs and metric events.
    fn name(&self) -> &str;
    /// Dispatch order; ascending.
    fn order(&self) -> i32;
    /// If true, an `Err` from this hook aborts the execution instead of
    /// being logged and ignored.
    fn fail_on_error(&self) -> bool {
        false
    }
    /// Evaluate the about-to-start execution.
    async fn on_before_agent_start(&self, ctx: &HookContext) -> Result<AgentStartDecision, HookError>;
}

/// Fires before each tool invocation.
#[async_trait]
pub trait BeforeToolCall: Send + Sync {
    /// Stable name, used in logs and metric events.
    fn name(&self) -> &str;
    /// Dispatch order; ascending.
    fn order(&self) -> i32;
    /// If true, an `Err` from this hook aborts the tool call instead of
    /// being logged and ignored.
    fn fail_on_error(&self) -> bool {
        false
    }
    /// Evaluate the about-to-run tool call.
    async fn on_before_tool_call(&self, ctx: &ToolCallContext) -> Result<ToolCallDecision, HookError>;
}

/// Fires after each tool invocation completes.
#[async_trait]
pub trait AfterToolCall: Send + Sync {
    /// Stable name, used in logs and metric events.
    fn name(&self) -> &str;
    /// Dispatch order; ascending.
    fn order(&self) -> i32;
    /// Observe the completed tool call. Errors are always logged and
    /// never halt execution — after-hooks exist for teardown/auditing.
    async fn on_after_tool_call(&self, ctx: &ToolCallContext, outcome: &ToolCallOutcome);
}

/// Fires once after an execution produces its final `AgentResult`,
/// success or failure.
#[async_trait]
pub trait AfterAgentComplete: Send + Sync {
    /// Stable name, used in logs and metric events.
    fn name(&self) -> &str;
    /// Dispatch order; ascending.
    fn order(&self) -> i32;
    /// Observe the completed execution. Errors are always logged and
    /// never halt execution.
    async fn on_after_agent_complete(&self, ctx: &HookContext, result: &AgentResult);
}

/// The ordered registry of hooks for all four lifecycle points.
#[derive(Default)]
pub struct HookChain {
    before_start: Vec<Arc<dyn BeforeAgentStart>>,
    before_tool: Vec<Arc<dyn BeforeToolCall>>,
    after_tool: Vec<Arc<dyn AfterToolCall>>,
    after_complete: Vec<Arc<dyn AfterAgentComplete>>,
}

impl HookChain {
    /// Construct an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a `BeforeAgentStart` hook, keeping the list sorted by
    /// `order()`.
    pub fn add_before_start(&mut self, hook: Arc<dyn BeforeAgentStart>) {
        self.before_start.push(hook);
        self.before_start.sort_by_key(|h| h.order());
    }

    /// Register a `BeforeToolCall` hook, keeping the list sorted by
    /// `order()`.
    pub fn add_before_tool(&mut self, hook: Arc<dyn BeforeToolCall>) {
        self.before_tool.push(hook);
        self.before_tool.sort_by_key(|h| h.order());
    }

    /// Register an `AfterToolCall` hook, keeping the list sorted by
    /// `order()`.
    pub fn add_after_tool(&mut self, hook: Arc<dyn AfterToolCall>) {
        self.after_tool.push(hook);
        self.after_tool.sort_by_key(|h| h.order());
    }

    /// Register an `AfterAgentComplete` hook, keeping the list sorted by
    /// `order()`.
    pub fn add_after_complete(&mut self, hook: Arc<dyn AfterAgentComplete>) {
        self.after_complete.push(hook);
        self.after_complete.sort_by_key(|h| h.order());
    }

    /// Dispatch `BeforeAgentStart` hooks in order. The first `Reject`
    /// short-circuits the rest.
    pub async fn dispatch_before_start(&self, ctx: &HookContext) -> AgentStartDecision {
        for hook in &self.before_start {
            match hook.on_before_agent_start(ctx).await {
                Ok(AgentStartDecision::Continue) => continue,
                Ok(reject @ AgentStartDecision::Reject(_)) => return reject,
                Err(err) => {
                    warn!(hook = hook.name(), error = %err, "before-agent-start hook failed");
                    if hook.fail_on_error() {
                        return AgentStartDecision::Reject(err.to_string());
                    }
                }
            }
        }
        AgentStartDecision::Continue
    }

    /// Dispatch `BeforeToolCall` hooks in order. The first `Reject` or
    /// `PendingApproval` short-circuits the rest.
    pub async fn dispatch_before_tool(&self, ctx: &ToolCallContext) -> ToolCallDecision {
        for hook in &self.before_tool {
            match hook.on_before_tool_call(ctx).await {
                Ok(ToolCallDecision::Continue) => continue,
                Ok(decision) => return decision,
                Err(err) => {
                    warn!(hook = hook.name(), error = %err, "before-tool-call hook failed");
                    if hook.fail_on_error() {
                        return ToolCallDecision::Reject(err.to_string());
                    }
                }
            }
        }
        ToolCallDecision::Continue
    }

    /// Dispatch all `AfterToolCall` hooks in order. Always runs every
    /// hook; errors are logged, never propagated.
    pub async fn dispatch_after_tool(&self, ctx: &ToolCallContext, outcome: &ToolCallOutcome) {
        for hook in &self.after_tool {
            hook.on_after_tool_call(ctx, outcome).await;
        }
    }

    /// Dispatch all `AfterAgentComplete` hooks in order. Always runs
    /// every hook, even when `result` represents a failed execution.
    pub async fn dispatch_after_complete(&self, ctx: &HookContext, result: &AgentResult) {
        for hook in &self.after_complete {
            hook.on_after_agent_complete(ctx, result).await;
        }
    }
}
