//! The five built-in hooks from §4.2.

use crate::{AfterAgentComplete, AfterToolCall, BeforeAgentStart, BeforeToolCall};
use async_trait::async_trait;
use reactor_core::error::HookError;
use reactor_core::hook::{AgentStartDecision, HookContext, ToolCallContext, ToolCallDecision, ToolCallOutcome};
use reactor_core::result::AgentResult;
use reactor_metrics::MetricEmitter;
use reactor_quota::QuotaEnforcer;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{info_span, warn};

/// Order 5. Checks the tenant's quota before any model call.
pub struct QuotaEnforcerHook {
    enforcer: Arc<QuotaEnforcer>,
}

impl QuotaEnforcerHook {
    /// Wrap an existing `QuotaEnforcer`.
    pub fn new(enforcer: Arc<QuotaEnforcer>) -> Self {
        Self { enforcer }
    }
}

#[async_trait]
impl BeforeAgentStart for QuotaEnforcerHook {
    fn name(&self) -> &str {
        "quota_enforcer"
    }

    fn order(&self) -> i32 {
        5
    }

    fn fail_on_error(&self) -> bool {
        // Quota is fail-open on infrastructure failure by explicit design;
        // `QuotaEnforcer::check_and_record` already encodes that, so this
        // hook never needs to fail closed on an `Err` of its own.
        false
    }

    async fn on_before_agent_start(&self, ctx: &HookContext) -> Result<AgentStartDecision, HookError> {
        let tenant = ctx
            .metadata
            .get("tenant_id")
            .cloned()
            .unwrap_or_else(|| "default".to_string());
        match self.enforcer.check_and_record(&tenant).await {
            Ok(()) => Ok(AgentStartDecision::Continue),
            Err(err) => Ok(AgentStartDecision::Reject(err.to_string())),
        }
    }
}

/// Order ~50. Rejects write-tools on configured channels.
pub struct ToolPolicyHook {
    blocked_tools_by_channel: Vec<(String, Vec<String>)>,
}

impl ToolPolicyHook {
    /// Construct with no restrictions configured.
    pub fn new() -> Self {
        Self { blocked_tools_by_channel: Vec::new() }
    }

    /// Block a tool name on a given channel, builder-style.
    pub fn block(mut self, channel: impl Into<String>, tool_name: impl Into<String>) -> Self {
        let channel = channel.into();
        let tool_name = tool_name.into();
        if let Some((_, tools)) = self.blocked_tools_by_channel.iter_mut().find(|(c, _)| *c == channel) {
            tools.push(tool_name);
        } else {
            self.blocked_tools_by_channel.push((channel, vec![tool_name]));
        }
        self
    }
}

impl Default for ToolPolicyHook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BeforeToolCall for ToolPolicyHook {
    fn name(&self) -> &str {
        "tool_policy"
    }

    fn order(&self) -> i32 {
        50
    }

    async fn on_before_tool_call(&self, ctx: &ToolCallContext) -> Result<ToolCallDecision, HookError> {
        let channel = ctx
            .tool_call
            .arguments
            .get("__channel")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        for (blocked_channel, tools) in &self.blocked_tools_by_channel {
            if blocked_channel == channel && tools.iter().any(|t| t == &ctx.tool_call.tool_name) {
                return Ok(ToolCallDecision::Reject(format!(
                    "tool '{}' is not permitted on channel '{}'",
                    ctx.tool_call.tool_name, channel
                )));
            }
        }
        Ok(ToolCallDecision::Continue)
    }
}

/// Suspends tool calls on the configured approval list pending human
/// review.
pub struct ApprovalPolicyHook {
    tool_names: Vec<String>,
}

impl ApprovalPolicyHook {
    /// Construct with the set of tool names that require approval.
    pub fn new(tool_names: Vec<String>) -> Self {
        Self { tool_names }
    }
}

#[async_trait]
impl BeforeToolCall for ApprovalPolicyHook {
    fn name(&self) -> &str {
        "approval_policy"
    }

    fn order(&self) -> i32 {
        60
    }

    async fn on_before_tool_call(&self, ctx: &ToolCallContext) -> Result<ToolCallDecision, HookError> {
        if ctx.requires_approval || self.tool_names.iter().any(|t| t == &ctx.tool_call.tool_name) {
            // The orchestrator (reactor-engine) owns the approval store and
            // the single-fire completion channel; this hook only flags
            // that approval is needed. The id is minted by the caller once
            // it actually records the PendingApproval, so this hook hands
            // back a placeholder the orchestrator immediately replaces —
            // modeled here as a fresh id, discarded by the caller in favor
            // of the one the approval store assigns.
            return Ok(ToolCallDecision::PendingApproval(uuid::Uuid::new_v4()));
        }
        Ok(ToolCallDecision::Continue)
    }
}

/// Order 199. Opens/closes a tracing span for every lifecycle point,
/// tagged with the attributes §4.2 specifies.
pub struct TracingHook;

impl TracingHook {
    /// Construct the tracing hook.
    pub fn new() -> Self {
        Self
    }

    fn truncate_for_span(message: &str) -> String {
        const LIMIT: usize = 200;
        if message.len() <= LIMIT {
            return message.to_string();
        }
        let mut end = LIMIT;
        while end > 0 && !message.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &message[..end])
    }
}

impl Default for TracingHook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BeforeAgentStart for TracingHook {
    fn name(&self) -> &str {
        "tracing"
    }
    fn order(&self) -> i32 {
        199
    }
    async fn on_before_agent_start(&self, ctx: &HookContext) -> Result<AgentStartDecision, HookError> {
        let _span = info_span!("agent_start", run_id = %ctx.run_id, user_id = ?ctx.user_id).entered();
        Ok(AgentStartDecision::Continue)
    }
}

#[async_trait]
impl BeforeToolCall for TracingHook {
    fn name(&self) -> &str {
        "tracing"
    }
    fn order(&self) -> i32 {
        199
    }
    async fn on_before_tool_call(&self, ctx: &ToolCallContext) -> Result<ToolCallDecision, HookError> {
        let _span = info_span!("tool_call_start", run_id = %ctx.run_id, tool_name = %ctx.tool_call.tool_name).entered();
        Ok(ToolCallDecision::Continue)
    }
}

#[async_trait]
impl AfterToolCall for TracingHook {
    fn name(&self) -> &str {
        "tracing"
    }
    fn order(&self) -> i32 {
        199
    }
    async fn on_after_tool_call(&self, ctx: &ToolCallContext, outcome: &ToolCallOutcome) {
        let message = outcome
            .result
            .error_message
            .as_deref()
            .map(Self::truncate_for_span)
            .unwrap_or_default();
        let _span = info_span!(
            "tool_call_end",
            run_id = %ctx.run_id,
            tool_name = %ctx.tool_call.tool_name,
            success = outcome.result.success,
            error = %message,
        )
        .entered();
    }
}

#[async_trait]
impl AfterAgentComplete for TracingHook {
    fn name(&self) -> &str {
        "tracing"
    }
    fn order(&self) -> i32 {
        199
    }
    async fn on_after_agent_complete(&self, ctx: &HookContext, result: &AgentResult) {
        let message = result
            .error_message
            .as_deref()
            .map(Self::truncate_for_span)
            .unwrap_or_default();
        let _span = info_span!(
            "agent_complete",
            run_id = %ctx.run_id,
            success = result.success,
            error = %message,
        )
        .entered();
    }
}

/// Order 200. Emits after-hook events to the metric ring buffer. Never
/// fails — publish failures are fail-silent per §7.
pub struct MetricCollectionHook {
    emitter: Arc<MetricEmitter>,
    tenant_id: String,
}

impl MetricCollectionHook {
    /// Construct with the shared emitter and the tenant these events
    /// belong to.
    pub fn new(emitter: Arc<MetricEmitter>, tenant_id: impl Into<String>) -> Self {
        Self { emitter, tenant_id: tenant_id.into() }
    }
}

#[async_trait]
impl AfterToolCall for MetricCollectionHook {
    fn name(&self) -> &str {
        "metric_collection"
    }
    fn order(&self) -> i32 {
        200
    }
    async fn on_after_tool_call(&self, ctx: &ToolCallContext, outcome: &ToolCallOutcome) {
        let event = reactor_core::metrics::MetricEvent::ToolCall(reactor_core::metrics::ToolCallEvent {
            tenant_id: self.tenant_id.clone(),
            run_id: ctx.run_id.clone(),
            timestamp: SystemTime::now(),
            tool_name: ctx.tool_call.tool_name.clone(),
            success: outcome.result.success,
            duration: outcome.result.duration,
            hitl_required: outcome.hitl_required,
        });
        if !self.emitter.publish(event) {
            warn!(tool = %ctx.tool_call.tool_name, "metric ring buffer saturated, event dropped");
        }
    }
}

#[async_trait]
impl AfterAgentComplete for MetricCollectionHook {
    fn name(&self) -> &str {
        "metric_collection"
    }
    fn order(&self) -> i32 {
        200
    }
    async fn on_after_agent_complete(&self, ctx: &HookContext, result: &AgentResult) {
        let event = reactor_core::metrics::MetricEvent::AgentExecution(reactor_core::metrics::AgentExecutionEvent {
            tenant_id: self.tenant_id.clone(),
            run_id: ctx.run_id.clone(),
            timestamp: SystemTime::now(),
            success: result.success,
            duration: result.duration,
            error_code: result.error_code.map(|c| format!("{c:?}")),
        });
        if !self.emitter.publish(event) {
            warn!(run_id = %ctx.run_id, "metric ring buffer saturated, event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactor_core::id::RunId;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn quota_hook_rejects_over_limit_tenant() {
        let enforcer = Arc::new(QuotaEnforcer::local_only(0));
        let hook = QuotaEnforcerHook::new(enforcer);
        let mut ctx = HookContext::new(RunId::new("r1"), "hi");
        ctx.metadata.insert("tenant_id".into(), "t1".into());
        let decision = hook.on_before_agent_start(&ctx).await.unwrap();
        assert!(matches!(decision, AgentStartDecision::Reject(_)));
    }

    #[tokio::test]
    async fn tool_policy_blocks_configured_tool_on_channel() {
        let hook = ToolPolicyHook::new().block("slack", "delete_account");
        let ctx = ToolCallContext {
            run_id: RunId::new("r1"),
            tool_call: reactor_core::tool::ToolCall {
                id: "c1".into(),
                tool_name: "delete_account".into(),
                arguments: serde_json::json!({"__channel": "slack"}),
                index: 0,
            },
            requires_approval: false,
        };
        let decision = hook.on_before_tool_call(&ctx).await.unwrap();
        assert!(matches!(decision, ToolCallDecision::Reject(_)));
    }

    #[tokio::test]
    async fn metric_collection_hook_publishes_without_erroring() {
        let emitter = Arc::new(MetricEmitter::new(4));
        let hook = MetricCollectionHook::new(emitter.clone(), "t1");
        let ctx = HookContext::new(RunId::new("r1"), "hi");
        let result = AgentResult::success("ok", vec![], reactor_core::result::TokenUsage::default(), reactor_core::duration::DurationMs::ZERO);
        hook.on_after_agent_complete(&ctx, &result).await;
        let drainer = emitter.try_drain().unwrap();
        assert_eq!(drainer.drain().len(), 1);
    }

    #[test]
    fn fail_open_count_starts_at_zero() {
        let enforcer = QuotaEnforcer::local_only(10);
        assert_eq!(enforcer.fail_open_count.load(Ordering::Relaxed), 0);
    }
}
