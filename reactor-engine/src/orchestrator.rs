//! Tool invocation orchestration: hook dispatch, approval gating, timeout
//! enforcement, and error classification around one `ToolCall`.

use reactor_core::approval::ApprovalOutcome;
use reactor_core::config::ApprovalConfig;
use reactor_core::duration::DurationMs;
use reactor_core::hook::{ToolCallContext, ToolCallDecision, ToolCallOutcome};
use reactor_core::id::RunId;
use reactor_core::tool::{ToolCall, ToolResult};
use reactor_hooks::HookChain;
use reactor_tool::ToolRegistry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use uuid::Uuid;

/// Holds the outstanding oneshot senders for tool calls awaiting human
/// approval, keyed by the `PendingApproval` id the approval store handed
/// back. A store-backed approve/reject call looks up the id here and sends
/// the outcome to wake the waiting orchestrator call.
#[derive(Default)]
pub struct ApprovalRegistry {
    waiters: Mutex<HashMap<Uuid, oneshot::Sender<ApprovalOutcome>>>,
}

impl ApprovalRegistry {
    /// Build an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending wait, returning the receiver half.
    pub fn register(&self, id: Uuid) -> oneshot::Receiver<ApprovalOutcome> {
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().expect("approval registry poisoned").insert(id, tx);
        rx
    }

    /// Resolve a pending wait with the given outcome. No-op if nothing is
    /// waiting on this id (e.g. it already timed out).
    pub fn resolve(&self, id: Uuid, outcome: ApprovalOutcome) {
        if let Some(tx) = self.waiters.lock().expect("approval registry poisoned").remove(&id) {
            let _ = tx.send(outcome);
        }
    }

    fn forget(&self, id: &Uuid) {
        self.waiters.lock().expect("approval registry poisoned").remove(id);
    }
}

/// Error classification inferred from a failing tool's message, matching
/// the vocabulary callers commonly grep logs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolFailureKind {
    /// The tool's own operation timed out internally.
    TimeoutException,
    /// A network/connection failure.
    ConnectionException,
    /// The tool refused due to a permission check.
    PermissionDenied,
    /// Anything else.
    RuntimeException,
}

fn classify_failure(message: &str) -> ToolFailureKind {
    let lower = message.to_ascii_lowercase();
    if lower.contains("timeout") {
        ToolFailureKind::TimeoutException
    } else if lower.contains("connection") {
        ToolFailureKind::ConnectionException
    } else if lower.contains("permission") {
        ToolFailureKind::PermissionDenied
    } else {
        ToolFailureKind::RuntimeException
    }
}

/// Runs the before/call/after lifecycle for one tool call.
///
/// Holds its collaborators by `Arc` rather than by reference so a single
/// orchestrator can be shared across the sibling tasks that dispatch one
/// assistant turn's tool calls concurrently.
#[derive(Clone)]
pub struct ToolOrchestrator {
    registry: Arc<ToolRegistry>,
    hooks: Arc<HookChain>,
    approvals: Arc<ApprovalRegistry>,
    approval_config: Arc<ApprovalConfig>,
    tool_call_timeout: Duration,
}

impl ToolOrchestrator {
    /// Build an orchestrator over the given collaborators.
    pub fn new(
        registry: Arc<ToolRegistry>,
        hooks: Arc<HookChain>,
        approvals: Arc<ApprovalRegistry>,
        approval_config: Arc<ApprovalConfig>,
        tool_call_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            hooks,
            approvals,
            approval_config,
            tool_call_timeout,
        }
    }

    /// Dispatch one tool call end to end, returning the outcome that feeds
    /// back into both the after-tool hook point and the engine's response
    /// message construction.
    pub async fn dispatch(&self, run_id: &RunId, call: ToolCall) -> ToolCallOutcome {
        let started = Instant::now();

        let Some(tool) = self.registry.get(&call.tool_name).cloned() else {
            let message = format!("Tool '{}' not found", call.tool_name);
            let kind = classify_failure(&message);
            let result = ToolResult::error(call.id.clone(), message, DurationMs::from(started.elapsed()));
            return ToolCallOutcome {
                result,
                hitl_required: false,
                hitl_wait_ms: None,
                hitl_approved: None,
                failure_kind: Some(format!("{kind:?}")),
            };
        };

        let requires_approval = tool.requires_approval()
            || self.approval_config.tool_names.iter().any(|n| n == &call.tool_name);
        let ctx = ToolCallContext {
            run_id: run_id.clone(),
            tool_call: call.clone(),
            requires_approval,
        };

        let decision = self.hooks.dispatch_before_tool(&ctx).await;
        let (approval_id, mut hitl_wait_ms, mut hitl_approved) = match decision {
            ToolCallDecision::Reject(reason) => {
                let kind = classify_failure(&reason);
                let result = ToolResult::error(call.id.clone(), reason, DurationMs::from(started.elapsed()));
                return ToolCallOutcome {
                    result,
                    hitl_required: requires_approval,
                    hitl_wait_ms: None,
                    hitl_approved: Some(false),
                    failure_kind: Some(format!("{kind:?}")),
                };
            }
            ToolCallDecision::PendingApproval(id) => (Some(id), None, None),
            ToolCallDecision::Continue => (None, None, None),
        };

        let mut effective_arguments = call.arguments.clone();
        if let Some(id) = approval_id {
            let wait_started = Instant::now();
            let rx = self.approvals.register(id);
            let timeout = Duration::from_millis(self.approval_config.timeout_ms);
            let outcome = match tokio::time::timeout(timeout, rx).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(_)) | Err(_) => {
                    self.approvals.forget(&id);
                    ApprovalOutcome::TimedOut
                }
            };
            hitl_wait_ms = Some(wait_started.elapsed().as_millis() as u64);
            match outcome {
                ApprovalOutcome::Approved { arguments } => {
                    hitl_approved = Some(true);
                    effective_arguments = arguments;
                }
                ApprovalOutcome::Rejected { reason } => {
                    let message = reason.unwrap_or_else(|| "rejected by reviewer".to_string());
                    let kind = classify_failure(&message);
                    let result = ToolResult::error(call.id.clone(), message, DurationMs::from(started.elapsed()));
                    return ToolCallOutcome {
                        result,
                        hitl_required: true,
                        hitl_wait_ms,
                        hitl_approved: Some(false),
                        failure_kind: Some(format!("{kind:?}")),
                    };
                }
                ApprovalOutcome::TimedOut => {
                    let result = ToolResult::error(
                        call.id.clone(),
                        "approval timed out",
                        DurationMs::from(started.elapsed()),
                    );
                    return ToolCallOutcome {
                        result,
                        hitl_required: true,
                        hitl_wait_ms,
                        hitl_approved: Some(false),
                        failure_kind: Some(format!("{:?}", ToolFailureKind::TimeoutException)),
                    };
                }
            }
        }

        let call_future = tool.call(effective_arguments);
        let call_result = tokio::time::timeout(self.tool_call_timeout, call_future).await;

        let (result, failure_kind) = match call_result {
            Ok(Ok(value)) => {
                let output = serde_json::to_string(&value).unwrap_or_else(|_| value.to_string());
                (ToolResult::ok(call.id.clone(), output, DurationMs::from(started.elapsed())), None)
            }
            Ok(Err(err)) => {
                let kind = classify_failure(&err.to_string());
                let result = ToolResult::error(call.id.clone(), err.to_string(), DurationMs::from(started.elapsed()));
                (result, Some(format!("{kind:?}")))
            }
            Err(_) => {
                let result = ToolResult::error(
                    call.id.clone(),
                    "timeout: tool call exceeded the configured deadline",
                    DurationMs::from(started.elapsed()),
                );
                (result, Some(format!("{:?}", ToolFailureKind::TimeoutException)))
            }
        };

        let outcome = ToolCallOutcome {
            result,
            hitl_required: requires_approval,
            hitl_wait_ms,
            hitl_approved,
            failure_kind,
        };
        self.hooks.dispatch_after_tool(&ctx, &outcome).await;
        outcome
    }
}
