//! The ReAct Loop Executor: `Engine<P>::run` implements the full request
//! lifecycle — guard, quota, hooks, context assembly, the reason/act/observe
//! loop, structured-output repair, and persistence.

use crate::convert::{history_to_provider_messages, tool_spec_to_schema};
use crate::orchestrator::{ApprovalRegistry, ToolOrchestrator};
use crate::retry::RetryPolicy;
use crate::structured::validate_response_format;
use crate::summary::{NullSummaryService, SummaryService};
use reactor_context::trimmer::MessageTrimmer;
use reactor_core::command::AgentCommand;
use reactor_core::config::{EngineConfig, ToolSelectionStrategy as CoreToolSelectionStrategy};
use reactor_core::error::EngineError;
use reactor_core::hook::HookContext;
use reactor_core::id::{RunId, ANONYMOUS_USER};
use reactor_core::message::{Message, Role as CoreRole};
use reactor_core::metrics::{AgentExecutionEvent, TokenUsageEvent};
use reactor_core::result::{AgentResult, ErrorCode, TokenUsage};
use reactor_core::store::{ApprovalStore, MemoryStore, SummaryStore};
use reactor_core::tool::ToolCall;
use reactor_core::DurationMs;
use reactor_guard::GuardPipeline;
use reactor_hooks::HookChain;
use reactor_metrics::MetricEmitter;
use reactor_quota::{CircuitBreaker, QuotaEnforcer};
use reactor_tool::{SelectionStrategy as ToolSelectionStrategy, ToolRegistry, ToolSelector};
use reactor_turn::context::{ContextStrategy, NoCompaction};
use reactor_turn::provider::{Provider, ProviderError};
use reactor_turn::types::{ProviderRequest, StopReason};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Everything the engine needs beyond the provider: tools, hooks, guard,
/// quota, persistence, and configuration. Construct with [`EngineBuilder`].
pub struct Engine<P: Provider> {
    provider: Arc<P>,
    tools: Arc<ToolRegistry>,
    tool_selector: ToolSelector,
    hooks: Arc<HookChain>,
    guard: GuardPipeline,
    config: EngineConfig,
    context_strategy: Arc<dyn ContextStrategy>,
    memory: Arc<dyn MemoryStore>,
    summaries: Arc<dyn SummaryStore>,
    approvals: Arc<dyn ApprovalStore>,
    approval_registry: Arc<ApprovalRegistry>,
    provider_circuit: CircuitBreaker,
    metrics: Option<Arc<MetricEmitter>>,
    summary_service: Arc<dyn SummaryService>,
    quota: Option<Arc<QuotaEnforcer>>,
}

/// Builder for [`Engine`]. Every collaborator but the provider, memory
/// store, summary store, and approval store has a sensible default.
pub struct EngineBuilder<P: Provider> {
    provider: Arc<P>,
    tools: Arc<ToolRegistry>,
    tool_selector: ToolSelector,
    hooks: Arc<HookChain>,
    guard: GuardPipeline,
    config: EngineConfig,
    context_strategy: Arc<dyn ContextStrategy>,
    memory: Arc<dyn MemoryStore>,
    summaries: Arc<dyn SummaryStore>,
    approvals: Arc<dyn ApprovalStore>,
    metrics: Option<Arc<MetricEmitter>>,
    summary_service: Arc<dyn SummaryService>,
    quota: Option<Arc<QuotaEnforcer>>,
}

impl<P: Provider> EngineBuilder<P> {
    /// Start a builder over the given provider and persistence backends.
    pub fn new(
        provider: Arc<P>,
        memory: Arc<dyn MemoryStore>,
        summaries: Arc<dyn SummaryStore>,
        approvals: Arc<dyn ApprovalStore>,
    ) -> Self {
        let config = EngineConfig::default();
        Self {
            provider,
            tools: Arc::new(ToolRegistry::new()),
            tool_selector: ToolSelector::new(),
            hooks: Arc::new(HookChain::new()),
            guard: GuardPipeline::from_config(&config.guard),
            context_strategy: Arc::new(NoCompaction),
            config,
            memory,
            summaries,
            approvals,
            metrics: None,
            summary_service: Arc::new(NullSummaryService),
            quota: None,
        }
    }

    /// Set the engine configuration, rebuilding the guard pipeline from it.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.guard = GuardPipeline::from_config(&config.guard);
        self.config = config;
        self
    }

    /// Provide the tool registry this engine exposes to the model.
    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    /// Provide a semantic-capable tool selector. Defaults to keyword/all
    /// selection only.
    pub fn with_tool_selector(mut self, selector: ToolSelector) -> Self {
        self.tool_selector = selector;
        self
    }

    /// Provide the hook chain.
    pub fn with_hooks(mut self, hooks: Arc<HookChain>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Override the per-call context compaction strategy. Defaults to
    /// `SlidingWindow` behavior via `reactor-context`'s own construction;
    /// callers wanting a different strategy pass it here.
    pub fn with_context_strategy(mut self, strategy: Arc<dyn ContextStrategy>) -> Self {
        self.context_strategy = strategy;
        self
    }

    /// Attach a metric emitter. Without one, the engine emits no metrics.
    pub fn with_metrics(mut self, metrics: Arc<MetricEmitter>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Attach a summary service. Defaults to [`NullSummaryService`].
    pub fn with_summary_service(mut self, service: Arc<dyn SummaryService>) -> Self {
        self.summary_service = service;
        self
    }

    /// Attach per-tenant quota enforcement. Without one, the engine runs
    /// with no quota check — per-tenant monthly limits are a host
    /// integration concern, not something `EngineConfig` encodes.
    pub fn with_quota(mut self, quota: Arc<QuotaEnforcer>) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Finish construction.
    pub fn build(self) -> Engine<P> {
        let breaker_cfg = self.config.circuit_breaker;
        Engine {
            provider: self.provider,
            tools: self.tools,
            tool_selector: self.tool_selector,
            hooks: self.hooks,
            guard: self.guard,
            config: self.config,
            context_strategy: self.context_strategy,
            memory: self.memory,
            summaries: self.summaries,
            approvals: self.approvals,
            approval_registry: Arc::new(ApprovalRegistry::new()),
            provider_circuit: CircuitBreaker::new(
                breaker_cfg.failure_threshold,
                std::time::Duration::from_millis(breaker_cfg.reset_timeout_ms),
                breaker_cfg.half_open_max_calls,
            ),
            metrics: self.metrics,
            summary_service: self.summary_service,
            quota: self.quota,
        }
    }
}

fn bridge_selection_strategy(strategy: CoreToolSelectionStrategy) -> ToolSelectionStrategy {
    match strategy {
        CoreToolSelectionStrategy::All => ToolSelectionStrategy::All,
        CoreToolSelectionStrategy::Keyword => ToolSelectionStrategy::Keyword,
        CoreToolSelectionStrategy::Semantic => ToolSelectionStrategy::Semantic,
    }
}

impl<P: Provider> Engine<P> {
    /// Approvals pending against this engine; callers (e.g. an HTTP
    /// approve/reject endpoint) use this to wake a suspended tool call.
    pub fn approval_registry(&self) -> &Arc<ApprovalRegistry> {
        &self.approval_registry
    }

    /// Run one request end to end.
    pub async fn run(&self, command: AgentCommand) -> AgentResult {
        let started = Instant::now();
        let run_id = RunId::new(Uuid::new_v4().to_string());
        let tenant_id = command.tenant_id().unwrap_or("unknown").to_string();
        let user_id = command.user_id().unwrap_or(ANONYMOUS_USER).to_string();
        let session_id = command.session_id().map(str::to_string);

        let result = self.run_inner(&run_id, &command, started).await;

        let mut hook_ctx = HookContext::new(run_id.clone(), command.user_prompt.clone());
        hook_ctx.user_id = Some(user_id);
        hook_ctx.channel = command.channel().map(str::to_string);
        self.hooks.dispatch_after_complete(&hook_ctx, &result).await;

        if let Some(metrics) = &self.metrics {
            metrics.publish(reactor_core::metrics::MetricEvent::AgentExecution(AgentExecutionEvent {
                tenant_id,
                run_id: run_id.clone(),
                timestamp: std::time::SystemTime::now(),
                success: result.success,
                duration: result.duration,
                error_code: result.error_code.map(|c| format!("{c:?}")),
            }));
        }
        let _ = session_id;
        result
    }

    async fn run_inner(&self, run_id: &RunId, command: &AgentCommand, started: Instant) -> AgentResult {
        let guard_decision = self.guard.evaluate(command).await;
        if !guard_decision.is_allowed() {
            let (reason, stage) = match guard_decision {
                reactor_guard::GuardDecision::Rejected { reason, stage, .. } => (reason, stage),
                reactor_guard::GuardDecision::Allowed { .. } => unreachable!(),
            };
            return AgentResult::failure(
                ErrorCode::GuardRejected,
                format!("rejected by guard stage '{stage}': {reason}"),
                DurationMs::from(started.elapsed()),
            );
        }

        let tenant_id = command.tenant_id().unwrap_or("unknown");
        if let Some(quota) = self.quota_enforcer() {
            if let Err(err) = quota.check_and_record(tenant_id).await {
                return AgentResult::failure(
                    ErrorCode::QuotaExceeded,
                    err.to_string(),
                    DurationMs::from(started.elapsed()),
                );
            }
        }

        let user_id = command.user_id().unwrap_or(ANONYMOUS_USER).to_string();
        let mut hook_ctx = HookContext::new(run_id.clone(), command.user_prompt.clone());
        hook_ctx.user_id = Some(user_id.clone());
        hook_ctx.channel = command.channel().map(str::to_string);
        match self.hooks.dispatch_before_start(&hook_ctx).await {
            reactor_core::hook::AgentStartDecision::Reject(reason) => {
                return AgentResult::failure(ErrorCode::GuardRejected, reason, DurationMs::from(started.elapsed()));
            }
            reactor_core::hook::AgentStartDecision::Continue => {}
        }

        let session_id = command.session_id().unwrap_or_else(|| run_id.as_str()).to_string();

        let mut history = match &command.conversation_history {
            Some(history) => history.clone(),
            None => match self.memory.get(&session_id).await {
                Ok(history) => history,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to load conversation history, starting empty");
                    Vec::new()
                }
            },
        };

        let existing_summary = self.summaries.get(&session_id).await.ok().flatten();
        if let Some(summary) = self
            .summary_service
            .maybe_summarize(&session_id, &history, existing_summary.as_ref())
            .await
        {
            if let Err(err) = self.summaries.save(&session_id, summary).await {
                tracing::warn!(error = %err, "failed to persist conversation summary");
            }
        }
        let summary = self.summaries.get(&session_id).await.ok().flatten();

        let trimmer = MessageTrimmer::new(self.config.max_conversation_turns as usize);
        history = trimmer.trim(history);

        let user_message = Message::user(command.user_prompt.clone());
        if command.conversation_history.is_none() {
            if let Err(err) = self.memory.add_message(&session_id, user_message.clone(), &user_id).await {
                tracing::warn!(error = %err, "failed to persist user message");
            }
        }
        history.push(user_message);

        let mut system_prompt = command.system_prompt.clone();
        if let Some(summary) = &summary {
            let facts = summary.facts_block();
            let narrative = summary.narrative_block();
            if !facts.is_empty() {
                system_prompt.push_str("\n\n");
                system_prompt.push_str(&facts);
            }
            if !narrative.is_empty() {
                system_prompt.push_str("\n\n");
                system_prompt.push_str(&narrative);
            }
        }

        let strategy = bridge_selection_strategy(self.config.tool_selection.strategy);
        let selected_tools = self
            .tool_selector
            .select(
                &self.tools,
                &command.user_prompt,
                strategy,
                self.config.tool_selection.similarity_threshold as f32,
                self.config.tool_selection.max_results.min(self.config.max_tools_per_request),
            )
            .await;
        let tool_schemas: Vec<_> = selected_tools.iter().map(|t| tool_spec_to_schema(&reactor_tool::to_spec(t.as_ref()))).collect();

        let tool_calls_used = Arc::new(AtomicU32::new(0));
        let max_tool_calls = command.max_tool_calls.unwrap_or(self.config.max_tool_calls);
        let retry = RetryPolicy::new(self.config.retry);
        let approval_config = Arc::new(self.config.approval.clone());
        let tool_call_timeout = std::time::Duration::from_millis(self.config.concurrency.tool_call_timeout_ms);
        let orchestrator = ToolOrchestrator::new(
            Arc::clone(&self.tools),
            Arc::clone(&self.hooks),
            Arc::clone(&self.approval_registry),
            Arc::clone(&approval_config),
            tool_call_timeout,
        );

        let mut token_usage = TokenUsage::default();
        let mut tools_used: Vec<String> = Vec::new();

        for iteration in 0..=max_tool_calls {
            let provider_messages = history_to_provider_messages(&history);
            let expose_tools = iteration < max_tool_calls;

            let request = ProviderRequest {
                model: command.model.clone(),
                messages: provider_messages,
                tools: if expose_tools { tool_schemas.clone() } else { Vec::new() },
                max_tokens: Some(self.config.max_output_tokens),
                temperature: Some(self.config.temperature),
                system: Some(system_prompt.clone()),
                extra: serde_json::Value::Null,
            };

            if !self.provider_circuit.allow_call() {
                return AgentResult::failure(
                    ErrorCode::CircuitBreakerOpen,
                    "model provider circuit breaker is open",
                    DurationMs::from(started.elapsed()),
                );
            }

            let provider = Arc::clone(&self.provider);
            let response = retry
                .run(|| {
                    let provider = Arc::clone(&provider);
                    let request = request.clone();
                    async move { provider.complete(request).await }
                })
                .await;

            let response = match response {
                Ok(response) => {
                    self.provider_circuit.record_success();
                    response
                }
                Err(ProviderError::RateLimited) => {
                    self.provider_circuit.record_failure();
                    return AgentResult::failure(
                        ErrorCode::RateLimited,
                        "model provider rate limited the request",
                        DurationMs::from(started.elapsed()),
                    );
                }
                Err(err) => {
                    self.provider_circuit.record_failure();
                    return AgentResult::failure(
                        ErrorCode::Unknown,
                        err.to_string(),
                        DurationMs::from(started.elapsed()),
                    );
                }
            };

            token_usage.add(response.usage.input_tokens, response.usage.output_tokens);
            if let Some(metrics) = &self.metrics {
                metrics.publish(reactor_core::metrics::MetricEvent::TokenUsage(TokenUsageEvent {
                    tenant_id: tenant_id.to_string(),
                    run_id: run_id.clone(),
                    timestamp: std::time::SystemTime::now(),
                    prompt_tokens: response.usage.input_tokens,
                    completion_tokens: response.usage.output_tokens,
                    model: response.model.clone(),
                }));
            }

            match response.stop_reason {
                StopReason::ToolUse => {
                    let calls = extract_tool_calls(&response.content);
                    if calls.is_empty() {
                        let text = extract_text(&response.content);
                        return self
                            .finish(&session_id, &user_id, text, tools_used, token_usage, started, command)
                            .await;
                    }
                    let text = extract_text(&response.content);
                    let assistant_message = Message::assistant_with_tool_calls(text, calls.clone());
                    if command.conversation_history.is_none() {
                        if let Err(err) = self.memory.add_message(&session_id, assistant_message.clone(), &user_id).await {
                            tracing::warn!(error = %err, "failed to persist assistant message");
                        }
                    }
                    history.push(assistant_message);

                    let mut pending = Vec::new();
                    for call in calls {
                        if tool_calls_used.load(Ordering::SeqCst) >= max_tool_calls {
                            break;
                        }
                        tool_calls_used.fetch_add(1, Ordering::SeqCst);
                        pending.push(call);
                    }

                    let concurrency = self.config.concurrency.max_parallel_tool_calls.max(1) as usize;
                    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrency));
                    let mut join_set = tokio::task::JoinSet::new();
                    for call in pending {
                        let index = call.index;
                        let tool_name = call.tool_name.clone();
                        let semaphore = Arc::clone(&semaphore);
                        let orchestrator = orchestrator.clone();
                        let run_id = run_id.clone();
                        let permit = semaphore.acquire_owned().await.expect("semaphore closed");
                        join_set.spawn(async move {
                            let _permit = permit;
                            let outcome = orchestrator.dispatch(&run_id, call).await;
                            (index, tool_name, outcome)
                        });
                    }

                    let mut dispatched = Vec::new();
                    while let Some(joined) = join_set.join_next().await {
                        dispatched.push(joined.expect("tool dispatch task panicked"));
                    }
                    dispatched.sort_by_key(|(index, _, _)| *index);

                    for (_, tool_name, outcome) in dispatched {
                        tools_used.push(tool_name);
                        let tool_message = Message::tool(outcome.result.id.clone(), outcome.result.output.clone());
                        if command.conversation_history.is_none() {
                            if let Err(err) = self.memory.add_message(&session_id, tool_message.clone(), &user_id).await {
                                tracing::warn!(error = %err, "failed to persist tool message");
                            }
                        }
                        history.push(tool_message);
                    }
                }
                StopReason::EndTurn | StopReason::MaxTokens | StopReason::ContentFilter => {
                    let text = extract_text(&response.content);
                    return self
                        .finish(&session_id, &user_id, text, tools_used, token_usage, started, command)
                        .await;
                }
            }
        }

        AgentResult::failure(
            ErrorCode::Unknown,
            "exhausted max tool calls without a terminal response",
            DurationMs::from(started.elapsed()),
        )
    }

    async fn finish(
        &self,
        session_id: &str,
        user_id: &str,
        text: String,
        tools_used: Vec<String>,
        token_usage: TokenUsage,
        started: Instant,
        command: &AgentCommand,
    ) -> AgentResult {
        if let Err(message) = validate_response_format(command.response_format, &text) {
            let repair_prompt = format!(
                "Your previous response did not satisfy the required {:?} format: {message}. \
                 Respond again with only valid {:?} content.",
                command.response_format, command.response_format
            );
            let repaired = self.repair(session_id, user_id, command, &text, &repair_prompt).await;
            match repaired {
                Some((repaired_text, usage_delta)) => {
                    let mut token_usage = token_usage;
                    token_usage.add(usage_delta.0, usage_delta.1);
                    if validate_response_format(command.response_format, &repaired_text).is_err() {
                        return AgentResult::failure(
                            ErrorCode::InvalidResponse,
                            "response failed structured-output validation after repair attempt",
                            DurationMs::from(started.elapsed()),
                        );
                    }
                    return self.persist_and_succeed(session_id, user_id, repaired_text, tools_used, token_usage, started, command).await;
                }
                None => {
                    return AgentResult::failure(
                        ErrorCode::InvalidResponse,
                        format!("response failed structured-output validation: {message}"),
                        DurationMs::from(started.elapsed()),
                    );
                }
            }
        }
        self.persist_and_succeed(session_id, user_id, text, tools_used, token_usage, started, command).await
    }

    async fn persist_and_succeed(
        &self,
        session_id: &str,
        user_id: &str,
        text: String,
        tools_used: Vec<String>,
        token_usage: TokenUsage,
        started: Instant,
        command: &AgentCommand,
    ) -> AgentResult {
        let assistant_message = Message::assistant(text.clone());
        if command.conversation_history.is_none() {
            if let Err(err) = self.memory.add_message(session_id, assistant_message, user_id).await {
                tracing::warn!(error = %err, "failed to persist final assistant message");
            }
        }
        AgentResult::success(text, tools_used, token_usage, DurationMs::from(started.elapsed()))
    }

    async fn repair(
        &self,
        _session_id: &str,
        _user_id: &str,
        command: &AgentCommand,
        previous_text: &str,
        repair_prompt: &str,
    ) -> Option<(String, (u64, u64))> {
        let messages = vec![
            reactor_turn::types::ProviderMessage {
                role: reactor_turn::types::Role::Assistant,
                content: vec![reactor_turn::types::ContentPart::Text { text: previous_text.to_string() }],
            },
            reactor_turn::types::ProviderMessage {
                role: reactor_turn::types::Role::User,
                content: vec![reactor_turn::types::ContentPart::Text { text: repair_prompt.to_string() }],
            },
        ];
        let request = ProviderRequest {
            model: command.model.clone(),
            messages,
            tools: Vec::new(),
            max_tokens: Some(self.config.max_output_tokens),
            temperature: Some(0.0),
            system: Some(command.system_prompt.clone()),
            extra: serde_json::Value::Null,
        };
        match self.provider.complete(request).await {
            Ok(response) => {
                let text = extract_text(&response.content);
                Some((text, (response.usage.input_tokens, response.usage.output_tokens)))
            }
            Err(err) => {
                tracing::warn!(error = %err, "structured-output repair call failed");
                None
            }
        }
    }

    fn quota_enforcer(&self) -> Option<&QuotaEnforcer> {
        self.quota.as_deref()
    }
}

fn extract_tool_calls(content: &[reactor_turn::types::ContentPart]) -> Vec<ToolCall> {
    content
        .iter()
        .enumerate()
        .filter_map(|(index, part)| match part {
            reactor_turn::types::ContentPart::ToolUse { id, name, input } => Some(ToolCall {
                id: id.clone(),
                tool_name: name.clone(),
                arguments: input.clone(),
                index,
            }),
            _ => None,
        })
        .collect()
}

fn extract_text(content: &[reactor_turn::types::ContentPart]) -> String {
    content
        .iter()
        .filter_map(|part| match part {
            reactor_turn::types::ContentPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
