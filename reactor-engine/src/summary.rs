//! Hierarchical conversation summarization, triggered by the ReAct Loop
//! Executor once a session's message count crosses
//! `SummaryConfig::trigger_message_count`.
//!
//! Grounded on the teacher's `neuron-context::SummarizationStrategy`
//! pattern: partition old messages out, summarize them with a model call,
//! splice the summary back in as a system-level prelude. Here that pattern
//! moves up to the engine layer since it needs both the stable message
//! history and a live provider, neither of which `reactor-context` owns.

use reactor_core::config::SummaryConfig;
use reactor_core::message::Message;
use reactor_core::summary::ConversationSummary;
use reactor_turn::provider::{Provider, ProviderError};
use reactor_turn::types::{ContentPart, ProviderMessage, ProviderRequest, Role};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Decides whether and how a session's history gets folded into a
/// [`ConversationSummary`].
pub trait SummaryService: Send + Sync {
    /// Possibly produce an updated summary for `session_id`.
    ///
    /// Returns `None` when summarization doesn't trigger, or when it's
    /// attempted but fails — summarization is an optimization, never a
    /// precondition for the loop to proceed.
    fn maybe_summarize<'a>(
        &'a self,
        session_id: &'a str,
        messages: &'a [Message],
        existing: Option<&'a ConversationSummary>,
    ) -> Pin<Box<dyn Future<Output = Option<ConversationSummary>> + Send + 'a>>;
}

/// A summary service that never summarizes. The default when
/// `SummaryConfig::enabled` is false.
pub struct NullSummaryService;

impl SummaryService for NullSummaryService {
    fn maybe_summarize<'a>(
        &'a self,
        _session_id: &'a str,
        _messages: &'a [Message],
        _existing: Option<&'a ConversationSummary>,
    ) -> Pin<Box<dyn Future<Output = Option<ConversationSummary>> + Send + 'a>> {
        Box::pin(async { None })
    }
}

/// Summarizes via a provider call once a session's message count exceeds
/// `trigger_message_count`, keeping the most recent `recent_message_count`
/// messages verbatim and folding everything older into the narrative.
pub struct ProviderSummaryService<P: Provider> {
    provider: Arc<P>,
    config: SummaryConfig,
}

impl<P: Provider> ProviderSummaryService<P> {
    /// Build a summary service over the given provider and configuration.
    pub fn new(provider: Arc<P>, config: SummaryConfig) -> Self {
        Self { provider, config }
    }

    async fn summarize(&self, messages: &[Message], existing: Option<&ConversationSummary>) -> Option<ConversationSummary> {
        let cut = messages.len().saturating_sub(self.config.recent_message_count);
        if cut == 0 {
            return None;
        }
        let to_fold = &messages[..cut];

        let mut prompt = String::from(
            "Summarize the following conversation excerpt into a short prose narrative. \
             Preserve concrete facts (names, numbers, decisions) a later turn might need. \
             Respond with prose only, no preamble.\n\n",
        );
        if let Some(prior) = existing {
            if !prior.narrative.is_empty() {
                prompt.push_str("Prior summary:\n");
                prompt.push_str(&prior.narrative);
                prompt.push_str("\n\n");
            }
        }
        for message in to_fold {
            prompt.push_str(&format!("{:?}: {}\n", message.role, message.content));
        }

        let request = ProviderRequest {
            model: None,
            messages: vec![ProviderMessage {
                role: Role::User,
                content: vec![ContentPart::Text { text: prompt }],
            }],
            tools: Vec::new(),
            max_tokens: Some(512),
            temperature: Some(0.0),
            system: Some("You compress conversation history for a memory-constrained assistant.".to_string()),
            extra: serde_json::Value::Null,
        };

        match self.provider.complete(request).await {
            Ok(response) => {
                let narrative = response
                    .content
                    .iter()
                    .filter_map(|part| match part {
                        ContentPart::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                let narrative = truncate_narrative(&narrative, self.config.max_narrative_tokens);
                let facts = existing.map(|s| s.facts.clone()).unwrap_or_default();
                Some(ConversationSummary::new(narrative, facts, cut))
            }
            Err(err) => {
                tracing::warn!(error = %err, "summarization provider call failed, skipping");
                None
            }
        }
    }
}

fn truncate_narrative(narrative: &str, max_tokens: usize) -> String {
    let max_chars = max_tokens.saturating_mul(4);
    if narrative.len() <= max_chars {
        return narrative.to_string();
    }
    let mut end = max_chars;
    while end > 0 && !narrative.is_char_boundary(end) {
        end -= 1;
    }
    narrative[..end].to_string()
}

impl<P: Provider + Send + Sync> SummaryService for ProviderSummaryService<P> {
    fn maybe_summarize<'a>(
        &'a self,
        _session_id: &'a str,
        messages: &'a [Message],
        existing: Option<&'a ConversationSummary>,
    ) -> Pin<Box<dyn Future<Output = Option<ConversationSummary>> + Send + 'a>> {
        Box::pin(async move {
            if !self.config.enabled {
                return None;
            }
            if messages.len() < self.config.trigger_message_count {
                return None;
            }
            if let Some(existing) = existing {
                let fold_boundary = messages.len().saturating_sub(self.config.recent_message_count);
                if fold_boundary <= existing.summarized_up_to_index {
                    return None;
                }
            }
            self.summarize(messages, existing).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactor_turn::types::{StopReason, TokenUsage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        calls: AtomicUsize,
    }

    impl Provider for StubProvider {
        fn complete(
            &self,
            _request: ProviderRequest,
        ) -> impl Future<Output = Result<reactor_turn::types::ProviderResponse, ProviderError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(reactor_turn::types::ProviderResponse {
                    content: vec![ContentPart::Text {
                        text: "the user asked about billing twice".into(),
                    }],
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::default(),
                    model: "stub".into(),
                    cost: None,
                    truncated: None,
                })
            }
        }
    }

    fn history(n: usize) -> Vec<Message> {
        (0..n).map(|i| Message::user(format!("message {i}"))).collect()
    }

    #[tokio::test]
    async fn null_service_never_summarizes() {
        let service = NullSummaryService;
        let messages = history(100);
        assert!(service.maybe_summarize("s1", &messages, None).await.is_none());
    }

    #[tokio::test]
    async fn provider_service_skips_below_trigger() {
        let provider = Arc::new(StubProvider { calls: AtomicUsize::new(0) });
        let config = SummaryConfig {
            enabled: true,
            trigger_message_count: 20,
            recent_message_count: 10,
            max_narrative_tokens: 500,
        };
        let service = ProviderSummaryService::new(provider, config);
        let messages = history(5);
        assert!(service.maybe_summarize("s1", &messages, None).await.is_none());
    }

    #[tokio::test]
    async fn provider_service_summarizes_above_trigger() {
        let provider = Arc::new(StubProvider { calls: AtomicUsize::new(0) });
        let config = SummaryConfig {
            enabled: true,
            trigger_message_count: 20,
            recent_message_count: 10,
            max_narrative_tokens: 500,
        };
        let service = ProviderSummaryService::new(provider, config);
        let messages = history(25);
        let summary = service.maybe_summarize("s1", &messages, None).await;
        assert!(summary.is_some());
        assert_eq!(summary.unwrap().summarized_up_to_index, 15);
    }

    #[tokio::test]
    async fn provider_service_skips_when_no_new_messages_past_existing_summary() {
        let provider = Arc::new(StubProvider { calls: AtomicUsize::new(0) });
        let config = SummaryConfig {
            enabled: true,
            trigger_message_count: 20,
            recent_message_count: 10,
            max_narrative_tokens: 500,
        };
        let service = ProviderSummaryService::new(provider.clone(), config);
        let messages = history(25);
        let existing = ConversationSummary::new("already summarized", vec![], 15);

        let summary = service.maybe_summarize("s1", &messages, Some(&existing)).await;
        assert!(summary.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0, "a second load with no new messages must not call the provider");
    }

    #[tokio::test]
    async fn provider_service_resummarizes_once_new_messages_push_past_boundary() {
        let provider = Arc::new(StubProvider { calls: AtomicUsize::new(0) });
        let config = SummaryConfig {
            enabled: true,
            trigger_message_count: 20,
            recent_message_count: 10,
            max_narrative_tokens: 500,
        };
        let service = ProviderSummaryService::new(provider.clone(), config);
        let messages = history(26);
        let existing = ConversationSummary::new("already summarized", vec![], 15);

        let summary = service.maybe_summarize("s1", &messages, Some(&existing)).await;
        assert!(summary.is_some());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_config_never_summarizes() {
        let provider = Arc::new(StubProvider { calls: AtomicUsize::new(0) });
        let config = SummaryConfig {
            enabled: false,
            ..SummaryConfig::default()
        };
        let service = ProviderSummaryService::new(provider, config);
        let messages = history(100);
        assert!(service.maybe_summarize("s1", &messages, None).await.is_none());
    }
}
