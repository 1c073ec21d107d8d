//! The engine's outbound response type and closed error taxonomy.

use crate::duration::DurationMs;
use serde::{Deserialize, Serialize};

/// Closed set of error codes an `AgentResult` may carry.
///
/// Intentionally `#[non_exhaustive]` at the Rust level even though the
/// contract promises a closed set: new variants are additive-only and a
/// future one should never silently change the meaning of an existing
/// match arm in a consumer that already handles `_`.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The guard pipeline's rate-limit stage rejected the request.
    RateLimited,
    /// Any guard stage rejected the request.
    GuardRejected,
    /// The request-level timeout elapsed.
    Timeout,
    /// The execution was cancelled.
    Cancelled,
    /// The trimmed conversation still exceeds the context budget.
    ContextTooLong,
    /// A tool call failed in a way the loop could not recover from.
    ToolError,
    /// A circuit breaker on the model or a dependent service was open.
    CircuitBreakerOpen,
    /// The terminal response failed structured-output validation twice.
    InvalidResponse,
    /// The tenant's quota was exhausted.
    QuotaExceeded,
    /// The caller was not authorized for this request.
    Unauthorized,
    /// An error that does not fit any other code.
    Unknown,
}

/// Token accounting for one execution.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt (system + history + user turn).
    pub prompt_tokens: u64,
    /// Tokens produced by the model across all turns of the loop.
    pub completion_tokens: u64,
    /// `prompt_tokens + completion_tokens`.
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Accumulate another turn's usage into this total.
    pub fn add(&mut self, prompt_tokens: u64, completion_tokens: u64) {
        self.prompt_tokens += prompt_tokens;
        self.completion_tokens += completion_tokens;
        self.total_tokens += prompt_tokens + completion_tokens;
    }
}

/// The result of one `execute` call.
///
/// Invariant: `success == true` iff `error_code.is_none() && content.is_some()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    /// Whether the execution produced a usable terminal response.
    pub success: bool,
    /// The terminal response text, when `success` is true.
    pub content: Option<String>,
    /// The closed error code, when `success` is false.
    pub error_code: Option<ErrorCode>,
    /// A human-readable (and localizable, via `ErrorMessageResolver`) error
    /// message, when `success` is false.
    pub error_message: Option<String>,
    /// Names of tools invoked during this execution, in the order their
    /// TOOL replies were appended to the transcript.
    pub tools_used: Vec<String>,
    /// Aggregate token accounting across every model call in the loop.
    pub token_usage: TokenUsage,
    /// Total wall time for the execution.
    pub duration: DurationMs,
}

impl AgentResult {
    /// Construct a successful result.
    pub fn success(content: impl Into<String>, tools_used: Vec<String>, token_usage: TokenUsage, duration: DurationMs) -> Self {
        Self {
            success: true,
            content: Some(content.into()),
            error_code: None,
            error_message: None,
            tools_used,
            token_usage,
            duration,
        }
    }

    /// Construct a failed result.
    pub fn failure(code: ErrorCode, message: impl Into<String>, duration: DurationMs) -> Self {
        Self {
            success: false,
            content: None,
            error_code: Some(code),
            error_message: Some(message.into()),
            tools_used: Vec::new(),
            token_usage: TokenUsage::default(),
            duration,
        }
    }

    /// Whether this result respects invariant 1 from the testable
    /// properties: `success` and `error_code`/`content` are consistent.
    pub fn is_internally_consistent(&self) -> bool {
        if self.success {
            self.error_code.is_none() && self.content.is_some()
        } else {
            self.error_code.is_some()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_result_is_consistent() {
        let r = AgentResult::success("4", vec![], TokenUsage::default(), DurationMs::from_millis(1));
        assert!(r.is_internally_consistent());
    }

    #[test]
    fn failure_result_is_consistent() {
        let r = AgentResult::failure(ErrorCode::RateLimited, "too many requests", DurationMs::ZERO);
        assert!(r.is_internally_consistent());
        assert!(!r.success);
    }

    #[test]
    fn token_usage_accumulates() {
        let mut usage = TokenUsage::default();
        usage.add(10, 5);
        usage.add(3, 2);
        assert_eq!(usage.prompt_tokens, 13);
        assert_eq!(usage.completion_tokens, 7);
        assert_eq!(usage.total_tokens, 20);
    }
}
