//! The engine's error taxonomy.

use crate::result::ErrorCode;
use thiserror::Error;

/// Top-level engine error. Every variant maps to exactly one `ErrorCode`
/// via [`EngineError::code`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EngineError {
    /// The guard pipeline's rate-limit stage rejected the request.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Some guard stage other than rate-limit rejected the request.
    #[error("rejected by guard stage '{stage}': {reason}")]
    GuardRejected {
        /// Name of the rejecting stage.
        stage: String,
        /// Reason given by the stage.
        reason: String,
    },

    /// The request-level timeout elapsed.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The execution was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// The trimmed conversation still exceeds the context budget.
    #[error("context too long: {0}")]
    ContextTooLong(String),

    /// A tool call failed in a way the loop could not recover from.
    #[error("tool error in '{tool}': {message}")]
    ToolError {
        /// Name of the failing tool.
        tool: String,
        /// Error message.
        message: String,
    },

    /// A circuit breaker guarding the model or a dependent service was open.
    #[error("circuit breaker open: {0}")]
    CircuitBreakerOpen(String),

    /// The terminal response failed structured-output validation after the
    /// single repair attempt.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The tenant's quota was exhausted.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The caller was not authorized for this request.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Catch-all for errors that don't fit any other variant.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl EngineError {
    /// Map this error to its closed `ErrorCode`.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::RateLimited(_) => ErrorCode::RateLimited,
            EngineError::GuardRejected { .. } => ErrorCode::GuardRejected,
            EngineError::Timeout(_) => ErrorCode::Timeout,
            EngineError::Cancelled => ErrorCode::Cancelled,
            EngineError::ContextTooLong(_) => ErrorCode::ContextTooLong,
            EngineError::ToolError { .. } => ErrorCode::ToolError,
            EngineError::CircuitBreakerOpen(_) => ErrorCode::CircuitBreakerOpen,
            EngineError::InvalidResponse(_) => ErrorCode::InvalidResponse,
            EngineError::QuotaExceeded(_) => ErrorCode::QuotaExceeded,
            EngineError::Unauthorized(_) => ErrorCode::Unauthorized,
            EngineError::Other(_) => ErrorCode::Unknown,
        }
    }

    /// Whether this error represents a cancellation, which must never be
    /// retried or swallowed by fail-open logic.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }
}

/// Errors from tool registry and invocation operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found in the registry.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// Tool execution failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The input provided to the tool was invalid.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from guard pipeline stages.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GuardError {
    /// A stage rejected the request outright.
    #[error("rejected: {0}")]
    Rejected(String),

    /// A stage failed unexpectedly. Per the fail-closed contract this is
    /// still surfaced to callers as a rejection, never as `Allowed`.
    #[error("stage failed: {0}")]
    StageFailed(String),
}

/// Errors from hook execution.
///
/// These are logged and, unless the hook is `fail_on_error`, do not halt
/// the execution.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HookError {
    /// The hook failed.
    #[error("hook failed: {0}")]
    Failed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Resolves an `EngineError` to a user-visible message, allowing adapters
/// to localize without the engine hard-coding any presentation strings.
pub trait ErrorMessageResolver: Send + Sync {
    /// Produce the message to attach to an `AgentResult::error_message`.
    fn resolve(&self, error: &EngineError) -> String;
}

/// The engine's built-in resolver: returns the error's `Display` text
/// verbatim, in English.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultResolver;

impl ErrorMessageResolver for DefaultResolver {
    fn resolve(&self, error: &EngineError) -> String {
        error.to_string()
    }
}
