//! The engine's configuration surface.
//!
//! Plain, serializable structs with a hand-written `Default` impl encoding
//! the documented defaults — the engine itself never reads a config file;
//! a host application may load overrides via any `serde`-compatible format
//! and hand the engine the resulting struct.

use serde::{Deserialize, Serialize};

/// Tool selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolSelectionStrategy {
    /// Expose every registered tool.
    All,
    /// Narrow by keyword match against tool categories.
    Keyword,
    /// Narrow by embedding cosine similarity.
    Semantic,
}

/// Retry policy for transient model-call failures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay_ms: u64,
    /// Multiplier applied to the delay after each retry.
    pub multiplier: f64,
    /// Upper bound on the backoff delay.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            multiplier: 2.0,
            max_delay_ms: 10_000,
        }
    }
}

/// Guard pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Whether the guard pipeline runs at all.
    pub enabled: bool,
    /// Per-user requests allowed per rolling minute.
    pub requests_per_minute: u32,
    /// Per-user requests allowed per rolling hour.
    pub requests_per_hour: u32,
    /// Maximum accepted `user_prompt` length, in characters.
    pub max_input_length: usize,
    /// Whether the injection-detection stage runs.
    pub injection_detection: bool,
    /// Whether the Unicode NFKC normalization stage runs.
    pub unicode_normalization: bool,
    /// Maximum tolerated ratio of zero-width characters before rejection.
    pub max_zero_width_ratio: f64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: 10,
            requests_per_hour: 100,
            max_input_length: 10_000,
            injection_detection: true,
            unicode_normalization: true,
            max_zero_width_ratio: 0.1,
        }
    }
}

/// Concurrency and timeout configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Maximum number of requests executing at once, engine-wide.
    pub max_concurrent_requests: u32,
    /// Request-level timeout.
    pub request_timeout_ms: u64,
    /// Per-tool-call timeout, used when a `ToolSpec` has no override.
    pub tool_call_timeout_ms: u64,
    /// Maximum number of tool calls from a single assistant turn that run
    /// concurrently.
    pub max_parallel_tool_calls: u32,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 20,
            request_timeout_ms: 30_000,
            tool_call_timeout_ms: 15_000,
            max_parallel_tool_calls: 4,
        }
    }
}

/// Tool selection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSelectionConfig {
    /// Which strategy narrows the exposed tool set.
    pub strategy: ToolSelectionStrategy,
    /// Minimum cosine similarity for the Semantic strategy.
    pub similarity_threshold: f64,
    /// Maximum tools returned by the Semantic strategy.
    pub max_results: usize,
}

impl Default for ToolSelectionConfig {
    fn default() -> Self {
        Self {
            strategy: ToolSelectionStrategy::All,
            similarity_threshold: 0.3,
            max_results: 10,
        }
    }
}

/// Hierarchical-summary configuration for the Conversation Manager.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Whether hierarchical summarization is enabled.
    pub enabled: bool,
    /// Message count above which summarization kicks in.
    pub trigger_message_count: usize,
    /// Number of most-recent messages always kept verbatim.
    pub recent_message_count: usize,
    /// Soft cap on the narrative's token length.
    pub max_narrative_tokens: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            trigger_message_count: 20,
            recent_message_count: 10,
            max_narrative_tokens: 500,
        }
    }
}

/// Circuit breaker configuration, shared by every protected call site
/// (quota layers, remote tool calls, the model provider).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures in `Closed` before tripping to `Open`.
    pub failure_threshold: u32,
    /// How long `Open` rejects calls before moving to `HalfOpen`.
    pub reset_timeout_ms: u64,
    /// Trial calls allowed while `HalfOpen`.
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_ms: 30_000,
            half_open_max_calls: 1,
        }
    }
}

/// Human-in-the-loop approval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Whether any tool requires approval.
    pub enabled: bool,
    /// How long a pending approval waits before timing out.
    pub timeout_ms: u64,
    /// Tool names that require approval when `enabled`.
    pub tool_names: Vec<String>,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_ms: 300_000,
            tool_names: Vec::new(),
        }
    }
}

/// The engine's full configuration surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum tool invocations across an entire execution.
    pub max_tool_calls: u32,
    /// Maximum tools exposed to the model per request.
    pub max_tools_per_request: usize,
    /// Sampling temperature passed to the model.
    pub temperature: f64,
    /// Maximum tokens requested per model call.
    pub max_output_tokens: u32,
    /// Context window budget used for trimming.
    pub max_context_window_tokens: u32,
    /// Maximum conversation turns kept when summarization is disabled.
    pub max_conversation_turns: u32,
    /// Retry policy for transient model-call failures.
    pub retry: RetryConfig,
    /// Guard pipeline configuration.
    pub guard: GuardConfig,
    /// Concurrency and timeout configuration.
    pub concurrency: ConcurrencyConfig,
    /// Tool selection configuration.
    pub tool_selection: ToolSelectionConfig,
    /// Hierarchical-summary configuration.
    pub summary: SummaryConfig,
    /// Circuit breaker configuration.
    pub circuit_breaker: CircuitBreakerConfig,
    /// Human-in-the-loop approval configuration.
    pub approval: ApprovalConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_tool_calls: 10,
            max_tools_per_request: 20,
            temperature: 0.3,
            max_output_tokens: 4096,
            max_context_window_tokens: 128_000,
            max_conversation_turns: 10,
            retry: RetryConfig::default(),
            guard: GuardConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            tool_selection: ToolSelectionConfig::default(),
            summary: SummaryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            approval: ApprovalConfig::default(),
        }
    }
}
