#![deny(missing_docs)]
//! The ReAct Loop Executor for the Arc Reactor agent runtime.
//!
//! [`Engine<P>`](engine::Engine) drives one `AgentCommand` through the
//! reason/act/observe cycle: guard and quota checks, hook dispatch,
//! conversation-history assembly (with hierarchical summarization and
//! stable-history trimming), a provider call, tool orchestration on
//! `StopReason::ToolUse`, and structured-output validation with a single
//! repair attempt on the terminal response. [`streaming::run_streaming`]
//! runs the same loop but emits [`streaming::StreamEvent`]s as it goes,
//! for response formats that support incremental delivery.

pub mod convert;
pub mod engine;
pub mod orchestrator;
pub mod retry;
pub mod streaming;
pub mod structured;
pub mod summary;

pub use engine::{Engine, EngineBuilder};
pub use orchestrator::{ApprovalRegistry, ToolOrchestrator};
pub use retry::RetryPolicy;
pub use streaming::{run_streaming, StreamEvent};
pub use summary::{NullSummaryService, ProviderSummaryService, SummaryService};
