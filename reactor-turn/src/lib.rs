#![deny(missing_docs)]
//! Provider abstraction and wire types consumed by the ReAct Loop Executor
//! (`reactor-engine`).
//!
//! Key traits defined here:
//! - [`Provider`] — LLM provider interface (not object-safe, uses RPITIT)
//! - [`ContextStrategy`] — context window management, independent of the
//!   token-budget trimming `reactor-context` performs on the stable
//!   message history; this one shapes what one provider call actually sends.

pub mod config;
pub mod context;
pub mod convert;
pub mod provider;
pub mod types;

// Re-exports
pub use config::TurnConfig;
pub use context::{ContextStrategy, NoCompaction};
pub use convert::{
    content_block_to_part, content_part_to_block, content_to_parts, content_to_user_message,
    parts_to_content,
};
pub use provider::{Provider, ProviderError};
pub use types::*;
