#![deny(missing_docs)]
//! Context management for the agent runtime: token estimation and
//! compaction strategies for per-call provider messages, plus persistent
//! prompt construction and stable conversation-history trimming.
//!
//! [`sliding_window::SlidingWindow`], [`tool_result_clearing::ToolResultClearing`],
//! and [`composite::Composite`] implement
//! `reactor_turn::context::ContextStrategy` and operate on a single
//! provider call's message list. `NoCompaction` lives in `reactor-turn`
//! itself. [`trimmer::MessageTrimmer`] instead operates on the stable,
//! persisted conversation history kept by a `MemoryStore` across turns.

pub mod composite;
pub mod counter;
pub mod injector;
pub mod persistent;
pub mod sliding_window;
pub mod tool_result_clearing;
pub mod trimmer;

pub use composite::Composite;
pub use counter::TokenCounter;
pub use injector::{InjectionTrigger, SystemInjector};
pub use persistent::{ContextSection, PersistentContext};
pub use sliding_window::SlidingWindow;
pub use tool_result_clearing::ToolResultClearing;
pub use trimmer::MessageTrimmer;
