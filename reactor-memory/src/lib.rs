#![deny(missing_docs)]
//! In-memory implementations of `reactor_core::store`'s persistence
//! contracts: [`InMemoryMemoryStore`], [`InMemorySummaryStore`], and
//! [`InMemoryApprovalStore`].
//!
//! All three use a `HashMap` behind a `tokio::sync::RwLock` for concurrent
//! access. Suitable for testing, prototyping, and single-process
//! deployments where persistence across restarts is not required.

pub mod approval;
pub mod memory;
pub mod summary;

pub use approval::InMemoryApprovalStore;
pub use memory::InMemoryMemoryStore;
pub use summary::InMemorySummaryStore;
