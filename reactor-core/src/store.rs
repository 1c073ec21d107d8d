//! Pluggable persistence contracts consumed by the Conversation Manager.
//!
//! The engine owns no on-disk format; it composes implementations of these
//! three traits. `reactor-memory` ships in-memory implementations suitable
//! for testing and single-process deployments.

use crate::approval::PendingApproval;
use crate::message::Message;
use crate::summary::ConversationSummary;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Errors from memory, summary, and approval store operations.
///
/// Per the engine's fail-open persistence policy, callers on the save path
/// log this and continue rather than surface it to the caller's result.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists for the given key.
    #[error("not found: {0}")]
    NotFound(String),

    /// Catch-all for backend-specific failures.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Conversation history storage, scoped by session.
///
/// Implementations enforce per-user isolation: [`MemoryStore::list_sessions_by_user_id`]
/// returns only sessions whose every message carries the given user id, and
/// [`MemoryStore::get_session_owner`] reports the user id of the first
/// message (or `"anonymous"` if the session has none yet / none set one).
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Load every message recorded for a session, oldest first.
    async fn get(&self, session_id: &str) -> Result<Vec<Message>, StoreError>;

    /// Append a message to a session, attributing it to `user_id`.
    ///
    /// Implementations trim the stored session to their configured
    /// `max_messages_per_session` after appending, dropping the oldest
    /// messages first.
    async fn add_message(
        &self,
        session_id: &str,
        message: Message,
        user_id: &str,
    ) -> Result<(), StoreError>;

    /// List every known session id.
    async fn list_sessions(&self) -> Result<Vec<String>, StoreError>;

    /// List session ids every one of whose messages was authored by `user_id`.
    async fn list_sessions_by_user_id(&self, user_id: &str) -> Result<Vec<String>, StoreError>;

    /// The user id attached to a session's first message, or `"anonymous"`.
    async fn get_session_owner(&self, session_id: &str) -> Result<String, StoreError>;

    /// Delete a session and all of its messages.
    async fn remove(&self, session_id: &str) -> Result<(), StoreError>;
}

/// Hierarchical conversation summary storage, scoped by session.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Load the summary for a session, if one has been computed.
    async fn get(&self, session_id: &str) -> Result<Option<ConversationSummary>, StoreError>;

    /// Upsert a session's summary.
    ///
    /// If a summary already exists for this session, implementations
    /// preserve its original `created_at` and set `updated_at` to now,
    /// regardless of what the caller set on `summary`.
    async fn save(&self, session_id: &str, summary: ConversationSummary) -> Result<(), StoreError>;

    /// Delete a session's summary, if any.
    async fn delete(&self, session_id: &str) -> Result<(), StoreError>;
}

/// Human-in-the-loop approval request storage.
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// Record a new pending approval and return its id.
    ///
    /// `user_prompt` is the prompt that triggered the tool call; it is not
    /// part of [`PendingApproval`]'s persisted shape but is made available
    /// here for stores that want to surface it alongside the pending item.
    async fn request_approval(
        &self,
        tool_name: &str,
        arguments: Value,
        user_id: &str,
        session_id: &str,
        user_prompt: &str,
    ) -> Result<Uuid, StoreError>;

    /// List every approval still in `Pending` state.
    async fn list_pending(&self) -> Result<Vec<PendingApproval>, StoreError>;

    /// List pending approvals requested on behalf of `user_id`.
    async fn list_pending_by_user(&self, user_id: &str) -> Result<Vec<PendingApproval>, StoreError>;

    /// Approve a pending request, optionally substituting arguments.
    async fn approve(&self, id: Uuid, modified_arguments: Option<Value>) -> Result<(), StoreError>;

    /// Reject a pending request, optionally with a human-readable reason.
    async fn reject(&self, id: Uuid, reason: Option<String>) -> Result<(), StoreError>;
}
