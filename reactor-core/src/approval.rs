//! Human-in-the-loop approval requests.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Resolution state of a `PendingApproval`.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// Awaiting a human decision.
    Pending,
    /// Approved, optionally with modified arguments.
    Approved,
    /// Rejected, optionally with a reason.
    Rejected,
    /// No decision arrived before the approval timeout elapsed.
    TimedOut,
}

/// A tool call suspended pending human approval.
///
/// Resolved exactly once: the engine clears the corresponding completion
/// slot as soon as `status` moves out of `Pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingApproval {
    /// Unique id for this approval request.
    pub id: Uuid,
    /// Name of the tool awaiting approval.
    pub tool_name: String,
    /// Arguments the model originally proposed.
    pub arguments: serde_json::Value,
    /// When the approval was requested.
    pub requested_at: SystemTime,
    /// The user on whose behalf the tool call would run.
    pub user_id: String,
    /// The session this approval belongs to.
    pub session_id: String,
    /// Current resolution state.
    pub status: ApprovalStatus,
    /// Arguments substituted in by the approver, if any.
    pub modified_arguments: Option<serde_json::Value>,
    /// Reason given for rejection, if any.
    pub rejection_reason: Option<String>,
}

impl PendingApproval {
    /// Construct a new pending approval with a freshly generated id.
    pub fn new(
        tool_name: impl Into<String>,
        arguments: serde_json::Value,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tool_name: tool_name.into(),
            arguments,
            requested_at: SystemTime::now(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            status: ApprovalStatus::Pending,
            modified_arguments: None,
            rejection_reason: None,
        }
    }

    /// Arguments to execute the tool with: the approver's modification if
    /// one was supplied, otherwise the originally proposed arguments.
    pub fn effective_arguments(&self) -> &serde_json::Value {
        self.modified_arguments.as_ref().unwrap_or(&self.arguments)
    }
}

/// The outcome delivered to a suspended tool call once its approval
/// resolves.
#[derive(Debug, Clone)]
pub enum ApprovalOutcome {
    /// Approved, with the arguments to actually execute with.
    Approved { arguments: serde_json::Value },
    /// Rejected, with an optional human-readable reason.
    Rejected { reason: Option<String> },
    /// No decision arrived before the timeout.
    TimedOut,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn effective_arguments_falls_back_to_original() {
        let approval = PendingApproval::new("refund", json!({"amount": 50}), "u1", "s1");
        assert_eq!(approval.effective_arguments(), &json!({"amount": 50}));
    }

    #[test]
    fn effective_arguments_prefers_modification() {
        let mut approval = PendingApproval::new("refund", json!({"amount": 50}), "u1", "s1");
        approval.modified_arguments = Some(json!({"amount": 25}));
        assert_eq!(approval.effective_arguments(), &json!({"amount": 25}));
    }
}
