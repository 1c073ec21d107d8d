//! In-memory human-in-the-loop approval request storage.

use async_trait::async_trait;
use reactor_core::approval::{ApprovalStatus, PendingApproval};
use reactor_core::store::{ApprovalStore, StoreError};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory [`ApprovalStore`].
#[derive(Default)]
pub struct InMemoryApprovalStore {
    approvals: RwLock<HashMap<Uuid, PendingApproval>>,
}

impl InMemoryApprovalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApprovalStore for InMemoryApprovalStore {
    async fn request_approval(
        &self,
        tool_name: &str,
        arguments: Value,
        user_id: &str,
        session_id: &str,
        _user_prompt: &str,
    ) -> Result<Uuid, StoreError> {
        let approval = PendingApproval::new(tool_name, arguments, user_id, session_id);
        let id = approval.id;
        self.approvals.write().await.insert(id, approval);
        Ok(id)
    }

    async fn list_pending(&self) -> Result<Vec<PendingApproval>, StoreError> {
        Ok(self
            .approvals
            .read()
            .await
            .values()
            .filter(|a| a.status == ApprovalStatus::Pending)
            .cloned()
            .collect())
    }

    async fn list_pending_by_user(&self, user_id: &str) -> Result<Vec<PendingApproval>, StoreError> {
        Ok(self
            .approvals
            .read()
            .await
            .values()
            .filter(|a| a.status == ApprovalStatus::Pending && a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn approve(&self, id: Uuid, modified_arguments: Option<Value>) -> Result<(), StoreError> {
        let mut approvals = self.approvals.write().await;
        let approval = approvals
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        approval.status = ApprovalStatus::Approved;
        approval.modified_arguments = modified_arguments;
        Ok(())
    }

    async fn reject(&self, id: Uuid, reason: Option<String>) -> Result<(), StoreError> {
        let mut approvals = self.approvals.write().await;
        let approval = approvals
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        approval.status = ApprovalStatus::Rejected;
        approval.rejection_reason = reason;
        Ok(())
    }
}
