//! In-memory hierarchical conversation summary storage, keyed by session.

use async_trait::async_trait;
use reactor_core::store::{StoreError, SummaryStore};
use reactor_core::summary::ConversationSummary;
use std::collections::HashMap;
use std::time::SystemTime;
use tokio::sync::RwLock;

/// In-memory [`SummaryStore`].
#[derive(Default)]
pub struct InMemorySummaryStore {
    summaries: RwLock<HashMap<String, ConversationSummary>>,
}

impl InMemorySummaryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SummaryStore for InMemorySummaryStore {
    async fn get(&self, session_id: &str) -> Result<Option<ConversationSummary>, StoreError> {
        Ok(self.summaries.read().await.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, mut summary: ConversationSummary) -> Result<(), StoreError> {
        let mut summaries = self.summaries.write().await;
        if let Some(existing) = summaries.get(session_id) {
            summary.created_at = existing.created_at;
        }
        summary.updated_at = SystemTime::now();
        summaries.insert(session_id.to_string(), summary);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        self.summaries.write().await.remove(session_id);
        Ok(())
    }
}
