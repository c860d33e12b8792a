use super::alliance_models::{AllianceLogEntry, AllianceLogs, LogAction};
use crate::core::storage::{new_record_id, Database, DocumentStore, StoreError};
use chrono::Utc;
use std::sync::Arc;

/// Entries kept in `alliance_logs.json`; older ones are dropped.
pub const MAX_LOG_ENTRIES: usize = 500;

/// Audit trail of every management action.
pub struct LogService<S: DocumentStore> {
    db: Arc<Database<S>>,
}

impl<S: DocumentStore> LogService<S> {
    pub fn new(db: Arc<Database<S>>) -> Self {
        Self { db }
    }

    pub async fn record(
        &self,
        action: LogAction,
        actor_id: u64,
        target_id: Option<u64>,
        details: impl Into<String>,
    ) -> Result<(), StoreError> {
        let entry = AllianceLogEntry {
            id: new_record_id(),
            action,
            actor_id,
            target_id,
            details: details.into(),
            timestamp: Utc::now(),
        };
        tracing::info!(
            action = ?entry.action,
            actor_id,
            target_id = ?entry.target_id,
            details = %entry.details,
            "Alliance log"
        );

        self.db
            .update(|doc: &mut AllianceLogs| {
                doc.logs.push(entry);
                if doc.logs.len() > MAX_LOG_ENTRIES {
                    let excess = doc.logs.len() - MAX_LOG_ENTRIES;
                    doc.logs.drain(..excess);
                }
            })
            .await
    }

    /// Record an entry after the action it describes has already been saved.
    /// A failed write is logged and swallowed so the action still succeeds.
    pub async fn record_or_warn(
        &self,
        action: LogAction,
        actor_id: u64,
        target_id: Option<u64>,
        details: impl Into<String>,
    ) {
        if let Err(e) = self.record(action, actor_id, target_id, details).await {
            tracing::warn!(?action, actor_id, error = %e, "Failed to write alliance log entry");
        }
    }

    /// Newest first, optionally only entries touching `target_id`.
    pub async fn recent(
        &self,
        limit: usize,
        target_id: Option<u64>,
    ) -> Result<Vec<AllianceLogEntry>, StoreError> {
        let doc: AllianceLogs = self.db.read().await?;
        Ok(doc
            .logs
            .iter()
            .rev()
            .filter(|e| target_id.is_none() || e.target_id == target_id)
            .take(limit)
            .cloned()
            .collect())
    }

    pub async fn count(&self) -> Result<usize, StoreError> {
        let doc: AllianceLogs = self.db.read().await?;
        Ok(doc.logs.len())
    }
}
