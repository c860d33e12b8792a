// Ministries: named alliance positions, each held by at most one member.

use crate::core::alliance::{LogAction, LogService};
use crate::core::storage::{
    new_record_id, Database, Document, DocumentKind, DocumentStore, DomainError, StoreError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub const MAX_MINISTRY_NAME_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ministry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub minister_id: Option<u64>,
    #[serde(default)]
    pub appointed_at: Option<DateTime<Utc>>,
}

/// `ministries.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinistriesDocument {
    #[serde(default)]
    pub ministries: Vec<Ministry>,
}

impl MinistriesDocument {
    /// Match by id, or by name ignoring case.
    fn find_mut(&mut self, key: &str) -> Option<&mut Ministry> {
        let key = key.trim();
        self.ministries
            .iter_mut()
            .find(|m| m.id == key || m.name.eq_ignore_ascii_case(key))
    }
}

impl Document for MinistriesDocument {
    const KIND: DocumentKind = DocumentKind::Ministries;
}

#[derive(Debug, Error)]
pub enum MinistryError {
    #[error("A ministry called `{0}` already exists.")]
    DuplicateName(String),
    #[error("Ministry names must be 1-{max} characters.", max = MAX_MINISTRY_NAME_LEN)]
    InvalidName,
    #[error("Ministry `{0}` was not found.")]
    NotFound(String),
    #[error("Ministry `{0}` has no minister.")]
    AlreadyVacant(String),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError for MinistryError {
    fn is_storage(&self) -> bool {
        matches!(self, MinistryError::Store(_))
    }
}

pub struct MinistryService<S: DocumentStore> {
    db: Arc<Database<S>>,
    logs: Arc<LogService<S>>,
}

impl<S: DocumentStore> MinistryService<S> {
    pub fn new(db: Arc<Database<S>>, logs: Arc<LogService<S>>) -> Self {
        Self { db, logs }
    }

    pub async fn list(&self) -> Result<Vec<Ministry>, MinistryError> {
        let document: MinistriesDocument = self.db.read().await?;
        Ok(document.ministries)
    }

    pub async fn create(
        &self,
        actor_id: u64,
        name: &str,
        description: &str,
    ) -> Result<Ministry, MinistryError> {
        let name = name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_MINISTRY_NAME_LEN {
            return Err(MinistryError::InvalidName);
        }

        let ministry = Ministry {
            id: new_record_id(),
            name: name.clone(),
            description: description.trim().to_string(),
            minister_id: None,
            appointed_at: None,
        };

        let created = self
            .db
            .try_update(|doc: &mut MinistriesDocument| -> Result<_, MinistryError> {
                if doc
                    .ministries
                    .iter()
                    .any(|m| m.name.eq_ignore_ascii_case(&name))
                {
                    return Err(MinistryError::DuplicateName(name.clone()));
                }
                doc.ministries.push(ministry.clone());
                Ok(ministry)
            })
            .await?;

        self.logs
            .record_or_warn(LogAction::MinistryCreated, actor_id, None, created.name.clone())
            .await;
        Ok(created)
    }

    /// Put `user_id` in charge. Returns the updated ministry and the previous minister.
    pub async fn appoint(
        &self,
        actor_id: u64,
        key: &str,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<(Ministry, Option<u64>), MinistryError> {
        let (ministry, previous) = self
            .db
            .try_update(|doc: &mut MinistriesDocument| -> Result<_, MinistryError> {
                let ministry = doc
                    .find_mut(key)
                    .ok_or_else(|| MinistryError::NotFound(key.trim().to_string()))?;
                let previous = ministry.minister_id.replace(user_id);
                ministry.appointed_at = Some(now);
                Ok((ministry.clone(), previous))
            })
            .await?;

        self.logs
            .record_or_warn(
                LogAction::MinistryAppointed,
                actor_id,
                Some(user_id),
                ministry.name.clone(),
            )
            .await;
        Ok((ministry, previous))
    }

    /// Clear the minister. Returns who held the post.
    pub async fn vacate(&self, actor_id: u64, key: &str) -> Result<u64, MinistryError> {
        let (name, previous) = self
            .db
            .try_update(|doc: &mut MinistriesDocument| -> Result<_, MinistryError> {
                let ministry = doc
                    .find_mut(key)
                    .ok_or_else(|| MinistryError::NotFound(key.trim().to_string()))?;
                let previous = ministry
                    .minister_id
                    .take()
                    .ok_or_else(|| MinistryError::AlreadyVacant(ministry.name.clone()))?;
                ministry.appointed_at = None;
                Ok((ministry.name.clone(), previous))
            })
            .await?;

        self.logs
            .record_or_warn(LogAction::MinistryVacated, actor_id, Some(previous), name)
            .await;
        Ok(previous)
    }

    pub async fn remove(&self, actor_id: u64, key: &str) -> Result<Ministry, MinistryError> {
        let key = key.trim();
        let removed = self
            .db
            .try_update(|doc: &mut MinistriesDocument| -> Result<_, MinistryError> {
                let pos = doc
                    .ministries
                    .iter()
                    .position(|m| m.id == key || m.name.eq_ignore_ascii_case(key))
                    .ok_or_else(|| MinistryError::NotFound(key.to_string()))?;
                Ok(doc.ministries.remove(pos))
            })
            .await?;

        self.logs
            .record_or_warn(LogAction::MinistryRemoved, actor_id, None, removed.name.clone())
            .await;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::test_support::{memory_database, MemoryStore};

    fn service() -> MinistryService<MemoryStore> {
        let db = memory_database();
        let logs = Arc::new(LogService::new(Arc::clone(&db)));
        MinistryService::new(db, logs)
    }

    #[tokio::test]
    async fn test_duplicate_names_are_rejected_ignoring_case() {
        let service = service();
        service.create(1, "Ministry of War", "Rallies").await.unwrap();

        let duplicate = service.create(1, "ministry of war", "").await;

        assert!(matches!(duplicate, Err(MinistryError::DuplicateName(_))));
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_appoint_and_vacate() {
        let service = service();
        let ministry = service.create(1, "Education", "Research").await.unwrap();

        let (appointed, previous) = service.appoint(1, "education", 42, Utc::now()).await.unwrap();
        assert_eq!(appointed.minister_id, Some(42));
        assert_eq!(previous, None);

        let (_, previous) = service.appoint(1, &ministry.id, 43, Utc::now()).await.unwrap();
        assert_eq!(previous, Some(42));

        assert_eq!(service.vacate(1, "Education").await.unwrap(), 43);
        assert!(matches!(
            service.vacate(1, "Education").await,
            Err(MinistryError::AlreadyVacant(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_unknown_ministry() {
        let service = service();
        service.create(1, "Defense", "").await.unwrap();

        assert!(matches!(
            service.remove(1, "Offense").await,
            Err(MinistryError::NotFound(_))
        ));
        let removed = service.remove(1, "defense").await.unwrap();
        assert_eq!(removed.name, "Defense");
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_name() {
        let service = service();
        assert!(matches!(
            service.create(1, "   ", "").await,
            Err(MinistryError::InvalidName)
        ));
    }
}
