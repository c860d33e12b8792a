// Bot-level permissions: a single owner and a list of admins.
//
// These tiers are independent of alliance ranks. `authority` folds both into
// one ordered value the command guards can compare against.

use crate::core::alliance::{LogAction, LogService, Rank};
use crate::core::storage::{
    Database, Document, DocumentKind, DocumentStore, DomainError, StoreError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// `permissions.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    pub owner: Option<u64>,
    pub admins: Vec<u64>,
}

impl Document for Permissions {
    const KIND: DocumentKind = DocumentKind::Permissions;
}

/// What a user may do, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Authority {
    Member,
    /// R4/R5 in the alliance.
    Officer,
    Admin,
    Owner,
}

#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("The bot owner is already set to <@{0}>.")]
    OwnerAlreadySet(u64),
    #[error("<@{0}> is already an admin.")]
    AlreadyAdmin(u64),
    #[error("<@{0}> is not an admin.")]
    NotAdmin(u64),
    #[error("The owner can't be added or removed as an admin.")]
    OwnerIsImplicitAdmin,
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError for PermissionError {
    fn is_storage(&self) -> bool {
        matches!(self, PermissionError::Store(_))
    }
}

pub struct PermissionService<S: DocumentStore> {
    db: Arc<Database<S>>,
    logs: Arc<LogService<S>>,
    /// `OWNER_ID` from the environment; used while no owner is stored.
    fallback_owner: Option<u64>,
}

impl<S: DocumentStore> PermissionService<S> {
    pub fn new(db: Arc<Database<S>>, logs: Arc<LogService<S>>, fallback_owner: Option<u64>) -> Self {
        Self {
            db,
            logs,
            fallback_owner,
        }
    }

    pub async fn owner(&self) -> Result<Option<u64>, PermissionError> {
        let permissions: Permissions = self.db.read().await?;
        Ok(permissions.owner.or(self.fallback_owner))
    }

    pub fn fallback_owner(&self) -> Option<u64> {
        self.fallback_owner
    }

    /// Set the owner. Only succeeds while no owner is stored.
    pub async fn set_owner(&self, actor_id: u64, user_id: u64) -> Result<(), PermissionError> {
        self.db
            .try_update(|permissions: &mut Permissions| match permissions.owner {
                Some(existing) => Err(PermissionError::OwnerAlreadySet(existing)),
                None => {
                    permissions.owner = Some(user_id);
                    permissions.admins.retain(|&id| id != user_id);
                    Ok(())
                }
            })
            .await?;

        self.logs
            .record_or_warn(LogAction::OwnerSet, actor_id, Some(user_id), "Bot owner set")
            .await;
        Ok(())
    }

    pub async fn add_admin(&self, actor_id: u64, user_id: u64) -> Result<(), PermissionError> {
        let fallback = self.fallback_owner;
        self.db
            .try_update(|permissions: &mut Permissions| -> Result<_, PermissionError> {
                if permissions.owner.or(fallback) == Some(user_id) {
                    return Err(PermissionError::OwnerIsImplicitAdmin);
                }
                if permissions.admins.contains(&user_id) {
                    return Err(PermissionError::AlreadyAdmin(user_id));
                }
                permissions.admins.push(user_id);
                Ok(())
            })
            .await?;

        self.logs
            .record_or_warn(LogAction::AdminAdded, actor_id, Some(user_id), "Admin added")
            .await;
        Ok(())
    }

    pub async fn remove_admin(&self, actor_id: u64, user_id: u64) -> Result<(), PermissionError> {
        let fallback = self.fallback_owner;
        self.db
            .try_update(|permissions: &mut Permissions| -> Result<_, PermissionError> {
                if permissions.owner.or(fallback) == Some(user_id) {
                    return Err(PermissionError::OwnerIsImplicitAdmin);
                }
                let before = permissions.admins.len();
                permissions.admins.retain(|&id| id != user_id);
                if permissions.admins.len() == before {
                    return Err(PermissionError::NotAdmin(user_id));
                }
                Ok(())
            })
            .await?;

        self.logs
            .record_or_warn(LogAction::AdminRemoved, actor_id, Some(user_id), "Admin removed")
            .await;
        Ok(())
    }

    pub async fn admins(&self) -> Result<Vec<u64>, PermissionError> {
        let permissions: Permissions = self.db.read().await?;
        Ok(permissions.admins)
    }

    pub async fn is_owner(&self, user_id: u64) -> Result<bool, PermissionError> {
        Ok(self.owner().await? == Some(user_id))
    }

    /// The owner counts as an admin.
    pub async fn is_admin(&self, user_id: u64) -> Result<bool, PermissionError> {
        Ok(self.bot_authority(user_id).await? >= Authority::Admin)
    }

    /// Combine bot tiers with the user's alliance rank.
    pub async fn authority(
        &self,
        user_id: u64,
        rank: Option<Rank>,
    ) -> Result<Authority, PermissionError> {
        let bot = self.bot_authority(user_id).await?;
        if bot == Authority::Member && rank.is_some_and(|r| r.is_officer()) {
            return Ok(Authority::Officer);
        }
        Ok(bot)
    }

    async fn bot_authority(&self, user_id: u64) -> Result<Authority, PermissionError> {
        let permissions: Permissions = self.db.read().await?;
        if permissions.owner.or(self.fallback_owner) == Some(user_id) {
            Ok(Authority::Owner)
        } else if permissions.admins.contains(&user_id) {
            Ok(Authority::Admin)
        } else {
            Ok(Authority::Member)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::test_support::{memory_database, MemoryStore};
    use crate::core::storage::DocumentKind;

    fn service(fallback: Option<u64>) -> PermissionService<MemoryStore> {
        let db = memory_database();
        let logs = Arc::new(LogService::new(Arc::clone(&db)));
        PermissionService::new(db, logs, fallback)
    }

    #[tokio::test]
    async fn test_admin_change_survives_audit_log_failure() {
        let db = memory_database();
        db.store().fail_saves_for(DocumentKind::AllianceLogs);
        let logs = Arc::new(LogService::new(Arc::clone(&db)));
        let service = PermissionService::new(db, Arc::clone(&logs), None);

        service.add_admin(1, 5).await.unwrap();

        assert_eq!(service.admins().await.unwrap(), vec![5]);
        assert_eq!(logs.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_owner_can_only_be_set_once() {
        let service = service(None);

        service.set_owner(1, 1).await.unwrap();
        let second = service.set_owner(2, 2).await;

        assert!(matches!(second, Err(PermissionError::OwnerAlreadySet(1))));
        assert_eq!(service.owner().await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_fallback_owner_until_stored() {
        let service = service(Some(99));

        assert!(service.is_owner(99).await.unwrap());
        service.set_owner(99, 5).await.unwrap();
        assert!(service.is_owner(5).await.unwrap());
        assert!(!service.is_owner(99).await.unwrap());
    }

    #[tokio::test]
    async fn test_admin_management() {
        let service = service(None);
        service.set_owner(1, 1).await.unwrap();

        service.add_admin(1, 2).await.unwrap();
        assert!(matches!(
            service.add_admin(1, 2).await,
            Err(PermissionError::AlreadyAdmin(2))
        ));
        assert!(matches!(
            service.add_admin(1, 1).await,
            Err(PermissionError::OwnerIsImplicitAdmin)
        ));
        assert!(service.is_admin(2).await.unwrap());
        assert!(service.is_admin(1).await.unwrap());

        service.remove_admin(1, 2).await.unwrap();
        assert!(matches!(
            service.remove_admin(1, 2).await,
            Err(PermissionError::NotAdmin(2))
        ));
        assert!(service.admins().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_authority_combines_rank_and_bot_tier() {
        let service = service(Some(1));
        service.add_admin(1, 2).await.unwrap();

        assert_eq!(service.authority(1, None).await.unwrap(), Authority::Owner);
        assert_eq!(
            service.authority(2, Some(Rank::R1)).await.unwrap(),
            Authority::Admin
        );
        assert_eq!(
            service.authority(3, Some(Rank::R4)).await.unwrap(),
            Authority::Officer
        );
        assert_eq!(
            service.authority(4, Some(Rank::R3)).await.unwrap(),
            Authority::Member
        );
        assert_eq!(service.authority(5, None).await.unwrap(), Authority::Member);
    }
}
