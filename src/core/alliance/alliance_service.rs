// Alliance service - membership, ranks and member profiles.
//
// Every mutation is recorded in the audit log after it has been persisted.
// Authorisation lives in `check_rank_authority`, which the Discord layer
// calls with the actor's authority before invoking a mutation.

use super::alliance_log::LogService;
use super::alliance_models::{
    Alliance, AllianceMember, AllianceStats, LogAction, MemberUpdate, Rank,
};
use crate::core::permissions::Authority;
use crate::core::storage::{Database, DocumentStore, DomainError, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_TAG_LEN: usize = 5;

#[derive(Debug, Error)]
pub enum AllianceError {
    #[error("<@{0}> is already an alliance member.")]
    AlreadyMember(u64),
    #[error("<@{0}> is not an alliance member.")]
    MemberNotFound(u64),
    #[error("Alliance name must be 1-{MAX_NAME_LEN} characters.", MAX_NAME_LEN = MAX_NAME_LEN)]
    InvalidName,
    #[error("Alliance tag must be 1-{MAX_TAG_LEN} letters or digits.", MAX_TAG_LEN = MAX_TAG_LEN)]
    InvalidTag,
    #[error("Nothing to update.")]
    NothingToUpdate,
    #[error("You can only manage members ranked below you ({0}).")]
    RankTooLow(Rank),
    #[error("You don't have permission to manage alliance members.")]
    NotAllowed,
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError for AllianceError {
    fn is_storage(&self) -> bool {
        matches!(self, AllianceError::Store(_))
    }
}

/// May an actor touch a member currently at `target_rank` and leave them at
/// `new_rank`? Admins and the owner always may. Officers only below their
/// own rank, in both directions.
pub fn check_rank_authority(
    authority: Authority,
    actor_rank: Option<Rank>,
    target_rank: Option<Rank>,
    new_rank: Option<Rank>,
) -> Result<(), AllianceError> {
    match authority {
        Authority::Owner | Authority::Admin => Ok(()),
        Authority::Member => Err(AllianceError::NotAllowed),
        Authority::Officer => {
            let own = actor_rank.ok_or(AllianceError::NotAllowed)?;
            let outranks = |rank: Option<Rank>| rank.map_or(true, |r| r < own);
            if outranks(target_rank) && outranks(new_rank) {
                Ok(())
            } else {
                Err(AllianceError::RankTooLow(own))
            }
        }
    }
}

pub struct AllianceService<S: DocumentStore> {
    db: Arc<Database<S>>,
    logs: Arc<LogService<S>>,
}

impl<S: DocumentStore> AllianceService<S> {
    pub fn new(db: Arc<Database<S>>, logs: Arc<LogService<S>>) -> Self {
        Self { db, logs }
    }

    pub async fn info(&self) -> Result<Alliance, AllianceError> {
        Ok(self.db.read().await?)
    }

    pub async fn member(&self, id: u64) -> Result<Option<AllianceMember>, AllianceError> {
        let alliance: Alliance = self.db.read().await?;
        Ok(alliance.member(id).cloned())
    }

    pub async fn rank_of(&self, id: u64) -> Result<Option<Rank>, AllianceError> {
        let alliance: Alliance = self.db.read().await?;
        Ok(alliance.rank_of(id))
    }

    pub async fn set_alliance(
        &self,
        actor_id: u64,
        name: &str,
        tag: Option<&str>,
    ) -> Result<Alliance, AllianceError> {
        let name = name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(AllianceError::InvalidName);
        }
        let tag = match tag.map(str::trim) {
            Some(t) if t.is_empty() || t.len() > MAX_TAG_LEN => {
                return Err(AllianceError::InvalidTag)
            }
            Some(t) if !t.chars().all(|c| c.is_ascii_alphanumeric()) => {
                return Err(AllianceError::InvalidTag)
            }
            Some(t) => Some(t.to_uppercase()),
            None => None,
        };

        let alliance = self
            .db
            .update(|alliance: &mut Alliance| {
                alliance.name = Some(name.clone());
                if tag.is_some() {
                    alliance.tag = tag.clone();
                }
                alliance.updated_at = Some(Utc::now());
                alliance.clone()
            })
            .await?;

        let label = match &alliance.tag {
            Some(tag) => format!("[{}] {}", tag, name),
            None => name,
        };
        self.logs
            .record_or_warn(LogAction::AllianceUpdated, actor_id, None, label)
            .await;
        Ok(alliance)
    }

    pub async fn add_member(
        &self,
        actor_id: u64,
        user_id: u64,
        rank: Rank,
        now: DateTime<Utc>,
    ) -> Result<AllianceMember, AllianceError> {
        let member = self
            .db
            .try_update(|alliance: &mut Alliance| -> Result<_, AllianceError> {
                if alliance.member(user_id).is_some() {
                    return Err(AllianceError::AlreadyMember(user_id));
                }
                let member = AllianceMember {
                    id: user_id,
                    rank,
                    joined_at: now,
                    power: 0,
                    furnace_level: 0,
                    game_id: None,
                };
                alliance.members.push(member.clone());
                alliance.updated_at = Some(now);
                Ok(member)
            })
            .await?;

        self.logs
            .record_or_warn(
                LogAction::MemberAdded,
                actor_id,
                Some(user_id),
                format!("Joined as {}", rank),
            )
            .await;
        Ok(member)
    }

    /// Removing the leader also clears the leader slot.
    pub async fn remove_member(
        &self,
        actor_id: u64,
        user_id: u64,
    ) -> Result<AllianceMember, AllianceError> {
        let removed = self
            .db
            .try_update(|alliance: &mut Alliance| -> Result<_, AllianceError> {
                let pos = alliance
                    .members
                    .iter()
                    .position(|m| m.id == user_id)
                    .ok_or(AllianceError::MemberNotFound(user_id))?;
                let removed = alliance.members.remove(pos);
                if alliance.leader == Some(user_id) {
                    alliance.leader = None;
                }
                alliance.updated_at = Some(Utc::now());
                Ok(removed)
            })
            .await?;

        self.logs
            .record_or_warn(
                LogAction::MemberRemoved,
                actor_id,
                Some(user_id),
                format!("Removed (was {})", removed.rank),
            )
            .await;
        Ok(removed)
    }

    /// Returns the previous rank. Unknown members leave the document untouched.
    pub async fn change_rank(
        &self,
        actor_id: u64,
        user_id: u64,
        rank: Rank,
    ) -> Result<Rank, AllianceError> {
        let previous = self
            .db
            .try_update(|alliance: &mut Alliance| -> Result<_, AllianceError> {
                let member = alliance
                    .member_mut(user_id)
                    .ok_or(AllianceError::MemberNotFound(user_id))?;
                let previous = member.rank;
                member.rank = rank;
                alliance.updated_at = Some(Utc::now());
                Ok(previous)
            })
            .await?;

        self.logs
            .record_or_warn(
                LogAction::RankChanged,
                actor_id,
                Some(user_id),
                format!("{} → {}", previous, rank),
            )
            .await;
        Ok(previous)
    }

    /// Make a member the leader (and R5). Returns the previous leader.
    pub async fn set_leader(
        &self,
        actor_id: u64,
        user_id: u64,
    ) -> Result<Option<u64>, AllianceError> {
        let previous = self
            .db
            .try_update(|alliance: &mut Alliance| -> Result<_, AllianceError> {
                let member = alliance
                    .member_mut(user_id)
                    .ok_or(AllianceError::MemberNotFound(user_id))?;
                member.rank = Rank::R5;
                let previous = alliance.leader.replace(user_id);
                alliance.updated_at = Some(Utc::now());
                Ok(previous)
            })
            .await?;

        let details = match previous {
            Some(old) if old != user_id => format!("Took over from <@{}>", old),
            _ => "Leader set".to_string(),
        };
        self.logs
            .record_or_warn(LogAction::LeaderChanged, actor_id, Some(user_id), details)
            .await;
        Ok(previous)
    }

    pub async fn update_member(
        &self,
        actor_id: u64,
        user_id: u64,
        update: MemberUpdate,
    ) -> Result<AllianceMember, AllianceError> {
        if update.is_empty() {
            return Err(AllianceError::NothingToUpdate);
        }

        let mut changes = Vec::new();
        if let Some(power) = update.power {
            changes.push(format!("power {}", power));
        }
        if let Some(level) = update.furnace_level {
            changes.push(format!("furnace {}", level));
        }
        if let Some(game_id) = &update.game_id {
            changes.push(format!("game id {}", game_id));
        }

        let member = self
            .db
            .try_update(|alliance: &mut Alliance| -> Result<_, AllianceError> {
                let member = alliance
                    .member_mut(user_id)
                    .ok_or(AllianceError::MemberNotFound(user_id))?;
                if let Some(power) = update.power {
                    member.power = power;
                }
                if let Some(level) = update.furnace_level {
                    member.furnace_level = level;
                }
                if let Some(game_id) = update.game_id {
                    member.game_id = Some(game_id.trim().to_string());
                }
                Ok(member.clone())
            })
            .await?;

        self.logs
            .record_or_warn(
                LogAction::MemberUpdated,
                actor_id,
                Some(user_id),
                changes.join(", "),
            )
            .await;
        Ok(member)
    }

    /// Highest rank first, then by power.
    pub async fn members(&self) -> Result<Vec<AllianceMember>, AllianceError> {
        let alliance: Alliance = self.db.read().await?;
        let mut members = alliance.members;
        members.sort_by(|a, b| b.rank.cmp(&a.rank).then(b.power.cmp(&a.power)));
        Ok(members)
    }

    pub async fn stats(&self) -> Result<AllianceStats, AllianceError> {
        let alliance: Alliance = self.db.read().await?;
        let members = &alliance.members;
        let count = members.len();

        let per_rank = Rank::ALL
            .into_iter()
            .rev()
            .map(|rank| (rank, members.iter().filter(|m| m.rank == rank).count()))
            .collect();
        let total_power: u64 = members.iter().map(|m| m.power).sum();
        let furnace_total: u64 = members.iter().map(|m| m.furnace_level as u64).sum();

        Ok(AllianceStats {
            member_count: count,
            per_rank,
            total_power,
            average_power: if count > 0 { total_power / count as u64 } else { 0 },
            average_furnace_level: if count > 0 {
                furnace_total as f64 / count as f64
            } else {
                0.0
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alliance::AllianceLogs;
    use crate::core::storage::test_support::{memory_database, MemoryStore};

    fn service() -> AllianceService<MemoryStore> {
        let db = memory_database();
        let logs = Arc::new(LogService::new(Arc::clone(&db)));
        AllianceService::new(db, logs)
    }

    #[tokio::test]
    async fn test_add_and_remove_members() {
        let service = service();
        service.add_member(1, 10, Rank::R2, Utc::now()).await.unwrap();

        let duplicate = service.add_member(1, 10, Rank::R3, Utc::now()).await;
        assert!(matches!(duplicate, Err(AllianceError::AlreadyMember(10))));

        let removed = service.remove_member(1, 10).await.unwrap();
        assert_eq!(removed.rank, Rank::R2);
        assert!(matches!(
            service.remove_member(1, 10).await,
            Err(AllianceError::MemberNotFound(10))
        ));
    }

    #[tokio::test]
    async fn test_change_rank_on_unknown_member_leaves_list_unchanged() {
        let service = service();
        service.add_member(1, 10, Rank::R2, Utc::now()).await.unwrap();
        let before = service.members().await.unwrap();

        let result = service.change_rank(1, 99, Rank::R4).await;

        assert!(matches!(result, Err(AllianceError::MemberNotFound(99))));
        assert_eq!(service.members().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_change_rank_returns_previous_and_logs() {
        let service = service();
        service.add_member(1, 10, Rank::R2, Utc::now()).await.unwrap();

        let previous = service.change_rank(1, 10, Rank::R4).await.unwrap();

        assert_eq!(previous, Rank::R2);
        assert_eq!(service.rank_of(10).await.unwrap(), Some(Rank::R4));
        let logs: AllianceLogs = service.db.read().await.unwrap();
        assert_eq!(logs.logs.last().unwrap().details, "R2 → R4");
    }

    #[tokio::test]
    async fn test_set_leader_promotes_and_removal_clears() {
        let service = service();
        service.add_member(1, 10, Rank::R3, Utc::now()).await.unwrap();
        service.add_member(1, 11, Rank::R4, Utc::now()).await.unwrap();

        assert_eq!(service.set_leader(1, 10).await.unwrap(), None);
        assert_eq!(service.set_leader(1, 11).await.unwrap(), Some(10));
        assert_eq!(service.rank_of(11).await.unwrap(), Some(Rank::R5));

        service.remove_member(1, 11).await.unwrap();
        assert_eq!(service.info().await.unwrap().leader, None);

        assert!(matches!(
            service.set_leader(1, 42).await,
            Err(AllianceError::MemberNotFound(42))
        ));
    }

    #[tokio::test]
    async fn test_set_alliance_validates_tag() {
        let service = service();

        let alliance = service.set_alliance(1, "Frost Wolves", Some("fw1")).await.unwrap();
        assert_eq!(alliance.tag.as_deref(), Some("FW1"));

        assert!(matches!(
            service.set_alliance(1, "Frost Wolves", Some("TOOLONG")).await,
            Err(AllianceError::InvalidTag)
        ));
        assert!(matches!(
            service.set_alliance(1, "  ", None).await,
            Err(AllianceError::InvalidName)
        ));

        // Renaming without a tag keeps the old one.
        let renamed = service.set_alliance(1, "Ice Wolves", None).await.unwrap();
        assert_eq!(renamed.tag.as_deref(), Some("FW1"));
    }

    #[tokio::test]
    async fn test_update_member_and_stats() {
        let service = service();
        service.add_member(1, 10, Rank::R5, Utc::now()).await.unwrap();
        service.add_member(1, 11, Rank::R1, Utc::now()).await.unwrap();

        service
            .update_member(
                1,
                10,
                MemberUpdate {
                    power: Some(3_000_000),
                    furnace_level: Some(30),
                    game_id: Some(" 12345 ".to_string()),
                },
            )
            .await
            .unwrap();
        service
            .update_member(
                1,
                11,
                MemberUpdate {
                    power: Some(1_000_000),
                    furnace_level: Some(20),
                    game_id: None,
                },
            )
            .await
            .unwrap();

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.member_count, 2);
        assert_eq!(stats.total_power, 4_000_000);
        assert_eq!(stats.average_power, 2_000_000);
        assert!((stats.average_furnace_level - 25.0).abs() < f64::EPSILON);
        assert_eq!(stats.per_rank[0], (Rank::R5, 1));

        let member = service.member(10).await.unwrap().unwrap();
        assert_eq!(member.game_id.as_deref(), Some("12345"));

        assert!(matches!(
            service.update_member(1, 10, MemberUpdate::default()).await,
            Err(AllianceError::NothingToUpdate)
        ));
    }

    #[test]
    fn test_rank_guard() {
        use Authority::*;

        assert!(check_rank_authority(Admin, None, Some(Rank::R5), Some(Rank::R5)).is_ok());
        assert!(check_rank_authority(Member, Some(Rank::R3), Some(Rank::R1), None).is_err());

        assert!(check_rank_authority(Officer, Some(Rank::R4), Some(Rank::R2), Some(Rank::R3)).is_ok());
        assert!(check_rank_authority(Officer, Some(Rank::R4), None, Some(Rank::R1)).is_ok());
        assert!(matches!(
            check_rank_authority(Officer, Some(Rank::R4), Some(Rank::R2), Some(Rank::R4)),
            Err(AllianceError::RankTooLow(Rank::R4))
        ));
        assert!(check_rank_authority(Officer, Some(Rank::R4), Some(Rank::R5), None).is_err());
        assert!(check_rank_authority(Officer, Some(Rank::R5), Some(Rank::R4), Some(Rank::R1)).is_ok());
    }
}
