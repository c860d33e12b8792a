// Alliance domain models - pure data, no Discord types.

use crate::core::storage::{Document, DocumentKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// In-game rank. Ordered: R1 < R2 < ... < R5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    R1,
    R2,
    R3,
    R4,
    R5,
}

impl Rank {
    pub const ALL: [Rank; 5] = [Rank::R1, Rank::R2, Rank::R3, Rank::R4, Rank::R5];

    /// R4 and R5 may manage members below them.
    pub fn is_officer(&self) -> bool {
        *self >= Rank::R4
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::R1 => "R1",
            Rank::R2 => "R2",
            Rank::R3 => "R3",
            Rank::R4 => "R4",
            Rank::R5 => "R5",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Rank::R1 => "⚪",
            Rank::R2 => "🟢",
            Rank::R3 => "🔵",
            Rank::R4 => "🟣",
            Rank::R5 => "👑",
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rank::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown rank `{}`", s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllianceMember {
    pub id: u64,
    pub rank: Rank,
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub power: u64,
    #[serde(default)]
    pub furnace_level: u32,
    #[serde(default)]
    pub game_id: Option<String>,
}

/// `alliance.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Alliance {
    pub name: Option<String>,
    pub tag: Option<String>,
    pub leader: Option<u64>,
    pub members: Vec<AllianceMember>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Alliance {
    pub fn member(&self, id: u64) -> Option<&AllianceMember> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn member_mut(&mut self, id: u64) -> Option<&mut AllianceMember> {
        self.members.iter_mut().find(|m| m.id == id)
    }

    pub fn rank_of(&self, id: u64) -> Option<Rank> {
        self.member(id).map(|m| m.rank)
    }
}

impl Document for Alliance {
    const KIND: DocumentKind = DocumentKind::Alliance;
}

/// Optional profile fields for `/update`.
#[derive(Debug, Clone, Default)]
pub struct MemberUpdate {
    pub power: Option<u64>,
    pub furnace_level: Option<u32>,
    pub game_id: Option<String>,
}

impl MemberUpdate {
    pub fn is_empty(&self) -> bool {
        self.power.is_none() && self.furnace_level.is_none() && self.game_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllianceStats {
    pub member_count: usize,
    pub per_rank: Vec<(Rank, usize)>,
    pub total_power: u64,
    pub average_power: u64,
    pub average_furnace_level: f64,
}

// ============================================================================
// AUDIT LOG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    AllianceUpdated,
    MemberAdded,
    MemberRemoved,
    RankChanged,
    LeaderChanged,
    MemberUpdated,
    OwnerSet,
    AdminAdded,
    AdminRemoved,
    MinistryCreated,
    MinistryAppointed,
    MinistryVacated,
    MinistryRemoved,
}

impl LogAction {
    pub fn title(&self) -> &'static str {
        match self {
            LogAction::AllianceUpdated => "Alliance updated",
            LogAction::MemberAdded => "Member added",
            LogAction::MemberRemoved => "Member removed",
            LogAction::RankChanged => "Rank changed",
            LogAction::LeaderChanged => "Leader changed",
            LogAction::MemberUpdated => "Member updated",
            LogAction::OwnerSet => "Owner set",
            LogAction::AdminAdded => "Admin added",
            LogAction::AdminRemoved => "Admin removed",
            LogAction::MinistryCreated => "Ministry created",
            LogAction::MinistryAppointed => "Minister appointed",
            LogAction::MinistryVacated => "Ministry vacated",
            LogAction::MinistryRemoved => "Ministry removed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllianceLogEntry {
    pub id: String,
    pub action: LogAction,
    pub actor_id: u64,
    #[serde(default)]
    pub target_id: Option<u64>,
    #[serde(default)]
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

/// `alliance_logs.json`, oldest entry first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllianceLogs {
    #[serde(default)]
    pub logs: Vec<AllianceLogEntry>,
}

impl Document for AllianceLogs {
    const KIND: DocumentKind = DocumentKind::AllianceLogs;
}
