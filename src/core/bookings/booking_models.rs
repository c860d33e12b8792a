// Booking domain models - pure data, no Discord types.

use crate::core::storage::{Document, DocumentKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The resources alliance members reserve time on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Building,
    Research,
    Training,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [
        ResourceType::Building,
        ResourceType::Research,
        ResourceType::Training,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Building => "building",
            ResourceType::Research => "research",
            ResourceType::Training => "training",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ResourceType::Building => "🏗️ Building",
            ResourceType::Research => "🔬 Research",
            ResourceType::Training => "⚔️ Training",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(input.trim()))
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Active,
    Completed,
}

/// A reservation of `[start_date, end_date)` on one resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub user_id: u64,
    pub user_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Length in minutes.
    pub duration: i64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: BookingStatus,
}

impl Booking {
    /// Half-open overlap: touching intervals do not overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end_date && end > self.start_date
    }

    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }
}

/// `bookings.json`: one list per resource type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingsDocument {
    #[serde(default)]
    pub building: Vec<Booking>,
    #[serde(default)]
    pub research: Vec<Booking>,
    #[serde(default)]
    pub training: Vec<Booking>,
}

impl BookingsDocument {
    pub fn of(&self, resource: ResourceType) -> &Vec<Booking> {
        match resource {
            ResourceType::Building => &self.building,
            ResourceType::Research => &self.research,
            ResourceType::Training => &self.training,
        }
    }

    pub fn of_mut(&mut self, resource: ResourceType) -> &mut Vec<Booking> {
        match resource {
            ResourceType::Building => &mut self.building,
            ResourceType::Research => &mut self.research,
            ResourceType::Training => &mut self.training,
        }
    }

    pub fn iter_all(&self) -> impl Iterator<Item = (ResourceType, &Booking)> {
        ResourceType::ALL
            .into_iter()
            .flat_map(move |t| self.of(t).iter().map(move |b| (t, b)))
    }
}

impl Document for BookingsDocument {
    const KIND: DocumentKind = DocumentKind::Bookings;
}

/// Raw booking request as typed by a user.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub resource: ResourceType,
    pub user_id: u64,
    pub user_name: String,
    pub start: String,
    pub duration: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingTypeStats {
    pub resource: ResourceType,
    pub active: usize,
    pub completed: usize,
}
