use crate::core::bookings::ResourceType;
use crate::core::storage::{Document, DocumentKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const HOUR_MS: u64 = 60 * 60 * 1000;

/// `reminders.json`: global booking-reminder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    pub enabled: bool,
    /// Offsets before a booking's start, in milliseconds.
    pub times: Vec<u64>,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            times: vec![24 * HOUR_MS, 6 * HOUR_MS, 3 * HOUR_MS, HOUR_MS],
        }
    }
}

impl Document for ReminderSettings {
    const KIND: DocumentKind = DocumentKind::Reminders;
}

/// What a planned reminder is about.
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderTarget {
    Booking {
        booking_id: String,
        resource: ResourceType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        offset_ms: u64,
    },
    Personal {
        reminder_id: String,
        message: String,
    },
}

/// A reminder the sweep decided to arm. The Discord layer owns the timer.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedReminder {
    /// Dedup key: `{bookingId}_{offsetMs}` or `user_{reminderId}`.
    pub key: String,
    pub user_id: u64,
    pub fire_at: DateTime<Utc>,
    pub target: ReminderTarget,
}

impl PlannedReminder {
    /// Time left until the timer should fire; zero if already due.
    pub fn delay_from(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.fire_at - now).to_std().unwrap_or_default()
    }
}
