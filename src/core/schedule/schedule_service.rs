// Alliance event schedule (rallies, bear hunts, ...) with optional repetition.

use crate::core::storage::{
    new_record_id, Database, Document, DocumentKind, DocumentStore, DomainError, StoreError,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Longest supported repeat interval: four weeks.
pub const MAX_REPEAT_HOURS: u32 = 24 * 28;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEvent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub repeat_hours: Option<u32>,
    pub created_by: u64,
}

impl ScheduledEvent {
    /// First occurrence at or after `now`. One-off events in the past have none.
    pub fn next_occurrence(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.starts_at >= now {
            return Some(self.starts_at);
        }
        let step = Duration::hours(i64::from(self.repeat_hours.filter(|h| *h > 0)?));
        let elapsed = (now - self.starts_at).num_seconds();
        let periods = (elapsed + step.num_seconds() - 1) / step.num_seconds();
        Some(self.starts_at + Duration::seconds(periods * step.num_seconds()))
    }
}

/// `advanced_bookings.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    #[serde(default)]
    pub events: Vec<ScheduledEvent>,
}

impl Document for ScheduleDocument {
    const KIND: DocumentKind = DocumentKind::Schedule;
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub starts_at: String,
    pub repeat_hours: Option<u32>,
    pub created_by: u64,
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Event title can't be empty.")]
    EmptyTitle,
    #[error("Invalid start time `{0}`. Use YYYY-MM-DD HH:MM (UTC).")]
    InvalidDate(String),
    #[error("One-off events must start in the future.")]
    InPast,
    #[error("Repeat interval must be 1-{max} hours.", max = MAX_REPEAT_HOURS)]
    InvalidRepeat,
    #[error("Event `{0}` was not found.")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError for ScheduleError {
    fn is_storage(&self) -> bool {
        matches!(self, ScheduleError::Store(_))
    }
}

pub struct ScheduleService<S: DocumentStore> {
    db: Arc<Database<S>>,
}

impl<S: DocumentStore> ScheduleService<S> {
    pub fn new(db: Arc<Database<S>>) -> Self {
        Self { db }
    }

    pub async fn add_event(
        &self,
        request: NewEvent,
        now: DateTime<Utc>,
    ) -> Result<ScheduledEvent, ScheduleError> {
        let title = request.title.trim().to_string();
        if title.is_empty() {
            return Err(ScheduleError::EmptyTitle);
        }
        let starts_at = crate::core::bookings::parse_start(&request.starts_at)
            .ok_or_else(|| ScheduleError::InvalidDate(request.starts_at.trim().to_string()))?;
        if let Some(hours) = request.repeat_hours {
            if hours == 0 || hours > MAX_REPEAT_HOURS {
                return Err(ScheduleError::InvalidRepeat);
            }
        } else if starts_at <= now {
            return Err(ScheduleError::InPast);
        }

        let event = ScheduledEvent {
            id: new_record_id(),
            title,
            description: request.description.trim().to_string(),
            starts_at,
            repeat_hours: request.repeat_hours,
            created_by: request.created_by,
        };

        self.db
            .update(|doc: &mut ScheduleDocument| doc.events.push(event.clone()))
            .await?;
        tracing::info!(event_id = %event.id, title = %event.title, "Scheduled event");
        Ok(event)
    }

    pub async fn remove_event(&self, id: &str) -> Result<ScheduledEvent, ScheduleError> {
        let id = id.trim();
        self.db
            .try_update(|doc: &mut ScheduleDocument| -> Result<_, ScheduleError> {
                let pos = doc
                    .events
                    .iter()
                    .position(|e| e.id == id)
                    .ok_or_else(|| ScheduleError::NotFound(id.to_string()))?;
                Ok(doc.events.remove(pos))
            })
            .await
    }

    /// Events with an occurrence at or after `now`, soonest first, paired
    /// with that occurrence.
    pub async fn upcoming(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(DateTime<Utc>, ScheduledEvent)>, ScheduleError> {
        let document: ScheduleDocument = self.db.read().await?;
        let mut events: Vec<_> = document
            .events
            .into_iter()
            .filter_map(|e| e.next_occurrence(now).map(|at| (at, e)))
            .collect();
        events.sort_by_key(|(at, _)| *at);
        events.truncate(limit);
        Ok(events)
    }
}
