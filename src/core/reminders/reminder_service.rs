// Reminder planning.
//
// Once an hour the Discord layer calls `sweep`. For every active booking and
// every configured offset, a reminder whose fire time falls inside
// `(now, now + horizon]` is planned once. Persisted personal reminders that are
// due inside the horizon (or overdue) are planned too. The caller arms one
// timer per returned reminder.
//
// The dedup map only lives in memory and is pruned on every sweep, so booking
// reminders armed before a restart are re-planned by the next sweep if they
// are still inside the window.

use super::reminder_models::{
    PlannedReminder, ReminderSettings, ReminderTarget, HOUR_MS,
};
use crate::core::bookings::BookingsDocument;
use crate::core::storage::{Database, DocumentStore, DomainError, StoreError};
use crate::core::users::UsersDocument;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

/// Sweep cadence and look-ahead window.
pub const SWEEP_HORIZON_MS: u64 = HOUR_MS;

/// Longest offset an admin can configure (one week).
pub const MAX_OFFSET_HOURS: u64 = 24 * 7;

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("Give at least one reminder time.")]
    NoTimes,
    #[error("Reminder times must be between 1 and {max} hours, got {0}.", max = MAX_OFFSET_HOURS)]
    InvalidTime(u64),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError for ReminderError {
    fn is_storage(&self) -> bool {
        matches!(self, ReminderError::Store(_))
    }
}

/// Booking reminders due in `(now, now + horizon]`. Pure; no dedup.
pub fn plan_booking_reminders(
    bookings: &BookingsDocument,
    settings: &ReminderSettings,
    now: DateTime<Utc>,
    horizon: Duration,
) -> Vec<PlannedReminder> {
    if !settings.enabled {
        return Vec::new();
    }

    let window_end = now + horizon;
    let mut planned = Vec::new();

    for (resource, booking) in bookings.iter_all() {
        if !booking.is_active() {
            continue;
        }
        for &offset_ms in &settings.times {
            let Some(fire_at) = i64::try_from(offset_ms)
                .ok()
                .and_then(Duration::try_milliseconds)
                .and_then(|offset| booking.start_date.checked_sub_signed(offset))
            else {
                continue;
            };
            if now < fire_at && fire_at <= window_end {
                planned.push(PlannedReminder {
                    key: format!("{}_{}", booking.id, offset_ms),
                    user_id: booking.user_id,
                    fire_at,
                    target: ReminderTarget::Booking {
                        booking_id: booking.id.clone(),
                        resource,
                        start: booking.start_date,
                        end: booking.end_date,
                        offset_ms,
                    },
                });
            }
        }
    }

    planned
}

/// Personal reminders due by `now + horizon`. Overdue ones fire right away.
pub fn plan_personal_reminders(
    users: &UsersDocument,
    now: DateTime<Utc>,
    horizon: Duration,
) -> Vec<PlannedReminder> {
    let window_end = now + horizon;
    users
        .users
        .values()
        .flat_map(|user| {
            user.reminders
                .iter()
                .filter(move |r| !r.delivered && r.remind_at <= window_end)
                .map(move |r| PlannedReminder {
                    key: format!("user_{}", r.id),
                    user_id: user.id,
                    fire_at: r.remind_at.max(now),
                    target: ReminderTarget::Personal {
                        reminder_id: r.id.clone(),
                        message: r.message.clone(),
                    },
                })
        })
        .collect()
}

pub struct ReminderService<S: DocumentStore> {
    db: Arc<Database<S>>,
    horizon: Duration,
    // Dedup key -> fire time of every reminder armed by this process.
    armed: DashMap<String, DateTime<Utc>>,
}

impl<S: DocumentStore> ReminderService<S> {
    pub fn new(db: Arc<Database<S>>) -> Self {
        Self {
            db,
            horizon: Duration::milliseconds(SWEEP_HORIZON_MS as i64),
            armed: DashMap::new(),
        }
    }

    /// Plan every reminder that is due inside the horizon and not yet armed.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<Vec<PlannedReminder>, ReminderError> {
        // Keys whose fire time is a full window behind can't be planned again.
        let cutoff = now - self.horizon;
        self.armed.retain(|_, fire_at| *fire_at > cutoff);

        let settings: ReminderSettings = self.db.read().await?;
        let bookings: BookingsDocument = self.db.read().await?;
        let users: UsersDocument = self.db.read().await?;

        let mut candidates: Vec<PlannedReminder> =
            plan_booking_reminders(&bookings, &settings, now, self.horizon)
                .into_iter()
                .filter(|p| users.wants_notifications(p.user_id))
                .collect();
        candidates.extend(plan_personal_reminders(&users, now, self.horizon));

        let fresh: Vec<PlannedReminder> = candidates
            .into_iter()
            .filter(|p| self.try_arm(p))
            .collect();

        if !fresh.is_empty() {
            tracing::info!(count = fresh.len(), "Armed reminders");
        }
        Ok(fresh)
    }

    /// Re-check a planned reminder right before it is delivered. Bookings may
    /// have been cancelled and users may have muted notifications since the
    /// sweep armed it.
    pub async fn still_due(&self, planned: &PlannedReminder) -> Result<bool, ReminderError> {
        let users: UsersDocument = self.db.read().await?;
        match &planned.target {
            ReminderTarget::Booking { booking_id, start, .. } => {
                let settings: ReminderSettings = self.db.read().await?;
                if !settings.enabled || !users.wants_notifications(planned.user_id) {
                    return Ok(false);
                }
                let bookings: BookingsDocument = self.db.read().await?;
                let active = bookings.iter_all().any(|(_, b)| {
                    b.id == *booking_id && b.is_active() && b.start_date == *start
                });
                Ok(active)
            }
            ReminderTarget::Personal { reminder_id, .. } => Ok(users
                .users
                .get(&planned.user_id)
                .is_some_and(|u| u.reminders.iter().any(|r| r.id == *reminder_id && !r.delivered))),
        }
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    pub async fn settings(&self) -> Result<ReminderSettings, ReminderError> {
        Ok(self.db.read().await?)
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<(), ReminderError> {
        self.db
            .update(|settings: &mut ReminderSettings| settings.enabled = enabled)
            .await?;
        Ok(())
    }

    /// Replace the offsets, given in hours. Stored in milliseconds, longest first.
    pub async fn set_times(&self, hours: &[u64]) -> Result<Vec<u64>, ReminderError> {
        if hours.is_empty() {
            return Err(ReminderError::NoTimes);
        }
        if let Some(&bad) = hours.iter().find(|&&h| h == 0 || h > MAX_OFFSET_HOURS) {
            return Err(ReminderError::InvalidTime(bad));
        }

        let mut times: Vec<u64> = hours.iter().map(|h| h * HOUR_MS).collect();
        times.sort_unstable_by(|a, b| b.cmp(a));
        times.dedup();

        let stored = times.clone();
        self.db
            .update(|settings: &mut ReminderSettings| settings.times = times)
            .await?;
        Ok(stored)
    }

    fn try_arm(&self, planned: &PlannedReminder) -> bool {
        match self.armed.entry(planned.key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(planned.fire_at);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bookings::{Booking, BookingStatus};
    use crate::core::storage::test_support::{memory_database, MemoryStore};
    use crate::core::users::{UserRecord, UserReminder};

    fn booking(id: &str, user_id: u64, start: DateTime<Utc>) -> Booking {
        Booking {
            id: id.to_string(),
            user_id,
            user_name: format!("user{}", user_id),
            start_date: start,
            end_date: start + Duration::days(1),
            duration: 24 * 60,
            notes: String::new(),
            status: BookingStatus::Active,
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_only_offsets_inside_window_are_planned() {
        // Start is 6h30m away: the 6h reminder fires in 30 minutes, the others don't fit.
        let start = now() + Duration::minutes(390);
        let bookings = BookingsDocument {
            building: vec![booking("b1", 1, start)],
            ..Default::default()
        };

        let planned = plan_booking_reminders(
            &bookings,
            &ReminderSettings::default(),
            now(),
            Duration::hours(1),
        );

        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].key, format!("b1_{}", 6 * HOUR_MS));
        assert_eq!(planned[0].fire_at, now() + Duration::minutes(30));
    }

    #[test]
    fn test_window_is_open_at_now_and_closed_at_horizon() {
        let bookings = BookingsDocument {
            research: vec![
                booking("now", 1, now() + Duration::hours(1)),
                booking("edge", 2, now() + Duration::hours(2)),
            ],
            ..Default::default()
        };
        let settings = ReminderSettings {
            enabled: true,
            times: vec![HOUR_MS],
        };

        let planned = plan_booking_reminders(&bookings, &settings, now(), Duration::hours(1));

        let keys: Vec<_> = planned.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec![format!("edge_{}", HOUR_MS)]);
    }

    #[test]
    fn test_disabled_settings_plan_nothing() {
        let bookings = BookingsDocument {
            training: vec![booking("t1", 1, now() + Duration::minutes(90))],
            ..Default::default()
        };
        let settings = ReminderSettings {
            enabled: false,
            ..Default::default()
        };

        assert!(plan_booking_reminders(&bookings, &settings, now(), Duration::hours(1)).is_empty());
    }

    #[test]
    fn test_completed_bookings_are_skipped() {
        let mut done = booking("done", 1, now() + Duration::minutes(90));
        done.status = BookingStatus::Completed;
        let bookings = BookingsDocument {
            building: vec![done],
            ..Default::default()
        };

        let planned =
            plan_booking_reminders(&bookings, &ReminderSettings::default(), now(), Duration::hours(1));
        assert!(planned.is_empty());
    }

    async fn seeded_service() -> ReminderService<MemoryStore> {
        let db = memory_database();
        db.write(&BookingsDocument {
            building: vec![
                booking("b1", 1, now() + Duration::minutes(90)),
                booking("b2", 2, now() + Duration::minutes(90)),
            ],
            ..Default::default()
        })
        .await
        .unwrap();

        let mut users = UsersDocument::default();
        let mut muted = UserRecord::new(2);
        muted.notifications = false;
        users.users.insert(2, muted);
        let mut with_reminder = UserRecord::new(3);
        with_reminder.reminders.push(UserReminder {
            id: "r1".to_string(),
            message: "rally".to_string(),
            remind_at: now() - Duration::minutes(5),
            created_at: now() - Duration::hours(2),
            delivered: false,
        });
        users.users.insert(3, with_reminder);
        db.write(&users).await.unwrap();

        ReminderService::new(db)
    }

    #[tokio::test]
    async fn test_sweep_skips_muted_users_and_fires_overdue_personal_reminders() {
        let service = seeded_service().await;

        let planned = service.sweep(now()).await.unwrap();

        let mut keys: Vec<_> = planned.iter().map(|p| p.key.clone()).collect();
        keys.sort();
        assert_eq!(keys, vec![format!("b1_{}", HOUR_MS), "user_r1".to_string()]);

        let personal = planned.iter().find(|p| p.key == "user_r1").unwrap();
        assert_eq!(personal.fire_at, now());
        assert_eq!(personal.delay_from(now()), std::time::Duration::ZERO);
    }

    #[tokio::test]
    async fn test_second_sweep_does_not_rearm() {
        let service = seeded_service().await;

        let first = service.sweep(now()).await.unwrap();
        let second = service
            .sweep(now() + Duration::minutes(10))
            .await
            .unwrap();

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(service.armed_count(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_booking_is_no_longer_due() {
        let service = seeded_service().await;
        let planned = service.sweep(now()).await.unwrap();
        let reminder = planned.iter().find(|p| p.key.starts_with("b1_")).unwrap();
        assert!(service.still_due(reminder).await.unwrap());

        service
            .db
            .update(|doc: &mut BookingsDocument| {
                doc.building.retain(|b| b.id != "b1");
            })
            .await
            .unwrap();

        assert!(!service.still_due(reminder).await.unwrap());
    }

    #[tokio::test]
    async fn test_muting_after_arming_stops_booking_reminder() {
        let service = seeded_service().await;
        let planned = service.sweep(now()).await.unwrap();
        let reminder = planned.iter().find(|p| p.key.starts_with("b1_")).unwrap();

        service
            .db
            .update(|doc: &mut UsersDocument| {
                let mut muted = UserRecord::new(1);
                muted.notifications = false;
                doc.users.insert(1, muted);
            })
            .await
            .unwrap();

        assert!(!service.still_due(reminder).await.unwrap());
    }

    #[tokio::test]
    async fn test_delivered_personal_reminder_is_no_longer_due() {
        let service = seeded_service().await;
        let planned = service.sweep(now()).await.unwrap();
        let personal = planned.iter().find(|p| p.key == "user_r1").unwrap();
        assert!(service.still_due(personal).await.unwrap());

        service
            .db
            .update(|doc: &mut UsersDocument| {
                if let Some(user) = doc.users.get_mut(&3) {
                    user.reminders[0].delivered = true;
                }
            })
            .await
            .unwrap();

        assert!(!service.still_due(personal).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_times_validates_and_sorts() {
        let service = ReminderService::new(memory_database());

        let stored = service.set_times(&[1, 24, 6, 6]).await.unwrap();
        assert_eq!(stored, vec![24 * HOUR_MS, 6 * HOUR_MS, HOUR_MS]);
        assert_eq!(service.settings().await.unwrap().times, stored);

        assert!(matches!(service.set_times(&[]).await, Err(ReminderError::NoTimes)));
        assert!(matches!(
            service.set_times(&[0]).await,
            Err(ReminderError::InvalidTime(0))
        ));
    }
}
