// Booking service - reservation of time windows on alliance resources.
//
// This service handles:
// - Validation of user-typed start dates and durations
// - Overlap detection per resource type (half-open intervals)
// - Cancellation by the booking owner or a bot admin
// - Marking finished bookings as completed
//
// NO Discord dependencies here - just pure domain logic.

use super::booking_models::{
    Booking, BookingStatus, BookingTypeStats, BookingsDocument, NewBooking, ResourceType,
};
use super::booking_time::{parse_duration, parse_start};
use crate::core::storage::{
    new_record_id, Database, DocumentStore, DomainError, StoreError,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Invalid start date `{0}`. Use YYYY-MM-DD or YYYY-MM-DD HH:MM (UTC).")]
    InvalidDate(String),

    #[error("Invalid duration `{0}`. Use formats like `3d`, `12h` or `90m`.")]
    InvalidDuration(String),

    #[error("Duration must be greater than zero.")]
    NonPositiveDuration,

    #[error("That booking would already be over.")]
    InPast,

    #[error(
        "This slot overlaps the {} booking of {} ({} → {}).",
        .0.id,
        .0.user_name,
        .0.start_date.format("%Y-%m-%d %H:%M"),
        .0.end_date.format("%Y-%m-%d %H:%M")
    )]
    Conflict(Box<Booking>),

    #[error("Booking `{0}` was not found.")]
    NotFound(String),

    #[error("Only the booking owner or a bot admin can cancel this booking.")]
    NotAllowed,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError for BookingError {
    fn is_storage(&self) -> bool {
        matches!(self, BookingError::Store(_))
    }
}

/// Find the first booking of `resource` that intersects `[start, end)`,
/// ignoring the booking with id `exclude_id`.
pub fn find_conflict<'a>(
    document: &'a BookingsDocument,
    resource: ResourceType,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<&str>,
) -> Option<&'a Booking> {
    document
        .of(resource)
        .iter()
        .filter(|b| Some(b.id.as_str()) != exclude_id)
        .find(|b| b.overlaps(start, end))
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct BookingService<S: DocumentStore> {
    db: Arc<Database<S>>,
}

impl<S: DocumentStore> BookingService<S> {
    pub fn new(db: Arc<Database<S>>) -> Self {
        Self { db }
    }

    /// True if `[start, end)` intersects an existing booking of that type.
    pub async fn check_conflict(
        &self,
        resource: ResourceType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> Result<bool, BookingError> {
        let document: BookingsDocument = self.db.read().await?;
        Ok(find_conflict(&document, resource, start, end, exclude_id).is_some())
    }

    /// Validate and store a new booking.
    pub async fn create(
        &self,
        request: NewBooking,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        let start = parse_start(&request.start)
            .ok_or_else(|| BookingError::InvalidDate(request.start.trim().to_string()))?;
        let duration = parse_duration(&request.duration)
            .ok_or_else(|| BookingError::InvalidDuration(request.duration.trim().to_string()))?;
        if duration <= chrono::Duration::zero() {
            return Err(BookingError::NonPositiveDuration);
        }

        let end = start
            .checked_add_signed(duration)
            .ok_or_else(|| BookingError::InvalidDuration(request.duration.trim().to_string()))?;
        if end <= now {
            return Err(BookingError::InPast);
        }

        let booking = Booking {
            id: new_record_id(),
            user_id: request.user_id,
            user_name: request.user_name,
            start_date: start,
            end_date: end,
            duration: duration.num_minutes(),
            notes: request.notes.trim().to_string(),
            status: BookingStatus::Active,
        };

        let resource = request.resource;
        let created = self
            .db
            .try_update(|doc: &mut BookingsDocument| -> Result<_, BookingError> {
                if let Some(existing) = find_conflict(doc, resource, start, end, None) {
                    return Err(BookingError::Conflict(Box::new(existing.clone())));
                }
                doc.of_mut(resource).push(booking.clone());
                Ok(booking)
            })
            .await?;

        tracing::info!(
            booking_id = %created.id,
            user_id = created.user_id,
            resource = %resource,
            "Booking created"
        );
        Ok(created)
    }

    /// Remove a booking. `privileged` callers (owner/admins) may cancel anyone's.
    pub async fn cancel(
        &self,
        booking_id: &str,
        actor_id: u64,
        privileged: bool,
    ) -> Result<(ResourceType, Booking), BookingError> {
        let booking_id = booking_id.trim().to_string();
        self.db
            .try_update(|doc: &mut BookingsDocument| -> Result<_, BookingError> {
                for resource in ResourceType::ALL {
                    let list = doc.of_mut(resource);
                    if let Some(pos) = list.iter().position(|b| b.id == booking_id) {
                        if !privileged && list[pos].user_id != actor_id {
                            return Err(BookingError::NotAllowed);
                        }
                        return Ok((resource, list.remove(pos)));
                    }
                }
                Err(BookingError::NotFound(booking_id))
            })
            .await
    }

    /// Bookings of one type, earliest first.
    pub async fn list(&self, resource: ResourceType) -> Result<Vec<Booking>, BookingError> {
        let document: BookingsDocument = self.db.read().await?;
        let mut bookings = document.of(resource).clone();
        bookings.sort_by_key(|b| b.start_date);
        Ok(bookings)
    }

    pub async fn find(&self, booking_id: &str) -> Result<Option<(ResourceType, Booking)>, BookingError> {
        let document: BookingsDocument = self.db.read().await?;
        let found = document
            .iter_all()
            .find(|(_, b)| b.id == booking_id.trim())
            .map(|(t, b)| (t, b.clone()));
        Ok(found)
    }

    /// A user's active bookings across every type, earliest first.
    pub async fn list_for_user(
        &self,
        user_id: u64,
    ) -> Result<Vec<(ResourceType, Booking)>, BookingError> {
        let document: BookingsDocument = self.db.read().await?;
        let mut bookings: Vec<_> = document
            .iter_all()
            .filter(|(_, b)| b.user_id == user_id && b.is_active())
            .map(|(t, b)| (t, b.clone()))
            .collect();
        bookings.sort_by_key(|(_, b)| b.start_date);
        Ok(bookings)
    }

    /// Active bookings that haven't ended yet, across every type.
    pub async fn upcoming(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(ResourceType, Booking)>, BookingError> {
        let document: BookingsDocument = self.db.read().await?;
        let mut bookings: Vec<_> = document
            .iter_all()
            .filter(|(_, b)| b.is_active() && b.end_date > now)
            .map(|(t, b)| (t, b.clone()))
            .collect();
        bookings.sort_by_key(|(_, b)| b.start_date);
        bookings.truncate(limit);
        Ok(bookings)
    }

    /// Mark every active booking that ended at or before `now` as completed.
    pub async fn complete_expired(&self, now: DateTime<Utc>) -> Result<usize, BookingError> {
        let document: BookingsDocument = self.db.read().await?;
        if !document
            .iter_all()
            .any(|(_, b)| b.is_active() && b.end_date <= now)
        {
            return Ok(0);
        }

        let completed = self
            .db
            .update(|doc: &mut BookingsDocument| {
                let mut completed = 0;
                for resource in ResourceType::ALL {
                    for booking in doc.of_mut(resource).iter_mut() {
                        if booking.is_active() && booking.end_date <= now {
                            booking.status = BookingStatus::Completed;
                            completed += 1;
                        }
                    }
                }
                completed
            })
            .await?;
        Ok(completed)
    }

    pub async fn stats(&self) -> Result<Vec<BookingTypeStats>, BookingError> {
        let document: BookingsDocument = self.db.read().await?;
        Ok(ResourceType::ALL
            .into_iter()
            .map(|resource| {
                let list = document.of(resource);
                let active = list.iter().filter(|b| b.is_active()).count();
                BookingTypeStats {
                    resource,
                    active,
                    completed: list.len() - active,
                }
            })
            .collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bookings::booking_time::parse_start;
    use crate::core::storage::test_support::{memory_database, MemoryStore};

    fn at(input: &str) -> DateTime<Utc> {
        parse_start(input).unwrap()
    }

    fn request(resource: ResourceType, user_id: u64, start: &str, duration: &str) -> NewBooking {
        NewBooking {
            resource,
            user_id,
            user_name: format!("user{}", user_id),
            start: start.to_string(),
            duration: duration.to_string(),
            notes: String::new(),
        }
    }

    fn service() -> BookingService<MemoryStore> {
        BookingService::new(memory_database())
    }

    fn early() -> DateTime<Utc> {
        at("2024-01-01")
    }

    #[tokio::test]
    async fn test_overlapping_interval_conflicts() {
        let service = service();
        service
            .create(request(ResourceType::Building, 1, "2024-03-01", "4d"), early())
            .await
            .unwrap();

        let inside = service
            .check_conflict(ResourceType::Building, at("2024-03-02"), at("2024-03-04"), None)
            .await
            .unwrap();
        let after = service
            .check_conflict(ResourceType::Building, at("2024-03-06"), at("2024-03-08"), None)
            .await
            .unwrap();

        assert!(inside);
        assert!(!after);
    }

    #[tokio::test]
    async fn test_back_to_back_bookings_do_not_conflict() {
        let service = service();
        service
            .create(request(ResourceType::Research, 1, "2024-03-01", "4d"), early())
            .await
            .unwrap();

        let result = service
            .create(request(ResourceType::Research, 2, "2024-03-05", "1d"), early())
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_conflict_is_per_resource_type() {
        let service = service();
        service
            .create(request(ResourceType::Building, 1, "2024-03-01", "4d"), early())
            .await
            .unwrap();

        let result = service
            .create(request(ResourceType::Training, 2, "2024-03-02", "1d"), early())
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_rejects_overlap_and_names_the_other_booking() {
        let service = service();
        let first = service
            .create(request(ResourceType::Building, 1, "2024-03-01", "4d"), early())
            .await
            .unwrap();

        let err = service
            .create(request(ResourceType::Building, 2, "2024-03-04 12:00", "2d"), early())
            .await
            .unwrap_err();

        match err {
            BookingError::Conflict(other) => assert_eq!(other.id, first.id),
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(service.list(ResourceType::Building).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_excluded_booking_is_ignored() {
        let service = service();
        let first = service
            .create(request(ResourceType::Building, 1, "2024-03-01", "4d"), early())
            .await
            .unwrap();

        let conflict = service
            .check_conflict(
                ResourceType::Building,
                at("2024-03-02"),
                at("2024-03-03"),
                Some(&first.id),
            )
            .await
            .unwrap();

        assert!(!conflict);
    }

    #[test]
    fn test_conflict_predicate_matches_interval_formula() {
        let base = at("2024-03-10");
        let hours = |h: i64| base + chrono::Duration::hours(h);
        let existing = Booking {
            id: "a".to_string(),
            user_id: 1,
            user_name: "a".to_string(),
            start_date: hours(10),
            end_date: hours(20),
            duration: 600,
            notes: String::new(),
            status: BookingStatus::Active,
        };
        let document = BookingsDocument {
            building: vec![existing.clone()],
            ..Default::default()
        };

        for start in 0..30 {
            for len in 1..12 {
                let (s, e) = (hours(start), hours(start + len));
                let expected = s < existing.end_date && e > existing.start_date;
                let found = find_conflict(&document, ResourceType::Building, s, e, None).is_some();
                assert_eq!(found, expected, "start={start} len={len}");
            }
        }
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let service = service();

        let bad_date = service
            .create(request(ResourceType::Building, 1, "tomorrow", "1d"), early())
            .await;
        let bad_duration = service
            .create(request(ResourceType::Building, 1, "2024-03-01", "forever"), early())
            .await;
        let zero = service
            .create(request(ResourceType::Building, 1, "2024-03-01", "0h"), early())
            .await;
        let past = service
            .create(request(ResourceType::Building, 1, "2023-03-01", "1d"), early())
            .await;

        assert!(matches!(bad_date, Err(BookingError::InvalidDate(_))));
        assert!(matches!(bad_duration, Err(BookingError::InvalidDuration(_))));
        assert!(matches!(zero, Err(BookingError::NonPositiveDuration)));
        assert!(matches!(past, Err(BookingError::InPast)));
    }

    #[tokio::test]
    async fn test_end_date_out_of_range_is_invalid_duration() {
        let service = service();

        let huge = service
            .create(request(ResourceType::Research, 1, "2024-03-01", "100000000d"), early())
            .await;
        let overflow = service
            .create(request(ResourceType::Research, 1, "2024-03-01", "200000000000"), early())
            .await;

        assert!(matches!(huge, Err(BookingError::InvalidDuration(d)) if d == "100000000d"));
        assert!(matches!(overflow, Err(BookingError::InvalidDuration(_))));
        assert!(service.list(ResourceType::Research).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_can_cancel() {
        let service = service();
        let booking = service
            .create(request(ResourceType::Training, 1, "2024-03-01", "1d"), early())
            .await
            .unwrap();

        let (resource, found) = service.find(&booking.id).await.unwrap().unwrap();
        assert_eq!((resource, found.user_id), (ResourceType::Training, 1));

        let stranger = service.cancel(&booking.id, 2, false).await;
        assert!(matches!(stranger, Err(BookingError::NotAllowed)));

        let (resource, removed) = service.cancel(&booking.id, 2, true).await.unwrap();
        assert_eq!(resource, ResourceType::Training);
        assert_eq!(removed.id, booking.id);

        assert!(service.find(&booking.id).await.unwrap().is_none());
        let again = service.cancel(&booking.id, 1, false).await;
        assert!(matches!(again, Err(BookingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_complete_expired_marks_finished_bookings() {
        let service = service();
        service
            .create(request(ResourceType::Building, 1, "2024-03-01", "1d"), early())
            .await
            .unwrap();
        service
            .create(request(ResourceType::Building, 1, "2024-03-10", "1d"), early())
            .await
            .unwrap();

        let completed = service.complete_expired(at("2024-03-05")).await.unwrap();
        assert_eq!(completed, 1);

        let stats = service.stats().await.unwrap();
        let building = stats
            .iter()
            .find(|s| s.resource == ResourceType::Building)
            .unwrap();
        assert_eq!((building.active, building.completed), (1, 1));

        let mine = service.list_for_user(1).await.unwrap();
        assert_eq!(mine.len(), 1);
    }
}
