// Hourly reminder loop: plan with the core service, arm one tokio timer per
// planned reminder, deliver by DM.

use crate::core::bookings::BookingService;
use crate::core::reminders::{PlannedReminder, ReminderService, ReminderTarget};
use crate::core::users::UserService;
use crate::discord::{embeds, Data};
use crate::infra::storage::JsonFileStore;
use chrono::Utc;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::time::sleep;

pub const SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(60 * 60);

#[derive(Clone)]
pub struct ReminderDispatcher {
    http: Arc<serenity::Http>,
    bookings: Arc<BookingService<JsonFileStore>>,
    reminders: Arc<ReminderService<JsonFileStore>>,
    users: Arc<UserService<JsonFileStore>>,
}

impl ReminderDispatcher {
    pub fn new(
        http: Arc<serenity::Http>,
        bookings: Arc<BookingService<JsonFileStore>>,
        reminders: Arc<ReminderService<JsonFileStore>>,
        users: Arc<UserService<JsonFileStore>>,
    ) -> Self {
        Self {
            http,
            bookings,
            reminders,
            users,
        }
    }

    pub fn from_data(http: Arc<serenity::Http>, data: &Data) -> Self {
        Self::new(
            http,
            Arc::clone(&data.bookings),
            Arc::clone(&data.reminders),
            Arc::clone(&data.users),
        )
    }

    /// Sweep right away, then once per interval, until the process exits.
    pub fn spawn(self) {
        tokio::spawn(async move {
            loop {
                self.sweep().await;
                sleep(SWEEP_INTERVAL).await;
            }
        });
    }

    /// Plan and arm everything due within the next hour. Already armed
    /// reminders are skipped, so extra sweeps are harmless.
    pub async fn sweep(&self) {
        let now = Utc::now();
        tracing::debug!("Reminder sweep starting");

        match self.bookings.complete_expired(now).await {
            Ok(0) => {}
            Ok(count) => tracing::info!(count, "Marked bookings as completed"),
            Err(e) => tracing::warn!(error = %e, "Failed to complete expired bookings"),
        }

        match self.reminders.sweep(now).await {
            Ok(planned) => {
                for reminder in planned {
                    self.arm(reminder);
                }
            }
            Err(e) => tracing::error!(error = %e, "Reminder sweep failed"),
        }
    }

    fn arm(&self, reminder: PlannedReminder) {
        let delay = reminder.delay_from(Utc::now());
        tracing::debug!(key = %reminder.key, user_id = reminder.user_id, delay_secs = delay.as_secs(), "Reminder armed");

        let dispatcher = self.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            dispatcher.deliver(reminder).await;
        });
    }

    async fn deliver(&self, reminder: PlannedReminder) {
        match self.reminders.still_due(&reminder).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(key = %reminder.key, user_id = reminder.user_id, "Reminder no longer due, skipped");
                return;
            }
            // Storage errors fall through to delivery.
            Err(e) => tracing::warn!(key = %reminder.key, error = %e, "Failed to re-check reminder, sending anyway"),
        }

        let embed = match &reminder.target {
            ReminderTarget::Booking {
                booking_id,
                resource,
                start,
                end,
                offset_ms,
            } => embeds::booking_reminder_embed(*resource, booking_id, *start, *end, *offset_ms),
            ReminderTarget::Personal { message, .. } => embeds::personal_reminder_embed(message),
        };

        let sent = serenity::UserId::new(reminder.user_id)
            .direct_message(&self.http, serenity::CreateMessage::new().embed(embed))
            .await;
        match &sent {
            Ok(_) => tracing::info!(key = %reminder.key, user_id = reminder.user_id, "Reminder sent"),
            Err(e) => tracing::warn!(
                key = %reminder.key,
                user_id = reminder.user_id,
                error = %e,
                "Failed to send reminder DM"
            ),
        }

        // Personal reminders are one-shot whether or not the DM got through.
        if let ReminderTarget::Personal { reminder_id, .. } = &reminder.target {
            if let Err(e) = self.users.mark_delivered(reminder.user_id, reminder_id).await {
                tracing::warn!(key = %reminder.key, error = %e, "Failed to mark reminder delivered");
            }
        }
    }
}
