// User profiles: language, notification preference and personal reminders.
// A profile is created the first time a user interacts with the bot.

use crate::core::storage::{
    new_record_id, Database, Document, DocumentKind, DocumentStore, DomainError, StoreError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Languages a user can pick. Replies are English; the preference is kept
/// for the day translations land.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("de", "Deutsch"),
    ("es", "Español"),
    ("fr", "Français"),
    ("pt", "Português"),
    ("tr", "Türkçe"),
];

/// Pending personal reminders allowed per user.
pub const MAX_PENDING_REMINDERS: usize = 25;

fn default_language() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReminder {
    pub id: String,
    pub message: String,
    pub remind_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub delivered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: u64,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default)]
    pub reminders: Vec<UserReminder>,
}

impl UserRecord {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            language: default_language(),
            notifications: true,
            reminders: Vec::new(),
        }
    }
}

/// `users.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsersDocument {
    #[serde(default)]
    pub users: HashMap<u64, UserRecord>,
}

impl UsersDocument {
    /// Notification preference, defaulting to on for users we haven't seen.
    pub fn wants_notifications(&self, user_id: u64) -> bool {
        self.users
            .get(&user_id)
            .map(|u| u.notifications)
            .unwrap_or(true)
    }
}

impl Document for UsersDocument {
    const KIND: DocumentKind = DocumentKind::Users;
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Unsupported language `{0}`.")]
    UnsupportedLanguage(String),
    #[error("Reminders must be in the future.")]
    ReminderInPast,
    #[error("Reminder text can't be empty.")]
    EmptyReminder,
    #[error("You already have {0} pending reminders.")]
    TooManyReminders(usize),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError for UserError {
    fn is_storage(&self) -> bool {
        matches!(self, UserError::Store(_))
    }
}

pub struct UserService<S: DocumentStore> {
    db: Arc<Database<S>>,
}

impl<S: DocumentStore> UserService<S> {
    pub fn new(db: Arc<Database<S>>) -> Self {
        Self { db }
    }

    /// Fetch a profile, creating it on first contact.
    pub async fn ensure(&self, user_id: u64) -> Result<UserRecord, UserError> {
        let document: UsersDocument = self.db.read().await?;
        if let Some(user) = document.users.get(&user_id) {
            return Ok(user.clone());
        }

        let user = self
            .db
            .update(|doc: &mut UsersDocument| {
                doc.users
                    .entry(user_id)
                    .or_insert_with(|| UserRecord::new(user_id))
                    .clone()
            })
            .await?;
        tracing::debug!(user_id, "Created user profile");
        Ok(user)
    }

    pub async fn get(&self, user_id: u64) -> Result<Option<UserRecord>, UserError> {
        let document: UsersDocument = self.db.read().await?;
        Ok(document.users.get(&user_id).cloned())
    }

    pub async fn set_language(&self, user_id: u64, language: &str) -> Result<String, UserError> {
        let code = language.trim().to_lowercase();
        if !SUPPORTED_LANGUAGES.iter().any(|(c, _)| *c == code) {
            return Err(UserError::UnsupportedLanguage(language.trim().to_string()));
        }

        self.db
            .update(|doc: &mut UsersDocument| {
                let user = doc
                    .users
                    .entry(user_id)
                    .or_insert_with(|| UserRecord::new(user_id));
                user.language = code.clone();
            })
            .await?;
        Ok(code)
    }

    /// Flip the booking-reminder preference and return the new value.
    pub async fn toggle_notifications(&self, user_id: u64) -> Result<bool, UserError> {
        let enabled = self
            .db
            .update(|doc: &mut UsersDocument| {
                let user = doc
                    .users
                    .entry(user_id)
                    .or_insert_with(|| UserRecord::new(user_id));
                user.notifications = !user.notifications;
                user.notifications
            })
            .await?;
        Ok(enabled)
    }

    pub async fn add_reminder(
        &self,
        user_id: u64,
        message: &str,
        remind_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<UserReminder, UserError> {
        let message = message.trim().to_string();
        if message.is_empty() {
            return Err(UserError::EmptyReminder);
        }
        if remind_at <= now {
            return Err(UserError::ReminderInPast);
        }

        let reminder = UserReminder {
            id: new_record_id(),
            message,
            remind_at,
            created_at: now,
            delivered: false,
        };

        self.db
            .try_update(|doc: &mut UsersDocument| -> Result<_, UserError> {
                let user = doc
                    .users
                    .entry(user_id)
                    .or_insert_with(|| UserRecord::new(user_id));
                user.reminders.retain(|r| !r.delivered);
                if user.reminders.len() >= MAX_PENDING_REMINDERS {
                    return Err(UserError::TooManyReminders(user.reminders.len()));
                }
                user.reminders.push(reminder.clone());
                Ok(reminder)
            })
            .await
    }

    /// Undelivered reminders, soonest first.
    pub async fn pending_reminders(&self, user_id: u64) -> Result<Vec<UserReminder>, UserError> {
        let document: UsersDocument = self.db.read().await?;
        let mut reminders: Vec<_> = document
            .users
            .get(&user_id)
            .map(|u| u.reminders.iter().filter(|r| !r.delivered).cloned().collect())
            .unwrap_or_default();
        reminders.sort_by_key(|r| r.remind_at);
        Ok(reminders)
    }

    /// Returns false if the reminder no longer exists.
    pub async fn mark_delivered(&self, user_id: u64, reminder_id: &str) -> Result<bool, UserError> {
        let found = self
            .db
            .update(|doc: &mut UsersDocument| {
                doc.users
                    .get_mut(&user_id)
                    .and_then(|u| u.reminders.iter_mut().find(|r| r.id == reminder_id))
                    .map(|r| r.delivered = true)
                    .is_some()
            })
            .await?;
        Ok(found)
    }

    pub async fn count(&self) -> Result<usize, UserError> {
        let document: UsersDocument = self.db.read().await?;
        Ok(document.users.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::test_support::{memory_database, MemoryStore};
    use chrono::Duration;

    fn service() -> UserService<MemoryStore> {
        UserService::new(memory_database())
    }

    #[tokio::test]
    async fn test_ensure_creates_once() {
        let service = service();

        let created = service.ensure(10).await.unwrap();
        assert_eq!(created.language, "en");
        assert!(created.notifications);

        service.toggle_notifications(10).await.unwrap();
        let again = service.ensure(10).await.unwrap();
        assert!(!again.notifications);
        assert_eq!(service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_language_must_be_supported() {
        let service = service();

        assert_eq!(service.set_language(1, " DE ").await.unwrap(), "de");
        assert!(matches!(
            service.set_language(1, "klingon").await,
            Err(UserError::UnsupportedLanguage(_))
        ));
        assert_eq!(service.get(1).await.unwrap().unwrap().language, "de");
    }

    #[tokio::test]
    async fn test_reminders_lifecycle() {
        let service = service();
        let now = Utc::now();

        let late = service
            .add_reminder(1, "later", now + Duration::hours(3), now)
            .await
            .unwrap();
        let soon = service
            .add_reminder(1, "sooner", now + Duration::hours(1), now)
            .await
            .unwrap();

        let pending = service.pending_reminders(1).await.unwrap();
        assert_eq!(pending[0].id, soon.id);
        assert_eq!(pending[1].id, late.id);

        assert!(service.mark_delivered(1, &soon.id).await.unwrap());
        assert!(!service.mark_delivered(1, "missing").await.unwrap());
        assert_eq!(service.pending_reminders(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reminder_validation() {
        let service = service();
        let now = Utc::now();

        assert!(matches!(
            service.add_reminder(1, "x", now - Duration::minutes(1), now).await,
            Err(UserError::ReminderInPast)
        ));
        assert!(matches!(
            service.add_reminder(1, "   ", now + Duration::hours(1), now).await,
            Err(UserError::EmptyReminder)
        ));
    }
}
