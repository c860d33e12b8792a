// Storage port for the flat-file documents.
//
// Each domain lives in exactly one JSON document. The core only knows the
// document kinds and a load/save contract; the infra layer decides where the
// bytes go.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Every document the bot persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Users,
    Bookings,
    Alliance,
    Permissions,
    Reminders,
    AllianceLogs,
    Ministries,
    Schedule,
    Guilds,
    ButtonLayout,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 10] = [
        DocumentKind::Users,
        DocumentKind::Bookings,
        DocumentKind::Alliance,
        DocumentKind::Permissions,
        DocumentKind::Reminders,
        DocumentKind::AllianceLogs,
        DocumentKind::Ministries,
        DocumentKind::Schedule,
        DocumentKind::Guilds,
        DocumentKind::ButtonLayout,
    ];

    /// File name inside the data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            DocumentKind::Users => "users.json",
            DocumentKind::Bookings => "bookings.json",
            DocumentKind::Alliance => "alliance.json",
            DocumentKind::Permissions => "permissions.json",
            DocumentKind::Reminders => "reminders.json",
            DocumentKind::AllianceLogs => "alliance_logs.json",
            DocumentKind::Ministries => "ministries.json",
            DocumentKind::Schedule => "advanced_bookings.json",
            DocumentKind::Guilds => "guilds.json",
            DocumentKind::ButtonLayout => "button_layout.json",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Raw document persistence. `load` returns `None` when the document has
/// never been written.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, kind: DocumentKind) -> Result<Option<Value>, StoreError>;
    async fn save(&self, kind: DocumentKind, value: &Value) -> Result<(), StoreError>;
}

/// A typed document bound to its storage slot.
pub trait Document: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    const KIND: DocumentKind;
}

/// Implemented by every service error so the Discord layer can tell a
/// user mistake (shown verbatim) from a storage failure (logged, generic reply).
pub trait DomainError: std::error::Error + Send + Sync + 'static {
    fn is_storage(&self) -> bool;
}

impl DomainError for StoreError {
    fn is_storage(&self) -> bool {
        true
    }
}

/// Short, mostly time-ordered id for records inside a document.
pub fn new_record_id() -> String {
    let millis = Utc::now().timestamp_millis() as u64;
    let suffix: u16 = rand::thread_rng().gen();
    format!("{:x}{:04x}", millis & 0xff_ffff_ffff, suffix)
}
