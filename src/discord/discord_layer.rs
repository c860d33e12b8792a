// Discord layer - commands, interaction routing and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "formatting/embeds.rs"]
pub mod embeds;

pub mod events;

pub mod guards;

#[path = "interactions/mod.rs"]
pub mod interactions;

#[path = "reminders/reminder_dispatcher.rs"]
pub mod reminders;

use crate::core::alliance::{AllianceService, LogService};
use crate::core::bookings::BookingService;
use crate::core::guilds::GuildService;
use crate::core::layout::LayoutService;
use crate::core::ministries::MinistryService;
use crate::core::permissions::PermissionService;
use crate::core::reminders::ReminderService;
use crate::core::schedule::ScheduleService;
use crate::core::storage::Database;
use crate::core::users::UserService;
use crate::infra::storage::JsonFileStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command and event.
pub struct Data {
    pub database: Arc<Database<JsonFileStore>>,
    pub users: Arc<UserService<JsonFileStore>>,
    pub bookings: Arc<BookingService<JsonFileStore>>,
    pub reminders: Arc<ReminderService<JsonFileStore>>,
    pub alliance: Arc<AllianceService<JsonFileStore>>,
    pub logs: Arc<LogService<JsonFileStore>>,
    pub permissions: Arc<PermissionService<JsonFileStore>>,
    pub ministries: Arc<MinistryService<JsonFileStore>>,
    pub schedule: Arc<ScheduleService<JsonFileStore>>,
    pub guilds: Arc<GuildService<JsonFileStore>>,
    pub layout: Arc<LayoutService<JsonFileStore>>,
    pub started_at: DateTime<Utc>,
}

impl Data {
    /// Wire every service onto one database.
    pub fn new(database: Arc<Database<JsonFileStore>>, fallback_owner: Option<u64>) -> Self {
        let logs = Arc::new(LogService::new(Arc::clone(&database)));
        Self {
            users: Arc::new(UserService::new(Arc::clone(&database))),
            bookings: Arc::new(BookingService::new(Arc::clone(&database))),
            reminders: Arc::new(ReminderService::new(Arc::clone(&database))),
            alliance: Arc::new(AllianceService::new(
                Arc::clone(&database),
                Arc::clone(&logs),
            )),
            permissions: Arc::new(PermissionService::new(
                Arc::clone(&database),
                Arc::clone(&logs),
                fallback_owner,
            )),
            ministries: Arc::new(MinistryService::new(
                Arc::clone(&database),
                Arc::clone(&logs),
            )),
            schedule: Arc::new(ScheduleService::new(Arc::clone(&database))),
            guilds: Arc::new(GuildService::new(Arc::clone(&database))),
            layout: Arc::new(LayoutService::new(Arc::clone(&database))),
            logs,
            database,
            started_at: Utc::now(),
        }
    }
}
