// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "storage/mod.rs"]
pub mod storage;

#[path = "alliance/mod.rs"]
pub mod alliance;

#[path = "bookings/mod.rs"]
pub mod bookings;

#[path = "guilds/guild_service.rs"]
pub mod guilds;

#[path = "layout/layout_service.rs"]
pub mod layout;

#[path = "ministries/ministry_service.rs"]
pub mod ministries;

#[path = "permissions/permission_service.rs"]
pub mod permissions;

#[path = "reminders/mod.rs"]
pub mod reminders;

#[path = "schedule/schedule_service.rs"]
pub mod schedule;

#[path = "users/user_service.rs"]
pub mod users;
