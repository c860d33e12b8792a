pub mod reminder_models;
pub mod reminder_service;

pub use reminder_models::*;
pub use reminder_service::*;
