pub mod booking_models;
pub mod booking_service;
pub mod booking_time;

pub use booking_models::*;
pub use booking_service::*;
pub use booking_time::{format_minutes, parse_duration, parse_start};
