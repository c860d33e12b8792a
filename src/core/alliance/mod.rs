// Core alliance module - membership, ranks and the audit log.

pub mod alliance_log;
pub mod alliance_models;
pub mod alliance_service;

pub use alliance_log::*;
pub use alliance_models::*;
pub use alliance_service::*;
