pub mod components;
pub mod handlers;
pub mod panel_action;

pub use handlers::handle_interaction;
