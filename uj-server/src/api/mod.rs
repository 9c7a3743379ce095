//! HTTP API handlers for uj-server

pub mod error;
pub mod export;
pub mod forms;
pub mod health;
pub mod records;
pub mod ui;

pub use error::ApiError;
pub use forms::form_routes;
pub use health::health_routes;
pub use records::entity_routes;
pub use ui::ui_routes;
