//! uj-server library - University Journal HTTP service
//!
//! REST CRUD for groups, students, teachers, subjects and grades, table
//! exports (CSV/PDF) and HTML pages to list, add, edit and delete records.

use axum::Router;
use std::path::PathBuf;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uj_common::{Grade, Group, SqliteGateway, Student, Subject, Teacher};

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: SqliteGateway,
    /// Configured PDF font; `None` uses the bundled font
    pub pdf_font: Option<PathBuf>,
}

impl AppState {
    pub fn new(gateway: SqliteGateway, pdf_font: Option<PathBuf>) -> Self {
        Self { gateway, pdf_font }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::ui_routes())
        .merge(api::form_routes())
        .merge(api::entity_routes::<Group>())
        .merge(api::entity_routes::<Student>())
        .merge(api::entity_routes::<Teacher>())
        .merge(api::entity_routes::<Subject>())
        .merge(api::entity_routes::<Grade>())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
