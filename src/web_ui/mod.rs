//! Web UI Module
//!
//! Server-rendered interface for the three account roles.

mod routes;
mod templates;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// Create the web UI router.
/// Mount this with `.merge(web_ui::router())` in main.rs
pub fn router() -> Router<Arc<AppState>> {
    routes::create_router()
}
