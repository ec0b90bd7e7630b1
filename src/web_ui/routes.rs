//! Web UI route handlers.

mod admin_handlers;
mod auth_handlers;
mod canteen_handlers;
mod ngo_handlers;
mod utils;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::state::AppState;

/// Create the web UI router with all role-gated routes
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        // Auth & general
        .route("/", get(auth_handlers::home))
        .route("/login", get(auth_handlers::login_page).post(auth_handlers::login_submit))
        .route("/logout", get(auth_handlers::logout))
        // Admin
        .route("/admin", get(admin_handlers::dashboard))
        .route(
            "/admin/add_user",
            get(admin_handlers::add_user_page).post(admin_handlers::add_user_submit),
        )
        .route(
            "/admin/manage_users",
            get(admin_handlers::manage_users_page).post(admin_handlers::manage_users_submit),
        )
        .route("/admin/view_logs", get(admin_handlers::view_logs))
        .route("/admin/view_activity", get(admin_handlers::view_activity))
        .route("/admin/view_reports", get(admin_handlers::view_reports))
        .route("/admin/view_leaderboard", get(admin_handlers::view_leaderboard))
        .route("/admin/impact", get(admin_handlers::impact))
        // Canteen
        .route("/canteen", get(canteen_handlers::dashboard))
        .route(
            "/canteen/add_food",
            get(canteen_handlers::add_food_page).post(canteen_handlers::add_food_submit),
        )
        .route(
            "/canteen/manage_requests",
            get(canteen_handlers::manage_requests_page)
                .post(canteen_handlers::manage_requests_submit),
        )
        .route(
            "/canteen/edit_food/:food_id",
            get(canteen_handlers::edit_food_page).post(canteen_handlers::edit_food_submit),
        )
        .route("/canteen/delete_food/:food_id", post(canteen_handlers::delete_food))
        .route(
            "/canteen/file_waste_report",
            get(canteen_handlers::file_waste_report_page)
                .post(canteen_handlers::file_waste_report_submit),
        )
        .route("/canteen/leaderboard", get(canteen_handlers::view_leaderboard))
        // NGO
        .route("/ngo", get(ngo_handlers::dashboard))
        .route("/ngo/request", post(ngo_handlers::request_pickup))
        .route("/ngo/history", get(ngo_handlers::history))
        .route(
            "/ngo/record_beneficiaries",
            get(ngo_handlers::record_beneficiaries_page)
                .post(ngo_handlers::record_beneficiaries_submit),
        )
}
