mod audit;
mod auth;
mod config;
mod db;
mod error;
mod lifecycle;
mod state;
mod web_ui;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foodshare=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load();

    // Initialize database
    let db_path = PathBuf::from(&config.db_path);
    let db = db::init_database(&db_path)
        .await
        .expect("Failed to initialize database");
    let db = Arc::new(db);
    tracing::info!("Database initialized at {:?}", db_path);

    // Create application state
    let state = Arc::new(AppState::new(db));

    // Ensure default admin user exists (for bootstrapping)
    state
        .auth
        .ensure_admin_user(&state.db, "admin", "admin")
        .await
        .expect("Failed to create admin user");

    // Sweep expired sessions in the background
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60 * 60));
        loop {
            interval.tick().await;
            sweep_state.auth.cleanup_expired();
        }
    });

    // Build router
    let app = web_ui::router()
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("FoodShare server starting on http://{}", addr);
    tracing::info!("Default admin: admin/admin");
    tracing::info!("");
    tracing::info!("Role dashboards:");
    tracing::info!("  /admin    - user management, audit views, leaderboard");
    tracing::info!("  /canteen  - food listings, request decisions, waste reports");
    tracing::info!("  /ngo      - surplus browsing, pickups, impact reports");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
