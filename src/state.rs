//! Shared application state.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::AuthManager;

pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub auth: AuthManager,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            auth: AuthManager::new(),
        }
    }
}
