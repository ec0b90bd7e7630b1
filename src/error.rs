use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Please sign in")]
    AuthRequired,

    #[error("Invalid username or password")]
    AuthFailed,

    #[error("You do not have permission to access this page")]
    PermissionDenied,

    #[error("Database error")]
    Db(#[from] sea_orm::DbErr),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::InvalidTransition(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::AuthRequired => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::AuthFailed => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::PermissionDenied => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::Db(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, message).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
