use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    InternalError,
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred")
            }
            AppError::Engine(ref e) => {
                tracing::error!("Engine error: {:?}", e);
                let message = match e {
                    EngineError::DataAccess(_) | EngineError::Persistence(_) => {
                        "Database error occurred"
                    }
                    EngineError::Aborted(_) => "Internal server error",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            AppError::Validation(ref msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.as_str()),
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, msg.as_str()),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.as_str()),
            AppError::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failures raised inside the reminder engine.
///
/// `DataAccess` aborts the job that hit it, `Persistence` aborts a single
/// recipient's notification. Email failures live in
/// [`crate::email::email_sender::DeliveryError`] and never surface through this type.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("data access error: {0}")]
    DataAccess(#[source] sqlx::Error),

    #[error("persistence error: {0}")]
    Persistence(#[source] sqlx::Error),

    #[error("job aborted: {0}")]
    Aborted(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
