use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::db::services::TodoError;
use crate::services::validation::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("Too many requests, retry after {retry_after_secs}s")]
    TooManyRequests { retry_after_secs: u64 },
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Validation failed", "errors": errors })),
            )
                .into_response(),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(json!({ "error": "Invalid or missing credentials" })),
            )
                .into_response(),
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            AppError::PreconditionFailed(msg) => {
                (StatusCode::PRECONDITION_FAILED, Json(json!({ "error": msg }))).into_response()
            }
            AppError::TooManyRequests { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                Json(json!({ "error": "Too many requests" })),
            )
                .into_response(),
            AppError::DatabaseError(msg) | AppError::InternalServerError(msg) => {
                // Full detail goes to the log only.
                error!(error = %msg, "Request failed with an internal error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "An unexpected error occurred." })),
                )
                    .into_response()
            }
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalServerError(format!("JSON serialization/deserialization error: {err}"))
    }
}

impl From<TodoError> for AppError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::DbErr(e) => e.into(),
            TodoError::Serialization(e) => e.into(),
            TodoError::NotFound(id) => AppError::NotFound(format!("Todo item {id} not found")),
            TodoError::Validation(errors) => AppError::Validation(errors),
            TodoError::PreconditionFailed(id) => AppError::PreconditionFailed(format!(
                "Todo item {id} was modified or the If-Match tag is missing"
            )),
        }
    }
}
