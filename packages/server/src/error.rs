use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

use crate::models::shared::ValidationError;
use crate::services::recipe::RecipeError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `NOT_FOUND`, `CONFLICT`,
    /// `EMAIL_TAKEN`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "time_minutes must be >= 0")]
    pub message: String,
    /// Name of the offending request field, when a single field is at fault.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "time_minutes")]
    pub field: Option<&'static str>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    InvalidField {
        field: &'static str,
        message: String,
    },
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    NotFound(String),
    Conflict(String),
    EmailTaken,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message, field) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None),
            AppError::InvalidField { field, message } => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                message,
                Some(field),
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
                None,
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
                None,
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".into(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                "A user with this email already exists".into(),
                None,
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                    None,
                )
            }
        };

        (
            status,
            ErrorBody {
                code,
                message,
                field,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidField {
            field: err.field,
            message: err.message,
        }
    }
}

impl From<RecipeError> for AppError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::Validation(e) => e.into(),
            RecipeError::Conflict(msg) => {
                tracing::warn!("Recipe reconciliation conflict: {msg}");
                AppError::Conflict(msg)
            }
            RecipeError::Database(e) => e.into(),
        }
    }
}
