//! Error handling for the CropGuard server
//!
//! Every failure is rendered as `{ "error": <message>, "code": <CODE> }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::ScanTransitionError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No farm associated with user. Please create a farm first.")]
    NoFarm,

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Scan pipeline
    #[error("Invalid scan state: {0}")]
    InvalidStateTransition(#[from] ScanTransitionError),

    // External service errors
    #[error("Failed to fetch weather data: {0}")]
    WeatherError(String),

    #[error("AI detection failed: {0}")]
    AiDetectionError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    // Database errors
    #[error("{0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ValidationError(_) | AppError::NoFarm => StatusCode::BAD_REQUEST,
            AppError::DuplicateEntry(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidStateTransition(_)
            | AppError::WeatherError(_)
            | AppError::AiDetectionError(_)
            | AppError::StorageError(_)
            | AppError::Persistence(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NoFarm => "NO_FARM",
            AppError::DuplicateEntry(_) => "DUPLICATE_ENTRY",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            AppError::WeatherError(_) => "WEATHER_ERROR",
            AppError::AiDetectionError(_) => "AI_DETECTION_ERROR",
            AppError::StorageError(_) => "STORAGE_ERROR",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message returned to clients. Database details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::NotFound(resource) => format!("{} not found", resource),
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::ValidationError(msg)
            | AppError::Persistence(msg)
            | AppError::Internal(msg) => msg.clone(),
            AppError::DuplicateEntry(field) => {
                format!("A record with this {} already exists", field)
            }
            other => other.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse::new(self.code(), self.public_message());

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ScanState;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NoFarm.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::ValidationError("Invalid image URL format".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Forbidden("farmers only".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::AiDetectionError("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_ai_error_message_is_verbatim() {
        let err = AppError::AiDetectionError("model offline".into());
        assert_eq!(err.public_message(), "AI detection failed: model offline");
    }

    #[test]
    fn test_transition_error_converts() {
        let err: AppError = ScanState::Done
            .transition(ScanState::Uploading)
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "INVALID_STATE_TRANSITION");
    }
}
