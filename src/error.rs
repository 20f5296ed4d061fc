//! Error types for the lending server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::request::RequestStatus;

/// Postgres SQLSTATE for serialization failures
const PG_SERIALIZATION_FAILURE: &str = "40001";
/// Postgres SQLSTATE for detected deadlocks
const PG_DEADLOCK_DETECTED: &str = "40P01";
/// Postgres SQLSTATE for unique constraint violations
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Numeric error codes returned in error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NotFound = 4,
    InvalidState = 5,
    InsufficientInventory = 6,
    OverReturn = 7,
    ConcurrencyConflict = 8,
    Duplicate = 9,
    BadValue = 10,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request {id} is {current}, operation requires {expected}")]
    InvalidState {
        id: Uuid,
        current: RequestStatus,
        expected: &'static str,
    },

    #[error("Not enough inventory for {equipment}: {available} available, {requested} requested")]
    InsufficientInventory {
        equipment: String,
        available: i32,
        requested: i32,
    },

    #[error("Cannot return {returned_now} unit(s) of request {id}: {returned} of {quantity} already returned")]
    OverReturn {
        id: Uuid,
        quantity: i32,
        returned: i32,
        returned_now: i32,
    },

    #[error("Concurrent update conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|c| c.into_owned());

        match code.as_deref() {
            Some(PG_SERIALIZATION_FAILURE) | Some(PG_DEADLOCK_DETECTED) => {
                AppError::ConcurrencyConflict(err.to_string())
            }
            Some(PG_UNIQUE_VIOLATION) => AppError::Conflict("Record already exists".to_string()),
            _ => AppError::Database(err),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            AppError::InvalidState { .. } => (StatusCode::CONFLICT, ErrorCode::InvalidState),
            AppError::InsufficientInventory { .. } => {
                (StatusCode::CONFLICT, ErrorCode::InsufficientInventory)
            }
            AppError::OverReturn { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::OverReturn)
            }
            AppError::ConcurrencyConflict(_) => {
                (StatusCode::CONFLICT, ErrorCode::ConcurrencyConflict)
            }
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Duplicate),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::ConcurrencyConflict(msg) => {
                tracing::warn!("Concurrency conflict: {}", msg);
                "The record was modified concurrently, please retry".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
