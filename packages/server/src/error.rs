use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::bulk_delete::BulkDeleteError;
use common::export::ExportError;
use common::repository::QueryError;
use common::storage::StorageError;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`,
    /// `CONFLICT`, `DEPENDENCY_CONFLICT`, `UPSTREAM_FAILURE`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Title must be 1-256 characters")]
    pub message: String,
    /// Underlying store error text, only for upstream failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    /// A reference row is still used by other rows.
    DependencyConflict(String),
    /// The relational store or blob service failed for reasons unrelated to
    /// the input.
    Upstream {
        message: String,
        detail: String,
    },
    Internal(String),
}

impl AppError {
    pub fn upstream(message: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        AppError::Upstream {
            message: message.into(),
            detail: detail.to_string(),
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let body = |code, message| ErrorBody {
            code,
            message,
            detail: None,
        };

        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, body("VALIDATION_ERROR", msg)),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                body("TOKEN_MISSING", "Authentication required".into()),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                body("TOKEN_INVALID", "Invalid or expired token".into()),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                body("INVALID_CREDENTIALS", "Invalid username or password".into()),
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                body("PERMISSION_DENIED", "Insufficient permissions".into()),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, body("NOT_FOUND", msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, body("CONFLICT", msg)),
            AppError::DependencyConflict(msg) => {
                (StatusCode::CONFLICT, body("DEPENDENCY_CONFLICT", msg))
            }
            AppError::Upstream { message, detail } => {
                tracing::error!(detail = %detail, "{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "UPSTREAM_FAILURE",
                        message,
                        detail: Some(detail),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    body("INTERNAL_ERROR", "An unexpected error occurred".into()),
                )
            }
        }
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
        if matches!(err, DbErr::RecordNotUpdated | DbErr::RecordNotFound(_)) {
            return AppError::NotFound("Record not found".into());
        }
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!("Unique constraint violation: {detail}");
                AppError::Conflict("A row with the same unique value already exists".into())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                tracing::debug!("Foreign key violation: {detail}");
                AppError::DependencyConflict(
                    "The row is still referenced by other records".into(),
                )
            }
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("File '{key}' not found")),
            StorageError::InvalidKey(msg) => AppError::Validation(msg),
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::Validation(format!("File exceeds maximum size of {limit} bytes"))
            }
            StorageError::InvalidToken => AppError::TokenInvalid,
            other => AppError::upstream("File storage request failed", other),
        }
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        let detail = err.store_error().to_string();
        AppError::upstream(err.to_string(), detail)
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::NoColumnsSelected | ExportError::UnsupportedFormat(_) => {
                AppError::Validation(err.to_string())
            }
            ExportError::NoMatchingRecords => AppError::NotFound(err.to_string()),
            ExportError::Query(e) => e.into(),
        }
    }
}

impl From<BulkDeleteError> for AppError {
    fn from(err: BulkDeleteError) -> Self {
        match err {
            BulkDeleteError::Invalid(msg) => AppError::Validation(msg),
            BulkDeleteError::Lookup(ref e) | BulkDeleteError::Delete(ref e) => {
                let detail = e.to_string();
                AppError::upstream(err.to_string(), detail)
            }
        }
    }
}
