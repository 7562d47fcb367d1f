use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::constants::{
    ERR_CATEGORY_NOT_EMPTY, ERR_ROOT_REQUIRED, ERR_SNAPSHOT_CONFLICT, ERR_UNAUTHORIZED,
};
use crate::models::SnapshotGroup;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Snapshot database error: {0}")]
    Snapshot(#[from] redb::Error),

    #[error("Snapshot open error: {0}")]
    SnapshotOpen(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Scope not found: {0}")]
    ScopeNotFound(String),

    #[error("Category is not empty")]
    CategoryNotEmpty,

    #[error("Snapshot version conflict (current version {current_version})")]
    Conflict {
        current_version: i64,
        pending: Vec<SnapshotGroup>,
    },

    #[error("Invalid credentials")]
    Unauthorized { attempts: u32 },

    #[error("Root privilege required")]
    Forbidden,

    #[error("Too many failed attempts")]
    Throttled { retry_after_ms: i64 },

    #[error("Subsystem unavailable: {0}")]
    SubsystemUnavailable(String),

    #[error("Not supported by this store: {0}")]
    Unsupported(&'static str),
}

impl AppError {
    /// Whether this error came from the storage layer rather than the caller
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            AppError::Database(_)
                | AppError::Migration(_)
                | AppError::Snapshot(_)
                | AppError::SnapshotOpen(_)
                | AppError::Transaction(_)
                | AppError::Table(_)
                | AppError::Storage(_)
                | AppError::Commit(_)
                | AppError::Serialization(_)
                | AppError::TaskJoin(_)
        )
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_storage_failure() {
            tracing::error!("{}", self);
            let body = Json(json!({ "error": "Internal server error", "success": false }));
            return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        }

        let (status, body) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFound(what) | AppError::ScopeNotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("Not found: {}", what) }),
            ),
            AppError::CategoryNotEmpty => {
                (StatusCode::CONFLICT, json!({ "error": ERR_CATEGORY_NOT_EMPTY }))
            }
            AppError::Conflict {
                current_version,
                pending,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "error": ERR_SNAPSHOT_CONFLICT,
                    "current_version": current_version,
                    "pending": pending,
                }),
            ),
            AppError::Unauthorized { attempts } => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": ERR_UNAUTHORIZED, "attempts": attempts }),
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": ERR_ROOT_REQUIRED })),
            AppError::Throttled { retry_after_ms } => {
                let body = Json(json!({
                    "error": "Too many failed attempts - try again later",
                    "retry_after_ms": retry_after_ms,
                    "success": false,
                }));
                let retry_after_secs = (retry_after_ms.max(0) + 999) / 1000;
                let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
                if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                return response;
            }
            AppError::SubsystemUnavailable(what) => {
                tracing::error!("Subsystem unavailable: {}", what);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "error": "Service temporarily unavailable" }),
                )
            }
            AppError::Unsupported(what) => (
                StatusCode::NOT_IMPLEMENTED,
                json!({ "error": format!("Not supported by the configured store: {}", what) }),
            ),
            other => {
                tracing::error!("Unhandled error: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        let mut body = body;
        body["success"] = json!(false);
        (status, Json(body)).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttled_sets_retry_after_header() {
        let response = AppError::Throttled {
            retry_after_ms: 1_500,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::CategoryNotEmpty.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Unauthorized { attempts: 1 }.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Unsupported("tokens").into_response().status(),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            AppError::ScopeNotFound("category 9".into())
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
    }
}
