//! Service error taxonomy shared by every workflow.

use thiserror::Error;

use crate::db::DbError;

/// Failure taxonomy. Each variant maps to one HTTP status in the surface
/// layer: 401, 403, 404, 400, 409, 500 in declaration order.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => ServiceError::NotFound(what),
            // Races past an existence pre-check land on a UNIQUE or CHECK
            // constraint; surface those as conflicts, not internal errors
            DbError::Sqlite(rusqlite::Error::SqliteFailure(err, message))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                ServiceError::Conflict(message.unwrap_or_else(|| err.to_string()))
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Internal(e.to_string())
    }
}
