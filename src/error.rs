//! Error type shared by the identity store, moderation engine and
//! announcement board.

use diesel_async::pooled_connection::bb8::RunError;
use thiserror::Error;

/// Failure raised by a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The caller supplied an unusable value.
    #[error("invalid input: {0}")]
    Validation(String),
    /// The addressed row does not exist.
    #[error("{0} not found")]
    NotFound(String),
    /// The write collided with existing data.
    #[error("conflict: {0}")]
    Conflict(String),
    /// No pooled connection could be checked out.
    #[error("connection pool error: {0}")]
    Pool(#[from] RunError),
    /// The database rejected or failed the statement.
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl StoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
