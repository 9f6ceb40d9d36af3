//! Error types for dashguard.

use thiserror::Error;

/// Common error type for infrastructure failures.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant unless they carry
    /// a more specific meaning (see [`AppError::from_insert`]).
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record with this username already exists.
    #[error("username '{0}' already exists")]
    DuplicateUsername(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Translate an insert failure, turning a unique-constraint violation on
    /// `users.username` into [`AppError::DuplicateUsername`].
    pub fn from_insert(e: sqlx::Error, username: &str) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::DuplicateUsername(username.to_string());
            }
        }
        AppError::Database(e.to_string())
    }

    /// Returns true if the error means the persistence collaborator could not
    /// serve the request.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::DatabaseConnection(_) | AppError::Io(_)
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                AppError::DatabaseConnection(e.to_string())
            }
            other => AppError::Database(other.to_string()),
        }
    }
}

/// Result type alias for dashguard operations.
pub type Result<T> = std::result::Result<T, AppError>;
