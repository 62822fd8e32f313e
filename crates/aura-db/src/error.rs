//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Unique constraint violation (named constraint, when the driver reports one)
    #[error("duplicate record: {0}")]
    Duplicate(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        // Unique violations get their own variant so callers can retry a
        // racing insert as a lookup instead of surfacing a 500.
        if let sqlx::Error::Database(ref db) = err {
            if db.is_unique_violation() {
                return Self::Duplicate(db.constraint().unwrap_or("unique").to_string());
            }
        }
        Self::Sqlx(err)
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
