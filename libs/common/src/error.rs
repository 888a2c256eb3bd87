//! Custom error types for the common library
//!
//! This module defines the storage error type shared by every store
//! implementation, whether it talks to PostgreSQL or keeps records in memory.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A unique constraint rejected the write
    #[error("Duplicate value for {0}")]
    Conflict(&'static str),

    /// A stored value could not be mapped back into its domain type
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<SqlxError> for DatabaseError {
    fn from(error: SqlxError) -> Self {
        DatabaseError::Query(error)
    }
}

impl DatabaseError {
    /// Map a unique-violation into [`DatabaseError::Conflict`], keeping every
    /// other failure as a query error
    pub fn from_write(error: SqlxError, field: &'static str) -> Self {
        match &error {
            SqlxError::Database(db) if db.is_unique_violation() => DatabaseError::Conflict(field),
            _ => DatabaseError::Query(error),
        }
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_unique_errors_stay_query_errors() {
        let error = DatabaseError::from_write(SqlxError::RowNotFound, "email");
        assert!(matches!(error, DatabaseError::Query(SqlxError::RowNotFound)));
    }

    #[test]
    fn test_conflict_message_names_the_field() {
        let error = DatabaseError::Conflict("ticket_number");
        assert_eq!(error.to_string(), "Duplicate value for ticket_number");
    }
}
