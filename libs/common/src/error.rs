//! Custom error types for the common library
//!
//! This module defines the error types shared by the database and row-store
//! layers.

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

    /// Error occurred while creating the schema
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors surfaced by a [`crate::store::RowStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying database failed
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// A stored document could not be encoded or decoded
    #[error("Row serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The row handed to the store is not usable
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// No row with the given id exists in the table
    #[error("Row {id} not found in {table}")]
    NotFound { table: String, id: String },

    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<SqlxError> for StoreError {
    fn from(e: SqlxError) -> Self {
        StoreError::Database(DatabaseError::Query(e))
    }
}

/// Type alias for row-store results
pub type StoreResult<T> = Result<T, StoreError>;
