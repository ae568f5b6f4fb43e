//! Error types for the migration engine.

use std::path::PathBuf;

/// Errors that can occur while running migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Database error outside statement execution.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (reading migration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The migration directory could not be walked.
    #[error("Failed to scan migration directory '{path}': {message}")]
    Scan {
        /// Directory being scanned.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The operator did not confirm a destructive statement.
    #[error("skipping file {file}, contains restricted keyword DELETE")]
    RestrictedKeyword {
        /// Migration file holding the statement.
        file: String,
    },

    /// The database rejected a migration statement.
    #[error("{0}")]
    Execution(sqlx::Error),

    /// The outcome of a statement could not be recorded.
    #[error("Failed to record ledger entry for '{file}': {source}")]
    LedgerUpsert {
        /// Migration file the entry belongs to.
        file: String,
        /// Underlying database error.
        source: sqlx::Error,
    },

    /// No ledger entry exists for a file.
    #[error("No ledger entry for migration file: {0}")]
    UnknownFile(String),

    /// Console IO failed while asking for confirmation.
    #[error("Confirmation failed: {0}")]
    Confirmation(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Trigger compilation error.
    #[error(transparent)]
    Behave(#[from] rowkeeper_behave::error::BehaveError),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
