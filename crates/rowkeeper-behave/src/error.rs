//! Error types for behavior compilation.

use thiserror::Error;

/// Failure to read column metadata while resolving a schema-aware behavior.
///
/// Fatal for the compilation of the entity being resolved; the compiler
/// propagates it to its caller untouched.
#[derive(Debug, Error)]
#[error("failed to introspect column {table}.{column}: {source}")]
pub struct SchemaIntrospectionError {
    /// Table being inspected.
    pub table: String,
    /// Column being inspected.
    pub column: String,
    /// Underlying driver error.
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl SchemaIntrospectionError {
    /// Wraps a driver error for the given column.
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            source: source.into(),
        }
    }
}

/// Errors raised by the behavior compiler and the state machine store.
#[derive(Debug, Error)]
pub enum BehaveError {
    /// A schema-aware behavior could not inspect the entity.
    #[error(transparent)]
    SchemaIntrospection(#[from] SchemaIntrospectionError),

    /// A state machine definition breaks its own invariants.
    #[error("invalid state machine definition for '{entity}': {reason}")]
    InvalidDefinition {
        /// Entity the definition belongs to.
        entity: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON (de)serialization of state machine columns.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for behavior operations.
pub type Result<T> = std::result::Result<T, BehaveError>;
