/// sqlentity Error Module
///
/// This module defines the error taxonomy shared by the connection layer and
/// the table accessors. Every fallible operation returns `Result<T>` so callers
/// can branch on the failure cause instead of parsing log output.
use thiserror::Error;

/// Comprehensive error type for sqlentity.
///
/// This enum covers:
/// - Session setup and raw driver failures
/// - Statement preparation, binding and execution
/// - Transaction control
/// - Input validation for the CRUD helpers
/// - Configuration loading
#[derive(Error, Debug)]
pub enum SqlEntityError {
    /// Raw errors from SQLite that have no more specific category
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The session could not be established
    #[error("Connection error: failed to open '{target}': {source}")]
    Connection {
        target: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A table or record that an operation requires is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Positional parameters do not match the statement's placeholders
    #[error("Parameter mismatch: statement expects {expected} parameter(s), got {actual}")]
    ParameterMismatch { expected: usize, actual: usize },

    /// SQL errors (syntax, execution, constraint violations, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Commit or rollback failed
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Record identifiers must name exactly one column
    #[error("Invalid identifier: expected exactly one key column, got {keys}")]
    InvalidIdentifier { keys: usize },

    /// A mutation was requested without any fields
    #[error("Empty record: {0} requires at least one field")]
    EmptyRecord(&'static str),

    /// Free-form SQL handed to an entity that does not mention its table
    #[error("Entity '{entity}' does not influence the query")]
    UnrelatedQuery { entity: String },

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON configuration parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Result to use SqlEntityError as the error type.
pub type Result<T> = std::result::Result<T, SqlEntityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let db_err = SqlEntityError::Database(rusqlite::Error::ExecuteReturnedResults);
        assert!(db_err.to_string().contains("Database error"));

        let query_err = SqlEntityError::Query("Syntax error".to_string());
        assert!(query_err.to_string().contains("Query error"));

        let mismatch = SqlEntityError::ParameterMismatch { expected: 2, actual: 1 };
        assert_eq!(
            mismatch.to_string(),
            "Parameter mismatch: statement expects 2 parameter(s), got 1"
        );

        let unrelated = SqlEntityError::UnrelatedQuery { entity: "users".to_string() };
        assert_eq!(unrelated.to_string(), "Entity 'users' does not influence the query");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SqlEntityError = io_err.into();
        match err {
            SqlEntityError::Io(_) => {}
            _ => panic!("Expected IO error"),
        }

        let json_err: std::result::Result<serde_json::Value, serde_json::Error> =
            serde_json::from_str("{ invalid json }");
        let err: SqlEntityError = json_err.unwrap_err().into();
        match err {
            SqlEntityError::Json(_) => {}
            _ => panic!("Expected JSON error"),
        }
    }

    #[test]
    fn test_connection_error_keeps_source() {
        use std::error::Error as _;

        let err = SqlEntityError::Connection {
            target: "/nowhere/db.sqlite".to_string(),
            source: rusqlite::Error::InvalidQuery,
        };
        assert!(err.to_string().contains("/nowhere/db.sqlite"));
        assert!(err.source().is_some());
    }
}
