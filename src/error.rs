//! Error types for sqlshape.
//!
//! Defines the error enum returned by every projection and execution call.

use thiserror::Error;

/// Main error type for sqlshape operations.
#[derive(Error, Debug)]
pub enum ShapeError {
    /// The driver failed to run the statement (syntax errors, constraint violations, etc.)
    #[error("Execution error: {0}")]
    Execution(String),

    /// A mutation statement did not start with a recognized keyword.
    #[error("Invalid SQL: {0}")]
    InvalidSql(String),

    /// JSON encoding of an otherwise successful result failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Pool or transaction could not be opened (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration errors (invalid config file, unsupported URL scheme, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A panic was caught at an operation boundary.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShapeError {
    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates an invalid-SQL error carrying the offending statement.
    pub fn invalid_sql(statement: impl Into<String>) -> Self {
        Self::InvalidSql(statement.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Execution(_) => "Execution Error",
            Self::InvalidSql(_) => "Classification Error",
            Self::Serialization(_) => "Serialization Error",
            Self::Connection(_) => "Connection Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using ShapeError.
pub type Result<T> = std::result::Result<T, ShapeError>;
