//! Common error types for EdSync

use thiserror::Error;

/// Common result type for EdSync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the EdSync binaries
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload decode error (wraps serde_json::Error)
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required field is absent on an inbound record
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Validation error naming the missing field
    pub fn missing(field: &str) -> Self {
        Error::Validation(format!("{} is required", field))
    }
}

/// Unwrap an optional inbound field, rejecting the record when absent
pub fn require<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| Error::missing(field))
}

/// Unwrap an optional inbound string, rejecting empty values as well
pub fn require_str(value: Option<&str>, field: &str) -> Result<String> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(Error::missing(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_present() {
        assert_eq!(require(Some(5), "x").unwrap(), 5);
    }

    #[test]
    fn test_require_missing_names_field() {
        let err = require::<i32>(None, "solutionId").unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: solutionId is required");
    }

    #[test]
    fn test_require_str_rejects_empty() {
        assert!(require_str(Some("  "), "taskId").is_err());
        assert_eq!(require_str(Some("t-1"), "taskId").unwrap(), "t-1");
    }
}
