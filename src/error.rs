//! Error handling module for mcubatch
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the application should use these types for consistency.
//!
//! Note that most failures inside a running batch are *recorded* in the
//! [`crate::report::BatchReport`] rather than returned: an expectation
//! mismatch or a failed lookup must never unwind past the batch runner.
//! The variants here cover the cases that do propagate: unusable input
//! files, malformed specs, and bridge-level failures.

use thiserror::Error;

use crate::bridge::BridgeError;

/// Main error type for mcubatch
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (batch files, project tree edits, log files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors (batch files, sidecars)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization errors (plan files, MCU capability data)
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Module description file parse errors
    #[error("MDF error: {0}")]
    Mdf(String),

    /// Malformed or missing required data in a project spec or step
    #[error("Spec error: {0}")]
    Spec(String),

    /// Plan expansion errors (bad template entry, unknown toolchain)
    #[error("Plan error: {0}")]
    Plan(String),

    /// Errors raised by the project/configuration bridge
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Validation errors (batch file checks before execution)
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for mcubatch operations
pub type Result<T> = std::result::Result<T, Error>;

// Convenient error constructors
impl Error {
    /// Create a spec error
    pub fn spec(msg: impl Into<String>) -> Self {
        Self::Spec(msg.into())
    }

    /// Create a plan error
    pub fn plan(msg: impl Into<String>) -> Self {
        Self::Plan(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an MDF error
    pub fn mdf(msg: impl Into<String>) -> Self {
        Self::Mdf(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::spec("step 3 is missing `thread`");
        assert_eq!(err.to_string(), "Spec error: step 3 is missing `thread`");

        let err = Error::validation("duplicate project name");
        assert_eq!(err.to_string(), "Validation error: duplicate project name");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
