//! Error types for the Affinity library.
//!
//! All fallible operations return [`AffinityError`] through the crate-wide
//! [`Result`] alias.
//!
//! # Examples
//!
//! ```
//! use affinity::error::{AffinityError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(AffinityError::invalid_config("fields.user_id is required"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Affinity operations.
#[derive(Error, Debug)]
pub enum AffinityError {
    /// I/O errors (reading event logs, configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A configured field path could not be resolved against a record.
    #[error("Missing field '{field}': segment '{segment}' of path '{path}' not found")]
    MissingField {
        field: String,
        path: String,
        segment: String,
    },

    /// An item code selected for output has no reverse mapping.
    #[error("Codec integrity error: {0}")]
    CodecIntegrity(String),

    /// The command line could not be interpreted.
    #[error("{0}")]
    InvalidInvocation(String),

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Training or prediction errors raised by a model
    #[error("Model error: {0}")]
    Model(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with AffinityError.
pub type Result<T> = std::result::Result<T, AffinityError>;

impl AffinityError {
    /// Create a new missing field error.
    pub fn missing_field<F, P, S>(field: F, path: P, segment: S) -> Self
    where
        F: Into<String>,
        P: Into<String>,
        S: Into<String>,
    {
        AffinityError::MissingField {
            field: field.into(),
            path: path.into(),
            segment: segment.into(),
        }
    }

    /// Create a new codec integrity error.
    pub fn codec_integrity<S: Into<String>>(msg: S) -> Self {
        AffinityError::CodecIntegrity(msg.into())
    }

    /// Create a new invalid invocation error.
    pub fn invalid_invocation<S: Into<String>>(msg: S) -> Self {
        AffinityError::InvalidInvocation(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        AffinityError::InvalidConfig(msg.into())
    }

    /// Create a new model error.
    pub fn model<S: Into<String>>(msg: S) -> Self {
        AffinityError::Model(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        AffinityError::Other(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        AffinityError::Other(format!("Internal error: {}", msg.into()))
    }

    /// Short name of the failure kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            AffinityError::Io(_) => "io",
            AffinityError::MissingField { .. } => "missing-field",
            AffinityError::CodecIntegrity(_) => "codec-integrity",
            AffinityError::InvalidInvocation(_) => "invalid-invocation",
            AffinityError::InvalidConfig(_) => "invalid-config",
            AffinityError::Model(_) => "model",
            AffinityError::Json(_) => "json",
            AffinityError::Other(_) | AffinityError::Anyhow(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = AffinityError::codec_integrity("code 7 has no key");
        assert_eq!(error.to_string(), "Codec integrity error: code 7 has no key");

        let error = AffinityError::invalid_config("bad path");
        assert_eq!(error.to_string(), "Invalid configuration: bad path");

        let error = AffinityError::missing_field("app_id", "payload.app", "app");
        assert_eq!(
            error.to_string(),
            "Missing field 'app_id': segment 'app' of path 'payload.app' not found"
        );
        assert_eq!(error.kind(), "missing-field");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let affinity_error = AffinityError::from(io_error);

        match affinity_error {
            AffinityError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
