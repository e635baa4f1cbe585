//! Core Error Types
//!
//! Errors raised by the core crate itself. The only fallible core operation
//! is JSON encoding of the stream vocabulary.
//!
//! The application crate wraps provider, validation and I/O failures in its
//! own `AppError`.

use thiserror::Error;

/// Core error type for the Clausewise workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;
