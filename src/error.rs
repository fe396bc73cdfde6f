//! Error types for the trieval library.
//!
//! All fallible operations in this crate return [`Result`], whose error type
//! is the [`TrievalError`] enum.
//!
//! # Examples
//!
//! ```
//! use trieval::error::{TrievalError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TrievalError::invalid_range("lower bound type does not match field type"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for trieval operations.
///
/// Note that an empty range (lower bound above upper bound after inclusivity
/// adjustment) is not an error anywhere in this crate; it is an empty result.
#[derive(Error, Debug)]
pub enum TrievalError {
    /// I/O errors (dictionary persistence, term source reads)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid range construction (bad precision step, bound type mismatch)
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Encoding errors (prefix-coded term production)
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Decoding errors (corrupt or malformed index bytes)
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Index-related errors (unknown fields, writer misuse)
    #[error("Index error: {0}")]
    Index(String),

    /// Query-related errors
    #[error("Query error: {0}")]
    Query(String),

    /// Resource exhausted (term expansion cap exceeded)
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Operation cancelled (enumeration deadline reached)
    #[error("Operation cancelled: {0}")]
    OperationCancelled(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with TrievalError.
pub type Result<T> = std::result::Result<T, TrievalError>;

impl TrievalError {
    /// Create a new invalid range error.
    pub fn invalid_range<S: Into<String>>(msg: S) -> Self {
        TrievalError::InvalidRange(msg.into())
    }

    /// Create a new encoding error.
    pub fn encoding<S: Into<String>>(msg: S) -> Self {
        TrievalError::Encoding(msg.into())
    }

    /// Create a new decoding error.
    pub fn decoding<S: Into<String>>(msg: S) -> Self {
        TrievalError::Decoding(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        TrievalError::Index(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        TrievalError::Query(msg.into())
    }

    /// Create a new resource exhausted error.
    pub fn resource_exhausted<S: Into<String>>(msg: S) -> Self {
        TrievalError::ResourceExhausted(msg.into())
    }

    /// Create a new cancelled error.
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        TrievalError::OperationCancelled(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TrievalError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = TrievalError::invalid_range("precision step must be at least 1");
        assert_eq!(
            error.to_string(),
            "Invalid range: precision step must be at least 1"
        );

        let error = TrievalError::encoding("shift 40 exceeds value width 32");
        assert_eq!(error.to_string(), "Encoding error: shift 40 exceeds value width 32");

        let error = TrievalError::cancelled("deadline elapsed");
        assert_eq!(error.to_string(), "Operation cancelled: deadline elapsed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::UnexpectedEof, "truncated dictionary");
        let error = TrievalError::from(io_error);

        match error {
            TrievalError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
