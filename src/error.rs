//! Error types for the pgo-diagnostics library
//!
//! This module provides the main error and result types used throughout the library.
//! All errors use the `thiserror` crate for automatic trait implementations.

use crate::io::GraphIoError;
use std::io::Error;
use thiserror::Error;

/// Main result type used throughout the pgo-diagnostics library
pub type DiagnosticsResult<T> = Result<T, DiagnosticsError>;

/// Main error type for the pgo-diagnostics library
#[derive(Debug, Clone, Error)]
pub enum DiagnosticsError {
    /// The residual evaluator could not produce a value (missing variable, non-finite result)
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Writing a graph exchange file or table failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Directory creation or file open failed
    #[error("Filesystem error: {0}")]
    Filesystem(String),

    /// Invalid input parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<Error> for DiagnosticsError {
    fn from(err: Error) -> Self {
        DiagnosticsError::Filesystem(err.to_string())
    }
}

impl From<csv::Error> for DiagnosticsError {
    fn from(err: csv::Error) -> Self {
        DiagnosticsError::Serialization(err.to_string())
    }
}

impl From<GraphIoError> for DiagnosticsError {
    fn from(err: GraphIoError) -> Self {
        match err {
            GraphIoError::Io(e) => DiagnosticsError::Filesystem(e.to_string()),
            other => DiagnosticsError::Serialization(other.to_string()),
        }
    }
}
