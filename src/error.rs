//! Error types for StrataKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StrataError
pub type Result<T> = std::result::Result<T, StrataError>;

/// Unified error type for StrataKV operations
#[derive(Debug, Error)]
pub enum StrataError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt run file: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Parameter Validation Errors
    // -------------------------------------------------------------------------
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
