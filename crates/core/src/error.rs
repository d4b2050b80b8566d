//! Core error types

use thiserror::Error;

/// Core error type for VeilForum
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed hex input for a fixed-width value
    #[error("Invalid hex value: {0}")]
    InvalidHex(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
