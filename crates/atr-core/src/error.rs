//! # Core Error Types
//!
//! Errors for the foundational primitives: canonicalization and timestamp
//! parsing. Registry-level preconditions each have their own error enum in
//! `atr-registry`; this crate only reports failures of the type layer
//! itself.

use thiserror::Error;

/// Top-level error type for the core primitives.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Timestamp construction or parsing failed.
    #[error("invalid timestamp: {0}")]
    Timestamp(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical content. Numeric
    /// fields must be strings or integers.
    #[error("float values are not permitted in canonical content; use string or integer: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
