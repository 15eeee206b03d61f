//! Error types for IBI operations

use crate::Algorithm;
use thiserror::Error;

/// Result type alias for IBI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during key handling and protocol execution
#[derive(Debug, Error)]
pub enum Error {
    /// Serialized input shorter than the algorithm's fixed layout
    #[error("Buffer too small: expected {expected} bytes, got {actual}")]
    Buffer { expected: usize, actual: usize },

    /// A point or scalar failed to decode
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Key, signature and credential algorithm ids disagree
    #[error("Algorithm mismatch: expected {expected:?}, got {actual:?}")]
    AlgorithmMismatch {
        expected: Algorithm,
        actual: Algorithm,
    },

    /// Wire data carries an unregistered algorithm id
    #[error("Unknown algorithm id: {0:#04x}")]
    UnknownAlgorithm(u8),

    /// Signature check or protocol decision rejected
    #[error("Verification failed")]
    Verification,

    /// Malformed identity or hierarchy name
    #[error("Invalid identity: {0}")]
    Identity(String),

    /// Operation not defined for this algorithm
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}
