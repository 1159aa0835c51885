//! Error types for the metric key codec.

use thiserror::Error;

/// Result type alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while parsing a snapshot key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("key does not start with the metrics prefix: {0}")]
    MissingPrefix(String),

    #[error("unknown metric kind: {0}")]
    UnknownKind(String),

    #[error("malformed metric key: {0}")]
    Malformed(String),
}
