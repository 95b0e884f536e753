//! Error types for the core library.

use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, PartitionError>;

/// Errors raised while building a partition accessor or routing a key.
///
/// None of these are retried internally; the routing caller decides whether
/// an unroutable request is rejected or sent elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    /// The key falls outside the key space covered by the partitions.
    #[error("key {key} is outside the partitioned key space")]
    OutOfRange { key: i64 },
    /// The key pattern did not match anything in the URI.
    #[error("no partition key found in `{uri}`")]
    KeyNotFound { uri: String },
    /// The captured key text is not a decimal integer.
    #[error("malformed partition key `{text}`")]
    MalformedKey { text: String },
    /// The captured key text is an integer too large for the key type.
    #[error("partition key `{text}` does not fit in a 64-bit key")]
    KeyOutOfRange { text: String },
    /// The key pattern does not compile or has no capture group.
    #[error("invalid partition key pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    /// The hash algorithm name is not on the allow-list.
    #[error("unknown hash algorithm `{0}`")]
    UnknownHashAlgorithm(String),
    /// The partition spec is internally inconsistent.
    #[error("invalid partition spec: {0}")]
    InvalidSpec(String),
}
