//! Registry error types.

use thiserror::Error;

use crate::session::SessionId;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors at the coordination-service boundary.
///
/// Every one of these is fatal to the operation in flight; the caller retries.
/// Previously published records are never affected because each publish is a
/// single whole-record write.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The coordination service could not be reached.
    #[error("registry unavailable: {0}")]
    Unavailable(String),
    /// The session ended while the operation was in flight.
    #[error("session {0} expired")]
    SessionExpired(SessionId),
    /// The session was never opened, or was already closed.
    #[error("unknown session {0}")]
    UnknownSession(SessionId),
    /// An announcement carried unusable data.
    #[error("invalid announcement for `{uri}`: {reason}")]
    InvalidAnnouncement { uri: String, reason: String },
    /// A record failed to encode or decode.
    #[error("record codec error: {0}")]
    Codec(#[from] serde_json::Error),
    /// Reading or writing a snapshot failed.
    #[error("snapshot i/o error: {0}")]
    Io(#[from] std::io::Error),
}
