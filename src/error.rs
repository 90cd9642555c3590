//! Error types for the event store.

use crate::types::EventId;
use thiserror::Error;

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Command not recognized: '{0}'")]
    BadCommand(String),

    #[error("Error replaying missed event {event_id}: {source}")]
    Replay {
        event_id: EventId,
        #[source]
        source: SinkError,
    },

    #[error("Service unavailable, retry after {retry_after}s")]
    ServiceUnavailable { retry_after: u64 },

    #[error("Unable to add new event sink to the broadcaster")]
    RegistrationRejected,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl StoreError {
    /// Classification a transport uses to build its response.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::BadCommand(_)
            | StoreError::InvalidConfig(_)
            | StoreError::Serialization(_) => ErrorKind::ClientError,
            StoreError::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            StoreError::Replay { .. } | StoreError::RegistrationRejected => ErrorKind::InternalError,
        }
    }

    /// Retry-after hint in seconds, for rate-limited reconnects.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            StoreError::ServiceUnavailable { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Coarse error classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    ClientError,
    InternalError,
    ServiceUnavailable,
}

impl ErrorKind {
    /// HTTP status equivalent.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::ClientError => 400,
            ErrorKind::InternalError => 500,
            ErrorKind::ServiceUnavailable => 503,
        }
    }
}

/// Failure writing to a single sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink buffer is full")]
    Overflow,

    #[error("Sink receiver disconnected")]
    Disconnected,

    #[error("Sink is closed")]
    Closed,
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
