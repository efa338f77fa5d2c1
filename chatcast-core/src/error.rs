use thiserror::Error;

use crate::models::protocol::ErrorCode;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Stream is not live")]
    StreamNotLive,

    #[error("Failed to start chat: {0}")]
    StartFailed(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wire error code for errors that surface to subscribers.
    #[must_use]
    pub const fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::StreamNotLive => Some(ErrorCode::StreamNotLive),
            Self::NotFound(_) => Some(ErrorCode::StreamNotFound),
            _ => None,
        }
    }

    /// Rebuild an error from a shared reference so single-flight followers
    /// receive the same outcome as the leader. Variants carrying non-clonable
    /// payloads collapse to `Internal` with the rendered message.
    #[must_use]
    pub fn clone_outcome(&self) -> Self {
        match self {
            Self::UnsupportedPlatform(p) => Self::UnsupportedPlatform(p.clone()),
            Self::StreamNotLive => Self::StreamNotLive,
            Self::StartFailed(m) => Self::StartFailed(m.clone()),
            Self::Ingestion(m) => Self::Ingestion(m.clone()),
            Self::NotFound(m) => Self::NotFound(m.clone()),
            Self::InvalidInput(m) => Self::InvalidInput(m.clone()),
            other => Self::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        assert_eq!(
            Error::StreamNotLive.code(),
            Some(ErrorCode::StreamNotLive)
        );
        assert_eq!(
            Error::NotFound("x".into()).code(),
            Some(ErrorCode::StreamNotFound)
        );
        assert_eq!(Error::StartFailed("x".into()).code(), None);
    }

    #[test]
    fn test_clone_outcome_preserves_variant() {
        let cloned = Error::StreamNotLive.clone_outcome();
        assert!(matches!(cloned, Error::StreamNotLive));

        let cloned = Error::Internal("boom".into()).clone_outcome();
        assert!(matches!(cloned, Error::Internal(_)));
    }
}
