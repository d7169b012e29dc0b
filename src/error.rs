//! Session error taxonomy
//!
//! `Validation` and `NotFound` are expected user-facing outcomes. `Decode`, `Merge`
//! and `Storage` are failures recovered at the event boundary. None of them ever
//! escapes a single event.

use thiserror::Error;

use crate::audio::DecodeError;
use crate::gateway::UserId;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Fragment is longer than the remaining budget
    #[error("fragment of {duration}s exceeds remaining budget of {remaining}s")]
    Validation { duration: u32, remaining: u32 },

    /// Fragment bytes unreadable or in an unsupported format
    #[error("failed to decode audio: {0}")]
    Decode(#[from] DecodeError),

    /// Combining the recording with a fragment failed
    #[error("failed to merge audio: {0}")]
    Merge(String),

    /// Reading or writing persisted state failed
    #[error("storage error while {action}: {source}")]
    Storage {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Listen requested before anything was recorded
    #[error("no combined recording for user {0}")]
    NotFound(UserId),
}

impl SessionError {
    pub fn storage(action: &'static str, source: std::io::Error) -> Self {
        Self::Storage { action, source }
    }

    /// Whether this is an ordinary outcome rather than a fault
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound(_))
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
