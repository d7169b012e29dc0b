use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::UserId;

/// Where a session stands relative to its budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing recorded
    Empty,
    /// Some budget used, some left
    Partial,
    /// Budget exhausted
    Full,
}

impl SessionState {
    pub fn of(accumulated_seconds: u32, max_seconds: u32) -> Self {
        if accumulated_seconds == 0 {
            Self::Empty
        } else if accumulated_seconds >= max_seconds {
            Self::Full
        } else {
            Self::Partial
        }
    }
}

/// Per-user accumulation state
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user_id: UserId,

    /// Sum of accepted fragment durations, never above `max_seconds`
    pub accumulated_seconds: u32,

    pub max_seconds: u32,

    /// Location of the combined recording, owned by this session
    pub combined_artifact: Option<PathBuf>,

    /// Fragments accepted since the last reset
    pub fragment_count: u32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(user_id: UserId, max_seconds: u32) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            accumulated_seconds: 0,
            max_seconds,
            combined_artifact: None,
            fragment_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState::of(self.accumulated_seconds, self.max_seconds)
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.max_seconds.saturating_sub(self.accumulated_seconds)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            user_id: self.user_id.clone(),
            state: self.state(),
            accumulated_seconds: self.accumulated_seconds,
            remaining_seconds: self.remaining_seconds(),
            fragment_count: self.fragment_count,
            has_result: self.combined_artifact.is_some(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Read-only snapshot of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub user_id: UserId,
    pub state: SessionState,
    pub accumulated_seconds: u32,
    pub remaining_seconds: u32,
    pub fragment_count: u32,
    /// Whether a combined recording can be listened to
    pub has_result: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
