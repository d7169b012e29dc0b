use std::path::PathBuf;
use std::time::Duration;

/// Total length of the combined recording, in seconds
pub const MAX_SECONDS: u32 = 60;

/// Configuration for the session pipeline
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory holding one storage scope per user
    pub storage_root: PathBuf,

    /// Cap on the combined recording length
    /// Default: 60 seconds
    pub max_seconds: u32,

    /// How long a per-user worker waits for events before retiring
    /// Default: 300 seconds
    pub idle_timeout: Duration,
}

impl SessionConfig {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            max_seconds: MAX_SECONDS,
            idle_timeout: Duration::from_secs(300),
        }
    }
}
