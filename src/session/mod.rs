//! Per-user accumulation sessions
//!
//! This module provides:
//! - `Session`: accumulated seconds, the owned combined recording, fragment count
//! - `SessionStore`: sessions by user, backed by per-user artifact storage
//! - `SessionController`: the state machine that turns events into replies
//! - `SessionDispatcher`: one worker per user so a user's events never interleave

mod config;
mod controller;
mod dispatcher;
mod state;
mod storage;
mod store;

pub use config::{SessionConfig, MAX_SECONDS};
pub use controller::SessionController;
pub use dispatcher::SessionDispatcher;
pub use state::{Session, SessionState, SessionStats};
pub use storage::{ArtifactStorage, StagedFragment, COMBINED_FILE};
pub use store::SessionStore;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::audio::AudioCodec;
use crate::gateway::Replies;

/// Wire storage, store, controller and dispatcher together
pub fn build_dispatcher(
    config: &SessionConfig,
    codec: Arc<dyn AudioCodec>,
    replies: Arc<Replies>,
) -> Result<Arc<SessionDispatcher>> {
    let storage = ArtifactStorage::new(config.storage_root.clone())
        .context("Failed to prepare artifact storage")?;
    let store = Arc::new(SessionStore::new(storage, config.max_seconds));

    info!(
        "Session pipeline ready: {}s budget, codec {}, workers retire after {:?}",
        config.max_seconds,
        codec.name(),
        config.idle_timeout
    );

    let controller = Arc::new(SessionController::new(store, codec, replies));
    Ok(Arc::new(SessionDispatcher::new(
        controller,
        config.idle_timeout,
    )))
}
