use crate::gateway::Replies;
use crate::session::{SessionDispatcher, SessionStore};
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Per-user workers in front of the session controller
    pub dispatcher: Arc<SessionDispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Arc<SessionDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        self.dispatcher.controller().store()
    }

    pub fn replies(&self) -> &Arc<Replies> {
        self.dispatcher.controller().replies()
    }
}
