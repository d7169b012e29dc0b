use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::state::Session;
use super::storage::ArtifactStorage;
use crate::error::{SessionError, SessionResult};
use crate::gateway::UserId;

/// Sessions by user, plus the storage their artifacts live in
///
/// Reads are public; writes are reserved for the session controller.
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, Session>>,
    storage: ArtifactStorage,
    max_seconds: u32,
}

impl SessionStore {
    pub fn new(storage: ArtifactStorage, max_seconds: u32) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            storage,
            max_seconds,
        }
    }

    pub fn storage(&self) -> &ArtifactStorage {
        &self.storage
    }

    pub fn max_seconds(&self) -> u32 {
        self.max_seconds
    }

    /// Existing session, without creating one
    pub async fn get(&self, user_id: &UserId) -> Option<Session> {
        self.sessions.read().await.get(user_id).cloned()
    }

    /// Existing session or a fresh zeroed one
    pub async fn get_or_create(&self, user_id: &UserId) -> Session {
        if let Some(session) = self.get(user_id).await {
            return session;
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user_id.clone())
            .or_insert_with(|| {
                info!(user_id = %user_id, "Session created");
                Session::new(user_id.clone(), self.max_seconds)
            })
            .clone()
    }

    /// Seconds left before the cap; the full budget when there is no session
    pub async fn remaining_budget(&self, user_id: &UserId) -> u32 {
        self.get(user_id)
            .await
            .map_or(self.max_seconds, |s| s.remaining_seconds())
    }

    /// Read the combined recording, if the session has one
    pub async fn load_artifact(&self, user_id: &UserId) -> SessionResult<Option<Vec<u8>>> {
        let path = match self.get(user_id).await.and_then(|s| s.combined_artifact) {
            Some(path) => path,
            None => return Ok(None),
        };

        match self.storage.read_combined(&path).await? {
            Some(bytes) => Ok(Some(bytes)),
            None => {
                self.forget_lost_artifact(user_id, &path).await;
                Ok(None)
            }
        }
    }

    /// The recording vanished from disk: start the session over instead of
    /// pointing at a missing file forever.
    async fn forget_lost_artifact(&self, user_id: &UserId, path: &Path) {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(user_id) else {
            return;
        };
        if session.combined_artifact.as_deref() != Some(path) {
            return;
        }

        warn!(
            user_id = %user_id,
            lost_seconds = session.accumulated_seconds,
            "Combined recording missing from storage, session restarted"
        );
        *session = Session::new(user_id.clone(), self.max_seconds);
    }

    /// Drop the artifact and zero the session. No-op for unknown users.
    ///
    /// The record is zeroed before storage is touched, so a purge that fails halfway
    /// still leaves a usable empty session.
    pub(crate) async fn reset(&self, user_id: &UserId) -> SessionResult<Session> {
        let fresh = Session::new(user_id.clone(), self.max_seconds);
        let previous = self
            .sessions
            .write()
            .await
            .insert(user_id.clone(), fresh.clone());

        info!(
            user_id = %user_id,
            previous_seconds = previous.map_or(0, |s| s.accumulated_seconds),
            "Session reset"
        );

        self.storage.purge(user_id).await?;

        Ok(fresh)
    }

    /// Replace the stored artifact and add to the accumulated time.
    ///
    /// The session is untouched unless the new artifact is durable.
    pub(crate) async fn commit(
        &self,
        user_id: &UserId,
        artifact: &[u8],
        added_seconds: u32,
    ) -> SessionResult<Session> {
        let current = self.get_or_create(user_id).await;
        let remaining = current.remaining_seconds();
        if added_seconds > remaining {
            return Err(SessionError::Validation {
                duration: added_seconds,
                remaining,
            });
        }

        let path = self.storage.write_combined(user_id, artifact).await?;

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(user_id.clone())
            .or_insert_with(|| Session::new(user_id.clone(), self.max_seconds));

        session.accumulated_seconds += added_seconds;
        session.combined_artifact = Some(path);
        session.fragment_count += 1;
        session.updated_at = Utc::now();

        info!(
            user_id = %user_id,
            added_seconds,
            accumulated_seconds = session.accumulated_seconds,
            fragments = session.fragment_count,
            "Fragment committed"
        );

        Ok(session.clone())
    }
}
