use std::sync::Arc;

use tracing::{debug, info, warn};

use super::storage::StagedFragment;
use super::store::SessionStore;
use crate::audio::{AudioCodec, DecodeError, DurationAccountant, FormatHint, FragmentMerger};
use crate::error::{SessionError, SessionResult};
use crate::gateway::{
    EventKind, FragmentPayload, InboundEvent, OfferedAction, OutboundInstruction, Replies, UserId,
};

/// Session state machine
///
/// Turns each inbound event into exactly one outbound instruction. It is the only
/// writer of session state. Callers must serialize events per user; the dispatcher
/// does this.
pub struct SessionController {
    store: Arc<SessionStore>,
    accountant: Arc<DurationAccountant>,
    merger: Arc<FragmentMerger>,
    replies: Arc<Replies>,
}

impl SessionController {
    pub fn new(
        store: Arc<SessionStore>,
        codec: Arc<dyn AudioCodec>,
        replies: Arc<Replies>,
    ) -> Self {
        Self {
            store,
            accountant: Arc::new(DurationAccountant::new(Arc::clone(&codec))),
            merger: Arc::new(FragmentMerger::new(codec)),
            replies,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn replies(&self) -> &Arc<Replies> {
        &self.replies
    }

    /// Handle one event. Never fails: errors become replies.
    pub async fn handle(&self, event: InboundEvent) -> OutboundInstruction {
        let InboundEvent { user_id, kind } = event;
        debug!(user_id = %user_id, event = kind.name(), "Handling event");

        match kind {
            EventKind::Start => self.start(&user_id).await,
            EventKind::AudioFragment(payload) => self.ingest(&user_id, payload).await,
            EventKind::ListenRequest => self.listen(&user_id).await,
            EventKind::AddMorePrompt => self.add_more(&user_id).await,
        }
    }

    async fn start(&self, user_id: &UserId) -> OutboundInstruction {
        match self.store.reset(user_id).await {
            Ok(session) => {
                OutboundInstruction::text(self.replies.record_prompt(session.remaining_seconds()))
            }
            Err(e) => self.failure_reply(user_id, "start", e),
        }
    }

    async fn ingest(&self, user_id: &UserId, payload: FragmentPayload) -> OutboundInstruction {
        self.store.get_or_create(user_id).await;

        let storage = self.store.storage();
        let staged = match storage
            .stage_fragment(user_id, &payload.fragment_id, &payload.format_hint, &payload.bytes)
            .await
        {
            Ok(staged) => staged,
            Err(e) => return self.failure_reply(user_id, "audio_fragment", e),
        };

        let outcome = self.accept_fragment(user_id, &staged, &payload.format_hint).await;

        if let Err(e) = storage.discard_staged(&staged).await {
            warn!(user_id = %user_id, "Failed to discard staged fragment: {}", e);
        }

        match outcome {
            Ok(seconds) => OutboundInstruction::text(self.replies.fragment_saved(seconds))
                .with_actions([OfferedAction::AddMore, OfferedAction::Listen]),
            Err(SessionError::Validation { duration, remaining }) => {
                info!(user_id = %user_id, duration, remaining, "Fragment rejected: over budget");
                OutboundInstruction::text(self.replies.budget_exceeded(remaining))
            }
            Err(e) => self.failure_reply(user_id, "audio_fragment", e),
        }
    }

    /// Measure the staged fragment, check the budget, merge and commit.
    /// Returns the seconds saved.
    async fn accept_fragment(
        &self,
        user_id: &UserId,
        staged: &StagedFragment,
        format_hint: &FormatHint,
    ) -> SessionResult<u32> {
        let bytes = self.store.storage().read_staged(staged).await?;
        let accountant = Arc::clone(&self.accountant);
        let format_hint = format_hint.clone();

        let fragment = tokio::task::spawn_blocking(move || accountant.inspect(&bytes, &format_hint))
            .await
            .map_err(|e| DecodeError::new(format!("Decoder task failed: {}", e)))??;

        let seconds = fragment.seconds;
        let remaining = self.store.remaining_budget(user_id).await;
        if seconds > remaining {
            return Err(SessionError::Validation {
                duration: seconds,
                remaining,
            });
        }

        let existing = self.store.load_artifact(user_id).await?;
        let merger = Arc::clone(&self.merger);
        let audio = fragment.audio;
        let merged = tokio::task::spawn_blocking(move || merger.merge(existing.as_deref(), &audio))
            .await
            .map_err(|e| SessionError::Merge(format!("Merge task failed: {}", e)))??;

        self.store.commit(user_id, &merged, seconds).await?;

        Ok(seconds)
    }

    async fn listen(&self, user_id: &UserId) -> OutboundInstruction {
        let artifact = match self.store.load_artifact(user_id).await {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) => Err(SessionError::NotFound(user_id.clone())),
            Err(e) => Err(e),
        };

        match artifact {
            Ok(bytes) => OutboundInstruction::text(self.replies.result_caption.clone())
                .with_artifact(bytes)
                .with_actions([OfferedAction::AddMore, OfferedAction::StartOver]),
            Err(SessionError::NotFound(_)) => {
                OutboundInstruction::text(self.replies.no_result.clone())
            }
            Err(e) => self.failure_reply(user_id, "listen_request", e),
        }
    }

    async fn add_more(&self, user_id: &UserId) -> OutboundInstruction {
        let remaining = self.store.remaining_budget(user_id).await;
        OutboundInstruction::text(self.replies.record_prompt(remaining))
    }

    fn failure_reply(
        &self,
        user_id: &UserId,
        event: &str,
        error: SessionError,
    ) -> OutboundInstruction {
        warn!(user_id = %user_id, event, "Event failed: {}", error);

        let text = match error {
            SessionError::Decode(_) => &self.replies.unreadable_audio,
            _ => &self.replies.generic_failure,
        };
        OutboundInstruction::text(text.clone())
    }
}
