use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::replies::Replies;
use super::user::UserId;
use crate::audio::FormatHint;

/// Command that starts (or restarts) a session
pub const START_COMMAND: &str = "/start";

/// One event delivered by the messaging gateway
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub user_id: UserId,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn new(user_id: UserId, kind: EventKind) -> Self {
        Self { user_id, kind }
    }
}

#[derive(Debug, Clone)]
pub enum EventKind {
    /// `/start` or "Start over"
    Start,
    AudioFragment(FragmentPayload),
    ListenRequest,
    AddMorePrompt,
}

impl EventKind {
    /// Route a chat text message by exact match against the command and button labels.
    ///
    /// Anything else is not an event.
    pub fn from_text(text: &str, replies: &Replies) -> Option<Self> {
        let text = text.trim();

        if text == START_COMMAND || text == replies.start_over_label {
            Some(Self::Start)
        } else if text == replies.listen_label {
            Some(Self::ListenRequest)
        } else if text == replies.add_more_label {
            Some(Self::AddMorePrompt)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::AudioFragment(_) => "audio_fragment",
            Self::ListenRequest => "listen_request",
            Self::AddMorePrompt => "add_more_prompt",
        }
    }
}

/// Raw fragment as received from the platform
#[derive(Clone)]
pub struct FragmentPayload {
    /// Source-assigned identifier, only used to name staged storage
    pub fragment_id: String,
    pub bytes: Vec<u8>,
    pub format_hint: FormatHint,
}

impl FragmentPayload {
    pub fn new(fragment_id: impl Into<String>, bytes: Vec<u8>, format_hint: FormatHint) -> Self {
        Self {
            fragment_id: fragment_id.into(),
            bytes,
            format_hint,
        }
    }

    /// Voice note: always the default container, named after the message
    pub fn voice(message_id: impl std::fmt::Display, bytes: Vec<u8>) -> Self {
        Self::new(
            format!("voice_{}.ogg", message_id),
            bytes,
            FormatHint::voice(),
        )
    }

    /// Audio attachment: container taken from the file name when there is one
    pub fn audio(
        file_name: Option<String>,
        message_id: impl std::fmt::Display,
        bytes: Vec<u8>,
    ) -> Self {
        let format_hint = FormatHint::from_file_name(file_name.as_deref());
        let fragment_id = file_name.unwrap_or_else(|| format!("audio_{}", message_id));
        Self::new(fragment_id, bytes, format_hint)
    }
}

impl std::fmt::Debug for FragmentPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentPayload")
            .field("fragment_id", &self.fragment_id)
            .field("bytes", &self.bytes.len())
            .field("format_hint", &self.format_hint)
            .finish()
    }
}

/// Next actions the gateway should offer (rendered as buttons)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferedAction {
    AddMore,
    Listen,
    StartOver,
}

/// Exactly one of these is produced per inbound event
#[derive(Clone, PartialEq, Eq)]
pub struct OutboundInstruction {
    pub reply_text: String,
    pub artifact: Option<Vec<u8>>,
    pub offered_actions: Option<BTreeSet<OfferedAction>>,
}

impl OutboundInstruction {
    pub fn text(reply_text: impl Into<String>) -> Self {
        Self {
            reply_text: reply_text.into(),
            artifact: None,
            offered_actions: None,
        }
    }

    pub fn with_actions(mut self, actions: impl IntoIterator<Item = OfferedAction>) -> Self {
        self.offered_actions = Some(actions.into_iter().collect());
        self
    }

    pub fn with_artifact(mut self, bytes: Vec<u8>) -> Self {
        self.artifact = Some(bytes);
        self
    }

    pub fn offers(&self, action: OfferedAction) -> bool {
        self.offered_actions
            .as_ref()
            .map_or(false, |actions| actions.contains(&action))
    }
}

impl std::fmt::Debug for OutboundInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundInstruction")
            .field("reply_text", &self.reply_text)
            .field("artifact", &self.artifact.as_ref().map(Vec::len))
            .field("offered_actions", &self.offered_actions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_routing() {
        let replies = Replies::default();

        assert!(matches!(EventKind::from_text("/start", &replies), Some(EventKind::Start)));
        assert!(matches!(
            EventKind::from_text("Start over", &replies),
            Some(EventKind::Start)
        ));
        assert!(matches!(
            EventKind::from_text("Listen to result", &replies),
            Some(EventKind::ListenRequest)
        ));
        assert!(matches!(
            EventKind::from_text("Add another fragment", &replies),
            Some(EventKind::AddMorePrompt)
        ));
        assert!(EventKind::from_text("hello", &replies).is_none());
    }

    #[test]
    fn test_voice_payload_naming() {
        let payload = FragmentPayload::voice(77, vec![1, 2, 3]);

        assert_eq!(payload.fragment_id, "voice_77.ogg");
        assert_eq!(payload.format_hint.as_extension(), Some("ogg"));
    }

    #[test]
    fn test_audio_payload_hint_from_file_name() {
        let named = FragmentPayload::audio(Some("intro.MP3".to_string()), 5, vec![]);
        assert_eq!(named.format_hint.as_extension(), Some("mp3"));
        assert_eq!(named.fragment_id, "intro.MP3");

        let bare = FragmentPayload::audio(Some("intro".to_string()), 5, vec![]);
        assert_eq!(bare.format_hint.as_extension(), Some("ogg"));

        let unnamed = FragmentPayload::audio(None, 5, vec![]);
        assert_eq!(unnamed.fragment_id, "audio_5");
    }
}
