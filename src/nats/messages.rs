use anyhow::{Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::gateway::{
    EventKind, FragmentPayload, InboundEvent, OfferedAction, OutboundInstruction, Replies, UserId,
};

/// Inbound message from the chat platform bridge
#[derive(Debug, Serialize, Deserialize)]
pub struct InboundMessage {
    pub user_id: UserId,
    pub message_id: i64,
    #[serde(flatten)]
    pub content: InboundContent,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundContent {
    /// Chat text (command or button press)
    Text { text: String },
    /// Voice note
    Voice {
        audio: String, // Base64-encoded bytes
    },
    /// Audio file attachment
    Audio {
        audio: String, // Base64-encoded bytes
        file_name: Option<String>,
    },
}

impl InboundMessage {
    /// Convert into a session event; `None` for text that is not an action
    pub fn into_event(self, replies: &Replies) -> Result<Option<InboundEvent>> {
        let kind = match self.content {
            InboundContent::Text { text } => EventKind::from_text(&text, replies),
            InboundContent::Voice { audio } => Some(EventKind::AudioFragment(
                FragmentPayload::voice(self.message_id, decode_audio(&audio)?),
            )),
            InboundContent::Audio { audio, file_name } => Some(EventKind::AudioFragment(
                FragmentPayload::audio(file_name, self.message_id, decode_audio(&audio)?),
            )),
        };

        Ok(kind.map(|kind| InboundEvent::new(self.user_id, kind)))
    }
}

fn decode_audio(encoded: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .context("Audio payload is not valid base64")
}

/// Outbound instruction published back to the bridge
#[derive(Debug, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub user_id: UserId,
    pub reply_text: String,
    /// Base64-encoded WAV, when delivering the combined recording
    pub audio: Option<String>,
    pub actions: Vec<OfferedAction>,
    /// Button labels in the same order as `actions`
    pub buttons: Vec<String>,
    pub timestamp: String, // RFC3339 timestamp
}

impl OutboundMessage {
    pub fn new(user_id: &UserId, instruction: OutboundInstruction, replies: &Replies) -> Self {
        let actions: Vec<OfferedAction> = instruction
            .offered_actions
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        let buttons = actions
            .iter()
            .map(|action| replies.label(*action).to_string())
            .collect();

        Self {
            user_id: user_id.clone(),
            reply_text: instruction.reply_text,
            audio: instruction
                .artifact
                .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes)),
            actions,
            buttons,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
