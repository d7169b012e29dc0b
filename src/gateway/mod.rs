//! Messaging gateway boundary
//!
//! Inbound events and outbound instructions, plus the `Gateway` trait that concrete
//! transports (HTTP, NATS) implement to receive replies.

mod events;
mod replies;
mod user;

pub use events::{
    EventKind, FragmentPayload, InboundEvent, OfferedAction, OutboundInstruction, START_COMMAND,
};
pub use replies::Replies;
pub use user::{InvalidUserId, UserId};

use anyhow::Result;

/// Outbound side of a messaging transport
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    /// Deliver one instruction to the user
    async fn deliver(&self, user_id: &UserId, instruction: OutboundInstruction) -> Result<()>;

    /// Get gateway name for logging
    fn name(&self) -> &str;
}
