use std::sync::Arc;

use anyhow::{Context, Result};
use async_nats::Client;
use futures::stream::StreamExt;
use tracing::{error, info, warn};

use super::messages::{InboundMessage, OutboundMessage};
use crate::gateway::{Gateway, OutboundInstruction, Replies, UserId};
use crate::session::SessionDispatcher;

pub struct NatsGateway {
    client: Client,
    outbound_prefix: String,
    replies: Arc<Replies>,
}

impl NatsGateway {
    /// Connect to NATS server
    pub async fn connect(
        url: &str,
        outbound_prefix: String,
        replies: Arc<Replies>,
    ) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            outbound_prefix,
            replies,
        })
    }

    /// Subject a user's replies are published on
    pub fn outbound_subject(&self, user_id: &UserId) -> String {
        format!("{}.{}", self.outbound_prefix, user_id)
    }

    /// Subscribe to inbound messages and hand them to the dispatcher until the
    /// subscription ends
    pub async fn serve(
        self: Arc<Self>,
        inbound_subject: String,
        dispatcher: Arc<SessionDispatcher>,
    ) -> Result<()> {
        info!("Subscribing to inbound messages on {}", inbound_subject);

        let mut subscriber = self
            .client
            .subscribe(inbound_subject.clone())
            .await
            .context("Failed to subscribe to inbound messages")?;

        info!("Subscribed to {}", inbound_subject);

        let gateway: Arc<dyn Gateway> = self.clone();

        while let Some(msg) = subscriber.next().await {
            let message = match serde_json::from_slice::<InboundMessage>(&msg.payload) {
                Ok(message) => message,
                Err(e) => {
                    warn!("Failed to parse inbound message on {}: {}", msg.subject.to_string(), e);
                    continue;
                }
            };

            match message.into_event(&self.replies) {
                Ok(Some(event)) => dispatcher.dispatch(event, Arc::clone(&gateway)).await,
                Ok(None) => {}
                Err(e) => error!("Rejected inbound message: {:#}", e),
            }
        }

        info!("Inbound subscription on {} ended", inbound_subject);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Gateway for NatsGateway {
    async fn deliver(&self, user_id: &UserId, instruction: OutboundInstruction) -> Result<()> {
        let subject = self.outbound_subject(user_id);
        let has_audio = instruction.artifact.is_some();

        let message = OutboundMessage::new(user_id, instruction, &self.replies);
        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish reply")?;

        info!(
            "Published reply to {} (audio={}, actions={})",
            subject,
            has_audio,
            message.actions.len()
        );

        Ok(())
    }

    fn name(&self) -> &str {
        "nats"
    }
}
