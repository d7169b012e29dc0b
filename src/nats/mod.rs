pub mod client;
pub mod messages;

pub use client::NatsGateway;
pub use messages::{InboundContent, InboundMessage, OutboundMessage};
