pub mod audio;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod nats;
pub mod session;

pub use audio::{
    AudioCodec, DurationAccountant, FormatHint, FragmentMerger, PcmAudio, SymphoniaCodec,
};
pub use config::Config;
pub use error::{SessionError, SessionResult};
pub use gateway::{
    EventKind, FragmentPayload, Gateway, InboundEvent, OfferedAction, OutboundInstruction,
    Replies, UserId,
};
pub use http::{create_router, AppState};
pub use nats::NatsGateway;
pub use session::{
    build_dispatcher, Session, SessionConfig, SessionController, SessionDispatcher, SessionState,
    SessionStore,
};
