//! HTTP gateway adapter
//!
//! Request/response transport for session events:
//! - POST /users/:id/start - Start (or restart) a session
//! - POST /users/:id/fragments - Submit an audio fragment (raw body)
//! - GET /users/:id/result - Listen to the combined recording
//! - POST /users/:id/add-more - Ask how much time is left
//! - POST /users/:id/messages - Chat text routed by button label
//! - GET /users/:id/session - Query session status
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{FragmentQuery, InstructionResponse, OfferedActionView, TextMessageRequest};
pub use routes::create_router;
pub use state::AppState;
