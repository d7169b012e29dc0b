use super::state::AppState;
use crate::audio::FormatHint;
use crate::gateway::{
    EventKind, FragmentPayload, InboundEvent, OfferedAction, OutboundInstruction, Replies, UserId,
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct FragmentQuery {
    /// Explicit container extension (e.g. "ogg", "mp3")
    pub format: Option<String>,

    /// Original file name of an audio attachment
    pub file_name: Option<String>,

    /// Source-assigned identifier used to name staged storage
    pub fragment_id: Option<String>,
}

impl FragmentQuery {
    fn into_payload(self, bytes: Vec<u8>) -> FragmentPayload {
        let format_hint = match (&self.format, &self.file_name) {
            (Some(format), _) => FormatHint::extension(format),
            (None, Some(name)) => FormatHint::from_file_name(Some(name.as_str())),
            (None, None) => FormatHint::infer(),
        };

        let fragment_id = self
            .fragment_id
            .or(self.file_name)
            .unwrap_or_else(|| format!("upload_{}", uuid::Uuid::new_v4()));

        FragmentPayload::new(fragment_id, bytes, format_hint)
    }
}

#[derive(Debug, Deserialize)]
pub struct TextMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct OfferedActionView {
    pub action: OfferedAction,
    pub label: String,
}

/// Outbound instruction as JSON; the artifact is base64-encoded WAV
#[derive(Debug, Serialize, Deserialize)]
pub struct InstructionResponse {
    pub reply_text: String,
    pub artifact: Option<String>,
    pub offered_actions: Option<Vec<OfferedActionView>>,
}

impl InstructionResponse {
    pub fn from_instruction(instruction: OutboundInstruction, replies: &Replies) -> Self {
        Self {
            reply_text: instruction.reply_text,
            artifact: instruction
                .artifact
                .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes)),
            offered_actions: instruction.offered_actions.map(|actions| {
                actions
                    .into_iter()
                    .map(|action| OfferedActionView {
                        action,
                        label: replies.label(action).to_string(),
                    })
                    .collect()
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn parse_user(raw: String) -> Result<UserId, Response> {
    UserId::parse(raw).map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))
}

/// Run one event through the user's worker and render the instruction
async fn run_event(state: &AppState, user_id: UserId, kind: EventKind) -> Response {
    let event = InboundEvent::new(user_id.clone(), kind);

    match state.dispatcher.submit(event).await {
        Ok(instruction) => (
            StatusCode::OK,
            Json(InstructionResponse::from_instruction(
                instruction,
                state.replies(),
            )),
        )
            .into_response(),
        Err(e) => {
            error!(user_id = %user_id, "Event dispatch failed: {:#}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to handle event: {}", e),
            )
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /users/:user_id/start
/// Reset the session and prompt for a recording
pub async fn start(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let user_id = match parse_user(user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    info!("Start requested for user: {}", user_id);
    run_event(&state, user_id, EventKind::Start).await
}

/// POST /users/:user_id/fragments
/// Submit one audio fragment as the raw request body
pub async fn submit_fragment(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<FragmentQuery>,
    body: Bytes,
) -> Response {
    let user_id = match parse_user(user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Fragment body is empty");
    }

    info!("Fragment received for user {}: {} bytes", user_id, body.len());

    let payload = query.into_payload(body.to_vec());
    run_event(&state, user_id, EventKind::AudioFragment(payload)).await
}

/// GET /users/:user_id/result
/// Listen to the combined recording
pub async fn listen(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let user_id = match parse_user(user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    run_event(&state, user_id, EventKind::ListenRequest).await
}

/// POST /users/:user_id/add-more
/// Prompt with the remaining budget
pub async fn add_more(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let user_id = match parse_user(user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    run_event(&state, user_id, EventKind::AddMorePrompt).await
}

/// POST /users/:user_id/messages
/// Chat text; only the start command and button labels are events
pub async fn text_message(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<TextMessageRequest>,
) -> Response {
    let user_id = match parse_user(user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match EventKind::from_text(&req.text, state.replies()) {
        Some(kind) => run_event(&state, user_id, kind).await,
        None => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Message {:?} does not match any action", req.text),
        ),
    }
}

/// GET /users/:user_id/session
/// Get status of a session
pub async fn session_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id = match parse_user(user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.store().get(&user_id).await {
        Some(session) => (StatusCode::OK, Json(session.stats())).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("No session for user {}", user_id),
        ),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
