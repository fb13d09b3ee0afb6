use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::chat::{ChatReply, ChatRequest};
use crate::errors::AppError;
use crate::state::AppState;

/// Longest message accepted from the widget, in characters.
const MAX_MESSAGE_CHARS: usize = 2000;

/// POST /api/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, AppError> {
    let Json(req) = payload?;
    if req.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message exceeds {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(Json(state.dialogue.respond(req).await))
}
