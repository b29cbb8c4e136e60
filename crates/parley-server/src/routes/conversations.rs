//! Conversation routes.

use super::ApiError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, Path, State},
    http::request::Parts,
    Json,
};
use parley_types::{Conversation, Message, NewConversation, TurnOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Conversation id taken from the `{id}` path segment.
///
/// Anything that is not an `i64` cannot name a conversation and is answered
/// with a JSON 404 instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy)]
pub struct ConversationId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for ConversationId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::InvalidId(rejection.body_text()))?;

        raw.parse::<i64>()
            .map(ConversationId)
            .map_err(|_| ApiError::InvalidId(raw))
    }
}

pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    Ok(Json(state.conversations.list_conversations()?))
}

/// Messages of one conversation, oldest first. Unknown ids return an empty list.
pub async fn messages(
    State(state): State<Arc<AppState>>,
    ConversationId(id): ConversationId,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.conversations.messages(id)?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
) -> Result<Json<NewConversation>, ApiError> {
    Ok(Json(state.conversations.start_conversation().await?))
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Send one user message and wait for the assistant's reply.
///
/// A missing or unreadable body counts as an empty message.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    ConversationId(id): ConversationId,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let message = match body {
        Ok(Json(req)) => req.message.unwrap_or_default(),
        Err(rejection) => {
            debug!(target: "parley::api", "Unreadable message body: {}", rejection);
            String::new()
        }
    };

    let outcome = state.conversations.send_turn(id, &message).await?;
    Ok(Json(outcome))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
}

/// Delete a conversation. Unknown ids succeed as well.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    ConversationId(id): ConversationId,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.conversations.delete_conversation(id)?;
    Ok(Json(DeleteResponse {
        message: "Conversation deleted",
    }))
}
