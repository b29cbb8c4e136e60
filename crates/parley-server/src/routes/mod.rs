//! HTTP route handlers.

pub mod conversations;

use crate::state::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parley_core::ParleyError;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Full application router: JSON API under `/api`, static page everywhere else.
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/conversations", get(conversations::list))
        .route("/conversation", post(conversations::create))
        .route(
            "/conversation/{id}",
            get(conversations::messages).delete(conversations::delete),
        )
        .route("/conversation/{id}/message", post(conversations::send_message))
        .route("/health", get(health));

    let static_dir = state.config.static_dir.clone();

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(static_dir))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error returned by API handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Core(ParleyError),
    /// Path segment that cannot name a conversation.
    InvalidId(String),
}

impl From<ParleyError> for ApiError {
    fn from(e: ParleyError) -> Self {
        Self::Core(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidId(_) => StatusCode::NOT_FOUND,
            ApiError::Core(ParleyError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Core(ParleyError::ConversationNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Core(ParleyError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Core(e) if e.is_gateway() => StatusCode::BAD_GATEWAY,
            ApiError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Core(e) => write!(f, "{}", e),
            ApiError::InvalidId(raw) => write!(f, "Conversation not found: {}", raw),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(target: "parley::api", "Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
