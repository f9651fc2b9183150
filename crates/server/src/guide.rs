//! Chat endpoint for the shopping guide.
//!
//! The frontend sends the full ordered transcript on every turn together
//! with its session and user identifiers; the response carries the cleaned
//! assistant text plus the resolved recommendation cards.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use shopguide_core::domain::chat::ChatMessage;
use shopguide_core::domain::profile::UserId;
use shopguide_core::domain::recommendation::ResolvedRecommendation;
use shopguide_core::GuideError;
use shopguide_guide::GuideOrchestrator;
use tracing::error;

#[derive(Clone)]
pub struct GuideState {
    orchestrator: Arc<GuideOrchestrator>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnRequest {
    pub messages: Vec<ChatMessage>,
    pub session_id: String,
    /// Absent or blank for anonymous shoppers.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnResponse {
    pub message: String,
    pub recommended_products: Vec<ResolvedRecommendation>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub fn router(orchestrator: Arc<GuideOrchestrator>) -> Router {
    Router::new()
        .route("/api/v1/guide/chat", post(chat))
        .with_state(GuideState { orchestrator })
}

pub async fn chat(
    State(state): State<GuideState>,
    Json(request): Json<ChatTurnRequest>,
) -> Result<Json<ChatTurnResponse>, (StatusCode, Json<ApiError>)> {
    validate(&request)?;

    let user_id = request
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| UserId(value.to_string()));
    match state
        .orchestrator
        .send_turn(&request.messages, &request.session_id, user_id.as_ref())
        .await
    {
        Ok(turn) => Ok(Json(ChatTurnResponse {
            message: turn.display_text,
            recommended_products: turn.recommendations,
        })),
        Err(error) => {
            error!(
                event_name = "guide.turn_failed",
                session_id = %request.session_id,
                %error,
                "guide turn aborted"
            );
            let status = match &error {
                GuideError::Upstream(_) => StatusCode::BAD_GATEWAY,
                GuideError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((status, Json(ApiError { error: error.user_message().to_string() })))
        }
    }
}

fn validate(request: &ChatTurnRequest) -> Result<(), (StatusCode, Json<ApiError>)> {
    if request.messages.is_empty() {
        return Err(bad_request("messages must not be empty"));
    }
    if request.messages.iter().any(|message| message.content.trim().is_empty()) {
        return Err(bad_request("message content must not be empty"));
    }
    if request.session_id.trim().is_empty() {
        return Err(bad_request("sessionId must not be empty"));
    }
    Ok(())
}

fn bad_request(detail: &str) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError { error: detail.to_string() }))
}
