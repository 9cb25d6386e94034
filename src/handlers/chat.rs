use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::conversation;
use crate::state::AppState;

fn default_client_name() -> String {
    "Guest".to_string()
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Falls back to `client_name`, which matches how walk-in clients
    /// without a persistent id are tracked.
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub booking_confirmed: bool,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let client_name = if req.client_name.trim().is_empty() {
        default_client_name()
    } else {
        req.client_name.trim().to_string()
    };
    let session_id = req
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| client_name.clone());

    tracing::info!(session = %session_id, "incoming chat message");

    let outcome =
        conversation::handle_message(&state, &req.message, &session_id, &client_name).await?;

    Ok(Json(ChatResponse {
        response: outcome.reply,
        booking_confirmed: outcome.booking_confirmed,
    }))
}
