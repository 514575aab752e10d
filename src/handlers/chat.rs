//! Chat endpoint handler
//!
//! Handles POST /chat and returns only the reply text.

use crate::error::AppResult;
use crate::handlers::{AppState, validate_message};
use crate::middleware::RequestId;
use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    validate_message(&request.message)?;

    tracing::debug!(
        request_id = %request_id,
        message_length = request.message.len(),
        "Processing chat request"
    );

    let response = state
        .with_timeout(state.chat().chat_query(&request.message))
        .await?;
    Ok(Json(ChatResponse { response }))
}
