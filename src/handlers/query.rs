//! Query endpoint handler
//!
//! Handles POST /query and returns the full routing result.

use crate::error::AppResult;
use crate::handlers::{AppState, validate_message};
use crate::middleware::RequestId;
use crate::router::{QueryOptions, QueryResult};
use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryRequest {
    pub message: String,
    #[serde(default)]
    pub show_routing: bool,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<QueryRequest>,
) -> AppResult<Json<QueryResult>> {
    validate_message(&request.message)?;

    tracing::debug!(
        request_id = %request_id,
        message_length = request.message.len(),
        show_routing = request.show_routing,
        "Processing query request"
    );

    let options = QueryOptions {
        show_routing: request.show_routing,
    };
    let result = state
        .with_timeout(state.router().process_user_query(&request.message, options))
        .await
        .inspect_err(|e| {
            tracing::error!(request_id = %request_id, error = %e, "Query failed");
        })?;

    Ok(Json(result))
}
