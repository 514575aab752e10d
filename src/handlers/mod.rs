//! HTTP request handlers for millroute

use crate::chat::ChatAdapter;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::router::QueryRouter;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

pub mod chat;
pub mod health;
pub mod metrics;
pub mod query;

/// Maximum allowed message length in characters
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    router: Arc<QueryRouter>,
    chat: ChatAdapter,
    metrics: Arc<Metrics>,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(router: Arc<QueryRouter>, metrics: Arc<Metrics>, request_timeout: Duration) -> Self {
        Self {
            chat: ChatAdapter::new(router.clone()),
            router,
            metrics,
            request_timeout,
        }
    }

    pub fn router(&self) -> &QueryRouter {
        &self.router
    }

    pub fn chat(&self) -> &ChatAdapter {
        &self.chat
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Run `work` bounded by the configured request timeout
    pub async fn with_timeout<T>(&self, work: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        tokio::time::timeout(self.request_timeout, work)
            .await
            .map_err(|_elapsed| AppError::Timeout {
                seconds: self.request_timeout.as_secs(),
            })?
    }
}

/// Build the axum application with all routes and layers
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/query", post(query::handler))
        .route("/chat", post(chat::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject empty, whitespace-only or over-long messages
pub(crate) fn validate_message(message: &str) -> AppResult<()> {
    if message.trim().is_empty() {
        return Err(AppError::Validation(
            "message cannot be empty or contain only whitespace".to_string(),
        ));
    }

    // Unicode characters, not bytes
    let char_count = message.chars().count();
    if char_count > MAX_MESSAGE_LENGTH {
        return Err(AppError::Validation(format!(
            "message exceeds maximum length of {} characters (got {})",
            MAX_MESSAGE_LENGTH, char_count
        )));
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::agents::AgentRegistry;
    use crate::data::InMemoryLedger;

    pub fn test_state() -> AppState {
        let metrics = Arc::new(Metrics::new().expect("metrics"));
        let router = QueryRouter::new(
            Arc::new(InMemoryLedger::new("Rs")),
            Arc::new(AgentRegistry::default()),
            metrics.clone(),
        );
        AppState::new(Arc::new(router), metrics, Duration::from_secs(5))
    }
}
