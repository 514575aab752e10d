//! Error types for millroute
//!
//! All errors implement `IntoResponse` for Axum handlers.

use crate::router::AgentId;
use crate::router::tool_call::ToolCallError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    /// Primary-path failure. The router recovers from these by falling back,
    /// so they only escape when a caller invokes a tool caller directly.
    #[error(transparent)]
    ToolCall(#[from] ToolCallError),

    #[error("Data agent '{agent}' failed to answer: {reason}")]
    DataService { agent: AgentId, reason: String },

    #[error("Failed to load ledger seed '{path}': {reason}")]
    LedgerSeed { path: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::DataService { .. } | Self::ToolCall(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            Self::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::LedgerSeed { .. } => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
