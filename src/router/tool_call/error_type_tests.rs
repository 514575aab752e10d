//! ToolCallError Tests

use super::*;
use crate::error::AppError;

fn endpoint() -> String {
    "http://test:1234/v1".to_string()
}

#[test]
fn test_model_errors_are_not_transient() {
    let errors = vec![
        ToolCallError::EmptyResponse {
            endpoint: endpoint(),
        },
        ToolCallError::UnparseableResponse {
            endpoint: endpoint(),
            response: "nope".to_string(),
            response_length: 4,
        },
        ToolCallError::SizeExceeded {
            endpoint: endpoint(),
            size: 4096,
            max_size: MAX_TOOL_RESPONSE,
        },
        ToolCallError::AgentOptionsConfigError {
            endpoint: endpoint(),
            details: "bad model".to_string(),
        },
        ToolCallError::UnknownTool {
            tool: "x".to_string(),
        },
        ToolCallError::InvalidArguments {
            tool: "log_expense".to_string(),
            reason: "missing amount".to_string(),
        },
    ];
    for error in errors {
        assert!(!error.is_transient(), "{} should not be transient", error);
    }
}

#[test]
fn test_network_errors_are_transient() {
    let stream = ToolCallError::StreamError {
        endpoint: endpoint(),
        bytes_received: 10,
        error_message: "connection reset".to_string(),
    };
    let timeout = ToolCallError::Timeout {
        endpoint: endpoint(),
        timeout_seconds: 10,
    };
    assert!(stream.is_transient());
    assert!(timeout.is_transient());
}

#[test]
fn test_cause_labels_are_distinct() {
    let labels = [
        ToolCallError::EmptyResponse {
            endpoint: endpoint(),
        }
        .cause(),
        ToolCallError::Timeout {
            endpoint: endpoint(),
            timeout_seconds: 1,
        }
        .cause(),
        ToolCallError::UnknownTool {
            tool: "x".to_string(),
        }
        .cause(),
        ToolCallError::InvalidArguments {
            tool: "x".to_string(),
            reason: "y".to_string(),
        }
        .cause(),
    ];
    let unique: std::collections::HashSet<_> = labels.iter().collect();
    assert_eq!(unique.len(), labels.len());
}

#[test]
fn test_timeout_message_names_endpoint() {
    let err = ToolCallError::Timeout {
        endpoint: endpoint(),
        timeout_seconds: 7,
    };
    let message = err.to_string();
    assert!(message.contains("http://test:1234/v1"));
    assert!(message.contains("7s"));
}

#[test]
fn test_converts_into_app_error() {
    let err: AppError = ToolCallError::UnknownTool {
        tool: "x".to_string(),
    }
    .into();
    assert!(matches!(err, AppError::ToolCall(ToolCallError::UnknownTool { .. })));
}
