//! Tests for parse_tool_call and ToolCall::to_decision

use super::*;
use crate::router::Confidence;
use serde_json::json;

const ENDPOINT: &str = "http://localhost:1234/v1";

#[test]
fn test_parse_plain_json_object() {
    let response = r#"{"tool": "get_summary", "arguments": {}}"#;
    let call = LlmToolCaller::parse_tool_call(response, ENDPOINT).unwrap();
    assert_eq!(call.tool, "get_summary");
    assert_eq!(call.arguments, json!({}));
}

#[test]
fn test_parse_json_inside_code_fence() {
    let response = "```json\n{\"tool\": \"log_expense\", \"arguments\": {\"amount\": 500, \"description\": \"groceries\"}}\n```";
    let call = LlmToolCaller::parse_tool_call(response, ENDPOINT).unwrap();
    assert_eq!(call.tool, "log_expense");
    assert_eq!(call.arguments["amount"], 500);
}

#[test]
fn test_parse_accepts_name_and_args_aliases() {
    let response = r#"Sure! {"name": "get_recent_transactions", "args": {"count": 3}}"#;
    let call = LlmToolCaller::parse_tool_call(response, ENDPOINT).unwrap();
    assert_eq!(call.tool, "get_recent_transactions");
    assert_eq!(call.arguments["count"], 3);
}

#[test]
fn test_parse_missing_arguments_defaults_to_null() {
    let call = LlmToolCaller::parse_tool_call(r#"{"tool": "escalate_to_coach"}"#, ENDPOINT).unwrap();
    assert_eq!(call.arguments, Value::Null);
}

#[test]
fn test_parse_empty_response_is_error() {
    let result = LlmToolCaller::parse_tool_call("   \n", ENDPOINT);
    assert!(matches!(result, Err(ToolCallError::EmptyResponse { .. })));
}

#[test]
fn test_parse_prose_is_unparseable() {
    let result = LlmToolCaller::parse_tool_call("I think this is a summary request", ENDPOINT);
    assert!(matches!(result, Err(ToolCallError::UnparseableResponse { .. })));
}

#[test]
fn test_parse_reversed_braces_is_unparseable() {
    let result = LlmToolCaller::parse_tool_call("} nothing here {", ENDPOINT);
    assert!(matches!(result, Err(ToolCallError::UnparseableResponse { .. })));
}

#[test]
fn test_parse_object_without_tool_is_unparseable() {
    let result = LlmToolCaller::parse_tool_call(r#"{"answer": 42}"#, ENDPOINT);
    assert!(matches!(result, Err(ToolCallError::UnparseableResponse { .. })));
}

#[test]
fn test_unparseable_preview_is_truncated() {
    let response = "x".repeat(2000);
    match LlmToolCaller::parse_tool_call(&response, ENDPOINT) {
        Err(ToolCallError::UnparseableResponse {
            response: preview,
            response_length,
            ..
        }) => {
            assert_eq!(response_length, 2000);
            assert!(preview.ends_with("... [truncated]"));
            assert!(preview.len() < 600);
        }
        other => panic!("expected UnparseableResponse, got {:?}", other),
    }
}

#[test]
fn test_log_expense_decision() {
    let call = ToolCall::new(
        "log_expense",
        json!({"amount": 500, "description": " groceries "}),
    );
    let decision = call.to_decision().unwrap();
    assert_eq!(decision.target, AgentId::Mill);
    assert_eq!(decision.strategy, RoutingStrategy::ToolCall);
    assert_eq!(decision.confidence, Confidence::High);
    assert!(!decision.mixed);
    assert_eq!(
        decision.data,
        DataRequest::LogExpense {
            amount: 500.0,
            description: "groceries".to_string()
        }
    );
}

#[test]
fn test_log_income_decision() {
    let call = ToolCall::new("log_income", json!({"amount": 1200.5, "description": "refund"}));
    assert_eq!(
        call.to_decision().unwrap().data,
        DataRequest::LogIncome {
            amount: 1200.5,
            description: "refund".to_string()
        }
    );
}

#[test]
fn test_summary_ignores_arguments() {
    let call = ToolCall::new("get_summary", json!({"unexpected": true}));
    assert_eq!(call.to_decision().unwrap().data, DataRequest::Summary);
}

#[test]
fn test_recent_transactions_decision() {
    let call = ToolCall::new("get_recent_transactions", json!({"count": 7}));
    assert_eq!(
        call.to_decision().unwrap().data,
        DataRequest::RecentTransactions { count: 7 }
    );
}

#[test]
fn test_coaching_tools_route_to_chatur() {
    for tool in ["escalate_to_coach", "request_insights"] {
        let decision = ToolCall::new(tool, Value::Null).to_decision().unwrap();
        assert_eq!(decision.target, AgentId::Chatur);
        assert_eq!(decision.data, DataRequest::None);
        assert!(decision.is_coaching_handoff());
    }
}

#[test]
fn test_unknown_tool_is_rejected() {
    let result = ToolCall::new("delete_everything", json!({})).to_decision();
    assert!(matches!(result, Err(ToolCallError::UnknownTool { ref tool }) if tool == "delete_everything"));
}

#[test]
fn test_string_amount_is_rejected() {
    let call = ToolCall::new("log_expense", json!({"amount": "500", "description": "food"}));
    assert!(matches!(
        call.to_decision(),
        Err(ToolCallError::InvalidArguments { .. })
    ));
}

#[test]
fn test_negative_amount_is_rejected() {
    let call = ToolCall::new("log_expense", json!({"amount": -5, "description": "food"}));
    assert!(matches!(
        call.to_decision(),
        Err(ToolCallError::InvalidArguments { .. })
    ));
}

#[test]
fn test_missing_or_blank_description_is_rejected() {
    let missing = ToolCall::new("log_income", json!({"amount": 5}));
    assert!(missing.to_decision().is_err());

    let blank = ToolCall::new("log_income", json!({"amount": 5, "description": "   "}));
    assert!(blank.to_decision().is_err());

    let number = ToolCall::new("log_income", json!({"amount": 5, "description": 12}));
    assert!(number.to_decision().is_err());
}

#[test]
fn test_bad_counts_are_rejected() {
    for args in [
        json!({}),
        json!({"count": 0}),
        json!({"count": -3}),
        json!({"count": 2.5}),
        json!({"count": "5"}),
        json!({"count": 5_000_000_000u64}),
    ] {
        let call = ToolCall::new("get_recent_transactions", args.clone());
        assert!(
            matches!(call.to_decision(), Err(ToolCallError::InvalidArguments { .. })),
            "count arguments {} should be rejected",
            args
        );
    }
}
