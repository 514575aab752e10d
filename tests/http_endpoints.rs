//! HTTP surface tests using `tower::ServiceExt::oneshot`

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use millroute::agents::AgentRegistry;
use millroute::data::{DataError, DataService, InMemoryLedger};
use millroute::handlers::{self, AppState};
use millroute::metrics::Metrics;
use millroute::middleware::REQUEST_ID_HEADER;
use millroute::router::{DataRequest, QueryRouter};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for `oneshot`

struct OfflineLedger;

#[async_trait]
impl DataService for OfflineLedger {
    async fn fetch(&self, _request: &DataRequest) -> Result<String, DataError> {
        Err(DataError::Unavailable("disk on fire".to_string()))
    }
}

fn app_with(data: Arc<dyn DataService>) -> Router {
    let metrics = Arc::new(Metrics::new().expect("metrics"));
    let router = QueryRouter::new(data, Arc::new(AgentRegistry::default()), metrics.clone());
    handlers::app(AppState::new(
        Arc::new(router),
        metrics,
        Duration::from_secs(5),
    ))
}

fn app() -> Router {
    app_with(Arc::new(InMemoryLedger::new("Rs")))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

#[tokio::test]
async fn test_query_endpoint_returns_routing_result() {
    let response = app()
        .oneshot(post_json(
            "/query",
            json!({"message": "spent 500 rs on groceries"}),
        ))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let body = body_json(response).await;
    assert_eq!(body["handled"], true);
    assert_eq!(body["escalation_needed"], false);
    assert_eq!(body["routing"]["target"], "mill");
    assert_eq!(body["routing"]["data"]["type"], "log_expense");
    assert_eq!(body["routing"]["data"]["parameters"]["amount"], 500.0);
    assert!(body.get("escalation_context").is_none());
}

#[tokio::test]
async fn test_query_endpoint_coaching_handoff() {
    let response = app()
        .oneshot(post_json(
            "/query",
            json!({"message": "why am I spending so much?", "show_routing": true}),
        ))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["handled"], false);
    assert_eq!(body["escalation_needed"], true);
    assert_eq!(body["escalation_context"]["agent"], "chatur");
    assert_eq!(body["escalation_context"]["trigger"], "insight_request");
    let text = body["response"].as_str().expect("response text");
    assert!(text.ends_with("[routing] agent=chatur data=none strategy=pattern"));
}

#[tokio::test]
async fn test_chat_endpoint_returns_reply_only() {
    let response = app()
        .oneshot(post_json("/chat", json!({"message": "received 300 as refund"})))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({"response": "Logged income of Rs 300.00 (refund)."}));
}

#[tokio::test]
async fn test_blank_message_is_bad_request() {
    for uri in ["/query", "/chat"] {
        let response = app()
            .oneshot(post_json(uri, json!({"message": "   "})))
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_over_long_message_is_bad_request() {
    let message = "a".repeat(handlers::MAX_MESSAGE_LENGTH + 1);
    let response = app()
        .oneshot(post_json("/chat", json!({ "message": message })))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .expect("error text")
            .contains("maximum length")
    );
}

#[tokio::test]
async fn test_data_failure_is_bad_gateway() {
    let response = app_with(Arc::new(OfflineLedger))
        .oneshot(post_json("/chat", json!({"message": "show my balance"})))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .expect("error text")
            .contains("disk on fire")
    );
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn test_metrics_endpoint_is_prometheus_text() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert!(text.contains("millroute_data_fetch_failures_total 0"));
}

#[tokio::test]
async fn test_client_request_id_is_echoed() {
    let id = "6f1c7e4e-2f4b-4b7e-9a59-8f0f4f3f2a10";
    let mut request = post_json("/chat", json!({"message": "hello"}));
    request.headers_mut().insert(
        REQUEST_ID_HEADER,
        id.parse().expect("valid header value"),
    );

    let response = app().oneshot(request).await.expect("request should complete");
    assert_eq!(
        response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
        Some(id)
    );
}
