//! ChatAdapter integration tests

use async_trait::async_trait;
use millroute::agents::{AgentDefinition, AgentRegistry};
use millroute::chat::ChatAdapter;
use millroute::data::{DataError, DataService, InMemoryLedger};
use millroute::error::AppError;
use millroute::metrics::Metrics;
use millroute::router::{DataRequest, QueryRouter};
use std::sync::Arc;

struct OfflineLedger;

#[async_trait]
impl DataService for OfflineLedger {
    async fn fetch(&self, _request: &DataRequest) -> Result<String, DataError> {
        Err(DataError::Unavailable("ledger locked".to_string()))
    }
}

fn adapter(data: Arc<dyn DataService>, registry: AgentRegistry) -> ChatAdapter {
    let router = QueryRouter::new(
        data,
        Arc::new(registry),
        Arc::new(Metrics::new().expect("metrics")),
    );
    ChatAdapter::new(Arc::new(router))
}

#[tokio::test]
async fn test_reply_never_contains_routing_line() {
    let chat = adapter(Arc::new(InMemoryLedger::new("Rs")), AgentRegistry::default());
    for message in ["show my balance", "hello", "any saving tips?"] {
        let reply = chat.chat_query(message).await.expect("chat should succeed");
        assert!(!reply.contains("[routing]"), "{message}: {reply}");
        assert!(!reply.is_empty());
    }
}

#[tokio::test]
async fn test_handoff_uses_configured_coach() {
    let registry = AgentRegistry::new(
        AgentDefinition::default_mill(),
        AgentDefinition::new("Guru", "budget whisperer"),
    );
    let chat = adapter(Arc::new(InMemoryLedger::new("Rs")), registry);

    let reply = chat
        .chat_query("I need advice")
        .await
        .expect("chat should succeed");
    assert_eq!(
        reply,
        "This is a question for Guru (budget whisperer). Handing you over \
         (explicit coaching request: handing off to Guru)."
    );
}

#[tokio::test]
async fn test_data_error_propagates_unchanged() {
    let chat = adapter(Arc::new(OfflineLedger), AgentRegistry::default());

    let err = chat
        .chat_query("spent 50 on tea")
        .await
        .expect_err("data failure should propagate");
    assert!(matches!(err, AppError::DataService { .. }));
    assert!(err.to_string().contains("ledger locked"));
}
