//! Query router
//!
//! Tries the tool-calling model first (when configured), falls back to
//! pattern extraction at most once, evaluates escalation, then asks the data
//! agent for an answer when Mill is the target.
//!
//! An accepted tool call aimed at Mill still has its text checked for
//! coaching cues, so "spent 2000 on shoes, any advice?" is answered locally
//! and flagged for follow-up either way.

use super::classifier::{Classification, QueryClassifier};
use super::escalation::{EscalationContext, EscalationEvaluator, EscalationOutcome};
use super::intent::{ParsedIntent, parse_user_intent};
use super::tool_call::{LlmToolCaller, ToolCall, ToolCaller};
use super::{AgentId, QueryOptions, QueryResult, RoutingDecision, RoutingStrategy};
use crate::agents::AgentRegistry;
use crate::config::Config;
use crate::data::{DataService, InMemoryLedger};
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Routes user queries between the data agent and the coaching agent
///
/// Holds only `Arc`ed collaborators; share one instance across tasks.
pub struct QueryRouter {
    tool_caller: Option<Arc<dyn ToolCaller>>,
    classifier: QueryClassifier,
    evaluator: EscalationEvaluator,
    data: Arc<dyn DataService>,
    registry: Arc<AgentRegistry>,
    metrics: Arc<Metrics>,
}

impl QueryRouter {
    /// Create a pattern-only router
    pub fn new(
        data: Arc<dyn DataService>,
        registry: Arc<AgentRegistry>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            tool_caller: None,
            classifier: QueryClassifier::new(),
            evaluator: EscalationEvaluator::new(registry.clone()),
            data,
            registry,
            metrics,
        }
    }

    /// Use `tool_caller` as the primary classification path
    pub fn with_tool_caller(mut self, tool_caller: Arc<dyn ToolCaller>) -> Self {
        self.tool_caller = Some(tool_caller);
        self
    }

    /// Build the router and its bundled collaborators from configuration
    ///
    /// Returns an error if the ledger seed file cannot be loaded.
    pub fn from_config(config: &Config, metrics: Arc<Metrics>) -> AppResult<Self> {
        let ledger = match &config.ledger.seed_file {
            Some(path) => InMemoryLedger::from_seed_file(path, config.ledger.currency.clone())?,
            None => InMemoryLedger::new(config.ledger.currency.clone()),
        }
        .with_max_transactions(config.ledger.max_transactions);
        let registry = Arc::new(AgentRegistry::from_config(&config.agents));
        let router = Self::new(Arc::new(ledger), registry, metrics);

        match config.active_tool_caller() {
            Some(endpoint) => {
                tracing::info!(
                    endpoint_name = %endpoint.name(),
                    base_url = %endpoint.base_url(),
                    timeout_seconds = endpoint.timeout_seconds(),
                    "Hybrid routing enabled: tool calls first, pattern fallback"
                );
                Ok(router.with_tool_caller(Arc::new(LlmToolCaller::new(endpoint.clone()))))
            }
            None => {
                tracing::info!("Pattern-only routing enabled");
                Ok(router)
            }
        }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Process one user query end to end
    ///
    /// # Errors
    ///
    /// Only a data agent failure escapes, as `AppError::DataService`.
    /// Tool-caller problems are absorbed by the pattern fallback. Failed
    /// queries are not counted in `millroute_queries_total`.
    pub async fn process_user_query(
        &self,
        query: &str,
        options: QueryOptions,
    ) -> AppResult<QueryResult> {
        let start = Instant::now();

        let primary = self.primary_tool_call(query).await;
        let classification = self.classifier.classify_detailed(query, primary.as_ref());
        if let Some(e) = &classification.rejected_tool_call {
            self.record_fallback(e.cause());
        }

        let (decision, intent) = with_coaching_cue(query, classification);
        let outcome = self.evaluator.evaluate(&decision, intent.as_ref());
        let routed_in = start.elapsed();

        tracing::info!(
            target_agent = %decision.target,
            data_type = decision.data.kind(),
            strategy = decision.strategy.as_str(),
            mixed = decision.mixed,
            escalation_needed = outcome.escalation_needed,
            "Route decision made"
        );

        let (handled, mut response) = if decision.target == AgentId::Mill {
            let mut answer = self.fetch_data(&decision).await?;
            if decision.mixed {
                answer.push_str("\n\n");
                answer.push_str(&self.coach_offer());
            }
            (true, answer)
        } else {
            (false, self.handoff_message(outcome.escalation_context.as_ref()))
        };

        self.record_decision(&decision, &outcome, routed_in);

        if options.show_routing {
            response.push('\n');
            response.push_str(&routing_summary(&decision));
        }

        Ok(QueryResult {
            handled,
            response,
            routing: decision,
            escalation_needed: outcome.escalation_needed,
            escalation_context: outcome.escalation_context,
        })
    }

    /// Ask the tool caller, absorbing any failure
    async fn primary_tool_call(&self, query: &str) -> Option<ToolCall> {
        let tool_caller = self.tool_caller.as_ref()?;

        match tool_caller.call_tool(query).await {
            Ok(call) => Some(call),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    cause = e.cause(),
                    transient = e.is_transient(),
                    query_preview = %query.chars().take(100).collect::<String>(),
                    "Tool caller failed, falling back to pattern extraction"
                );
                self.record_fallback(e.cause());
                None
            }
        }
    }

    async fn fetch_data(&self, decision: &RoutingDecision) -> AppResult<String> {
        self.data.fetch(&decision.data).await.map_err(|e| {
            tracing::error!(
                error = %e,
                data_type = decision.data.kind(),
                "Data agent failed to answer"
            );
            self.metrics.record_data_fetch_failure();
            AppError::DataService {
                agent: AgentId::Mill,
                reason: e.to_string(),
            }
        })
    }

    fn coach_offer(&self) -> String {
        format!(
            "Want me to bring in {} for advice on this?",
            self.registry.label(AgentId::Chatur)
        )
    }

    fn handoff_message(&self, context: Option<&EscalationContext>) -> String {
        let coach = self.registry.label(AgentId::Chatur);
        match context {
            Some(context) => format!(
                "This is a question for {coach}. Handing you over ({}).",
                context.reason
            ),
            None => format!("This is a question for {coach}. Handing you over."),
        }
    }

    fn record_decision(
        &self,
        decision: &RoutingDecision,
        outcome: &EscalationOutcome,
        routed_in: Duration,
    ) {
        if let Err(e) = self.metrics.record_query(decision.target, decision.strategy) {
            tracing::warn!(error = %e, "Failed to record query metric");
            self.metrics.metrics_recording_failure("record_query");
        }

        if let Some(context) = &outcome.escalation_context {
            if let Err(e) = self.metrics.record_escalation(context.trigger) {
                tracing::warn!(error = %e, "Failed to record escalation metric");
                self.metrics.metrics_recording_failure("record_escalation");
            }
        }

        let duration_ms = routed_in.as_secs_f64() * 1000.0;
        if let Err(e) = self
            .metrics
            .record_routing_duration(decision.strategy, duration_ms)
        {
            tracing::warn!(error = %e, duration_ms, "Failed to record routing duration");
            self.metrics
                .metrics_recording_failure("record_routing_duration");
        }
    }

    fn record_fallback(&self, cause: &str) {
        if let Err(e) = self.metrics.record_fallback(cause) {
            tracing::warn!(error = %e, cause, "Failed to record fallback metric");
            self.metrics.metrics_recording_failure("record_fallback");
        }
    }
}

/// Mark an accepted Mill tool call as mixed when the text asks for coaching
///
/// Pattern decisions already carry their intent and pass through untouched.
fn with_coaching_cue(
    query: &str,
    classification: Classification,
) -> (RoutingDecision, Option<ParsedIntent>) {
    let Classification {
        decision, intent, ..
    } = classification;

    if decision.strategy != RoutingStrategy::ToolCall || decision.target != AgentId::Mill {
        return (decision, intent);
    }

    let cue = parse_user_intent(query);
    if !cue.has_coaching_intent() {
        return (decision, intent);
    }

    tracing::debug!(
        data_type = decision.data.kind(),
        "Tool call answered locally, text also asks for coaching"
    );
    (decision.mixed(), Some(cue))
}

/// `[routing] agent=mill data=summary strategy=pattern`
fn routing_summary(decision: &RoutingDecision) -> String {
    let mut line = format!(
        "[routing] agent={} data={} strategy={}",
        decision.target,
        decision.data.kind(),
        decision.strategy.as_str()
    );
    if decision.mixed {
        line.push_str(" mixed=true");
    }
    line
}
