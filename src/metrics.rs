//! Prometheus metrics collection for millroute
//!
//! Tracks:
//! - Queries by answering agent and routing strategy
//! - Primary-path fallbacks by cause
//! - Escalations by trigger
//! - Data agent failures
//! - Routing decision latency
//!
//! Exposed via the `/metrics` endpoint in Prometheus text format.

use crate::router::{AgentId, EscalationTrigger, RoutingStrategy};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
///
/// Label values come from closed enums (`AgentId`, `RoutingStrategy`,
/// `EscalationTrigger`) or the fixed `ToolCallError::cause` set, so
/// cardinality stays bounded.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    queries_total: IntCounterVec,
    fallbacks_total: IntCounterVec,
    escalations_total: IntCounterVec,
    data_fetch_failures: IntCounter,
    routing_duration: HistogramVec,
    metrics_recording_failures: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance with its own registry
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // 2 agents × 2 strategies
        let queries_total = IntCounterVec::new(
            Opts::new(
                "millroute_queries_total",
                "Total queries processed by answering agent and routing strategy",
            ),
            &["agent", "strategy"],
        )?;

        let fallbacks_total = IntCounterVec::new(
            Opts::new(
                "millroute_fallbacks_total",
                "Total fallbacks from the tool-call path to pattern extraction by cause",
            ),
            &["cause"],
        )?;

        let escalations_total = IntCounterVec::new(
            Opts::new(
                "millroute_escalations_total",
                "Total escalations to the coaching agent by trigger",
            ),
            &["trigger"],
        )?;

        let data_fetch_failures = IntCounter::with_opts(Opts::new(
            "millroute_data_fetch_failures_total",
            "Total data agent failures surfaced to callers",
        ))?;

        let routing_duration = HistogramVec::new(
            HistogramOpts::new(
                "millroute_routing_duration_ms",
                "Routing decision latency in milliseconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]),
            &["strategy"],
        )?;

        // Prometheus internal errors; frequent increments need investigation
        let metrics_recording_failures = IntCounterVec::new(
            Opts::new(
                "millroute_metrics_recording_failures_total",
                "Total metrics recording operation failures by operation",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(queries_total.clone()))?;
        registry.register(Box::new(fallbacks_total.clone()))?;
        registry.register(Box::new(escalations_total.clone()))?;
        registry.register(Box::new(data_fetch_failures.clone()))?;
        registry.register(Box::new(routing_duration.clone()))?;
        registry.register(Box::new(metrics_recording_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            queries_total,
            fallbacks_total,
            escalations_total,
            data_fetch_failures,
            routing_duration,
            metrics_recording_failures,
        })
    }

    /// Record a processed query
    ///
    /// # Errors
    ///
    /// Returns an error if the metric is not registered.
    pub fn record_query(
        &self,
        agent: AgentId,
        strategy: RoutingStrategy,
    ) -> Result<(), prometheus::Error> {
        self.queries_total
            .get_metric_with_label_values(&[agent.as_str(), strategy.as_str()])?
            .inc();
        Ok(())
    }

    /// Record a fallback to the pattern path
    ///
    /// `cause` is a `ToolCallError::cause` label.
    pub fn record_fallback(&self, cause: &str) -> Result<(), prometheus::Error> {
        self.fallbacks_total
            .get_metric_with_label_values(&[cause])?
            .inc();
        Ok(())
    }

    pub fn record_escalation(&self, trigger: EscalationTrigger) -> Result<(), prometheus::Error> {
        self.escalations_total
            .get_metric_with_label_values(&[trigger.as_str()])?
            .inc();
        Ok(())
    }

    pub fn record_data_fetch_failure(&self) {
        self.data_fetch_failures.inc();
    }

    /// Record routing decision duration
    ///
    /// # Errors
    ///
    /// Returns an error if `duration_ms` is NaN, infinite or negative, since
    /// such values corrupt every histogram percentile.
    pub fn record_routing_duration(
        &self,
        strategy: RoutingStrategy,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite (not NaN or Infinity), got: {}",
                duration_ms
            )));
        }
        if duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be non-negative, got: {}",
                duration_ms
            )));
        }

        self.routing_duration
            .get_metric_with_label_values(&[strategy.as_str()])?
            .observe(duration_ms);
        Ok(())
    }

    /// Count a failed recording operation
    pub fn metrics_recording_failure(&self, operation: &str) {
        // Label errors here cannot be surfaced anywhere useful
        if let Ok(counter) = self
            .metrics_recording_failures
            .get_metric_with_label_values(&[operation])
        {
            counter.inc();
        }
    }

    pub fn queries_count(&self, agent: AgentId, strategy: RoutingStrategy) -> u64 {
        self.queries_total
            .get_metric_with_label_values(&[agent.as_str(), strategy.as_str()])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    pub fn fallbacks_count(&self, cause: &str) -> u64 {
        self.fallbacks_total
            .get_metric_with_label_values(&[cause])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    pub fn escalations_count(&self, trigger: EscalationTrigger) -> u64 {
        self.escalations_total
            .get_metric_with_label_values(&[trigger.as_str()])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    pub fn data_fetch_failures_count(&self) -> u64 {
        self.data_fetch_failures.get()
    }

    /// Encode all metrics in Prometheus text exposition format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let metric_count = metric_families.len();

        tracing::debug!(
            metric_family_count = metric_count,
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();

        encoder.encode(&metric_families, &mut buffer).map_err(|e| {
            tracing::error!(
                error = %e,
                metric_family_count = metric_count,
                "Prometheus text encoder failed"
            );
            prometheus::Error::Msg(format!(
                "Failed to encode {} metric families: {}",
                metric_count, e
            ))
        })?;

        String::from_utf8(buffer).map_err(|e| {
            tracing::error!(error = %e, "Prometheus output was not valid UTF-8");
            prometheus::Error::Msg(format!("Metrics output is not valid UTF-8: {}", e))
        })
    }
}
