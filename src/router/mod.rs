//! Routing logic for millroute
//!
//! Decides whether a user message is answered locally by the Mill data agent,
//! handed to the Chatur coaching agent, or both.

pub mod classifier;
pub mod escalation;
pub mod intent;
pub mod query_router;
pub mod tool_call;

pub use classifier::{Classification, QueryClassifier};
pub use escalation::{EscalationContext, EscalationEvaluator, EscalationOutcome, EscalationTrigger};
pub use intent::{MoneyEntry, ParsedIntent, RecentQuery, has_intent, parse_user_intent};
pub use query_router::QueryRouter;
pub use tool_call::{LlmToolCaller, ToolCall, ToolCallError, ToolCaller};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent a query can be routed to
///
/// Display names and descriptions live in [`crate::agents::AgentRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentId {
    /// Local data-serving agent
    Mill,
    /// Financial coaching agent
    Chatur,
}

impl AgentId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mill => "mill",
            Self::Chatur => "chatur",
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data the target agent needs to answer a query
///
/// Serialized as `{"type": ..., "parameters": {...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "parameters", rename_all = "snake_case")]
pub enum DataRequest {
    RecentTransactions { count: u32 },
    Summary,
    LogExpense { amount: f64, description: String },
    LogIncome { amount: f64, description: String },
    /// Nothing recognisable; the data agent answers with a generic overview
    General,
    /// Coaching route, no data fetch
    None,
}

impl DataRequest {
    /// Short tag used in logs, metrics and CLI reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RecentTransactions { .. } => "recent_transactions",
            Self::Summary => "summary",
            Self::LogExpense { .. } => "log_expense",
            Self::LogIncome { .. } => "log_income",
            Self::General => "general",
            Self::None => "none",
        }
    }
}

/// Which path produced a routing decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategy {
    /// Structured tool call from the language model
    ToolCall,
    /// Regex intent extraction (fallback)
    Pattern,
}

impl RoutingStrategy {
    /// Convert to string representation for logging and metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToolCall => "tool_call",
            Self::Pattern => "pattern",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    High,
    Low,
}

/// Result of classifying a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Agent that should answer
    pub target: AgentId,
    /// What the target agent needs (`dataNeeded`)
    pub data: DataRequest,
    pub strategy: RoutingStrategy,
    /// Data query that also asked for coaching; answered by Mill, flagged
    /// for escalation
    #[serde(default)]
    pub mixed: bool,
    #[serde(default)]
    pub confidence: Confidence,
}

impl RoutingDecision {
    /// Create a new routing decision with high confidence and no mixed flag
    pub fn new(target: AgentId, data: DataRequest, strategy: RoutingStrategy) -> Self {
        Self {
            target,
            data,
            strategy,
            mixed: false,
            confidence: Confidence::High,
        }
    }

    pub fn mixed(mut self) -> Self {
        self.mixed = true;
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    /// Pure handoff to the coaching agent (not a mixed query)
    pub fn is_coaching_handoff(&self) -> bool {
        self.target == AgentId::Chatur && !self.mixed
    }
}

/// Per-call options for [`QueryRouter::process_user_query`]
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct QueryOptions {
    /// Append a one-line routing summary to the response text
    #[serde(default)]
    pub show_routing: bool,
}

/// Outcome of processing one user query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// True iff the data agent answered locally
    pub handled: bool,
    pub response: String,
    pub routing: RoutingDecision,
    pub escalation_needed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_context: Option<EscalationContext>,
}
