//! Escalation evaluation
//!
//! Decides whether a query needs the coaching agent and records why. Reasons
//! are built only from the trigger and the coach's display name so the same
//! input always yields the same text.

use super::intent::ParsedIntent;
use super::{AgentId, RoutingDecision, RoutingStrategy};
use crate::agents::AgentRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What caused an escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationTrigger {
    CoachingRequest,
    InsightRequest,
    MixedQuery,
    ToolCallHandoff,
}

impl EscalationTrigger {
    /// Human-readable label, first half of the escalation reason
    pub fn label(&self) -> &'static str {
        match self {
            Self::CoachingRequest => "explicit coaching request",
            Self::InsightRequest => "insight/analysis request",
            Self::MixedQuery => "mixed data+coaching query",
            Self::ToolCallHandoff => "coaching handoff requested by tool call",
        }
    }

    /// Metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoachingRequest => "coaching_request",
            Self::InsightRequest => "insight_request",
            Self::MixedQuery => "mixed_query",
            Self::ToolCallHandoff => "tool_call_handoff",
        }
    }
}

impl fmt::Display for EscalationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who to escalate to and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationContext {
    pub agent: AgentId,
    pub trigger: EscalationTrigger,
    /// `"<label>: <detail>"`
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EscalationOutcome {
    pub escalation_needed: bool,
    pub escalation_context: Option<EscalationContext>,
}

impl EscalationOutcome {
    fn none() -> Self {
        Self::default()
    }

    fn escalate(context: EscalationContext) -> Self {
        Self {
            escalation_needed: true,
            escalation_context: Some(context),
        }
    }
}

/// Stateless evaluator; holds only the agent registry for display names
#[derive(Debug, Clone)]
pub struct EscalationEvaluator {
    registry: Arc<AgentRegistry>,
}

impl EscalationEvaluator {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    /// Evaluate a routing decision
    ///
    /// `intent` is whatever text extraction ran for this query: the fallback
    /// result, the coaching cue check on a Mill tool call, or `None`.
    pub fn evaluate(
        &self,
        decision: &RoutingDecision,
        intent: Option<&ParsedIntent>,
    ) -> EscalationOutcome {
        let Some(trigger) = Self::trigger_for(decision, intent) else {
            return EscalationOutcome::none();
        };

        let coach = self.registry.name(AgentId::Chatur);
        let detail = match trigger {
            EscalationTrigger::CoachingRequest => format!("handing off to {coach}"),
            EscalationTrigger::InsightRequest => {
                format!("{coach} can look for patterns in your spending")
            }
            EscalationTrigger::MixedQuery => {
                format!("data answered locally, {coach} can follow up with advice")
            }
            EscalationTrigger::ToolCallHandoff => format!("routed to {coach}"),
        };

        tracing::debug!(
            trigger = trigger.as_str(),
            target_agent = %decision.target,
            "Escalation required"
        );

        EscalationOutcome::escalate(EscalationContext {
            agent: AgentId::Chatur,
            trigger,
            reason: format!("{}: {detail}", trigger.label()),
        })
    }

    fn trigger_for(
        decision: &RoutingDecision,
        intent: Option<&ParsedIntent>,
    ) -> Option<EscalationTrigger> {
        if decision.mixed {
            return Some(EscalationTrigger::MixedQuery);
        }
        if let Some(intent) = intent {
            if intent.request_coach {
                return Some(EscalationTrigger::CoachingRequest);
            }
            if intent.request_insights {
                return Some(EscalationTrigger::InsightRequest);
            }
        }
        if decision.strategy == RoutingStrategy::ToolCall && decision.target == AgentId::Chatur {
            return Some(EscalationTrigger::ToolCallHandoff);
        }
        None
    }
}
