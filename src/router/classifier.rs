//! Query classification
//!
//! Turns a structured tool call, or failing that a pattern-extracted intent,
//! into a [`RoutingDecision`]. Deterministic and free of I/O.
//!
//! Fallback precedence:
//! 1. Coaching/insight cue with no data intent → Chatur
//! 2. Data intent plus coaching/insight cue → Mill, flagged as mixed
//! 3. Data intent only → Mill with the most specific data request
//! 4. Nothing recognised → Mill, `General`, low confidence

use super::intent::{ParsedIntent, parse_user_intent};
use super::tool_call::{ToolCall, ToolCallError};
use super::{AgentId, Confidence, DataRequest, RoutingDecision, RoutingStrategy};

/// Decision plus what it was derived from
#[derive(Debug)]
pub struct Classification {
    pub decision: RoutingDecision,
    /// Present when the pattern path ran
    pub intent: Option<ParsedIntent>,
    /// Tool call that was supplied but rejected as malformed
    pub rejected_tool_call: Option<ToolCallError>,
}

/// Classifier combining tool-call trust with pattern fallback
#[derive(Debug, Clone, Default)]
pub struct QueryClassifier;

impl QueryClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Route a query
    ///
    /// A valid `primary_tool_call` is trusted as-is. A missing or malformed
    /// one sends the query through pattern extraction.
    pub fn classify(&self, query: &str, primary_tool_call: Option<&ToolCall>) -> RoutingDecision {
        self.classify_detailed(query, primary_tool_call).decision
    }

    /// Same as [`classify`](Self::classify) but keeps the extracted intent
    /// and any rejected tool call for escalation and logging
    pub fn classify_detailed(
        &self,
        query: &str,
        primary_tool_call: Option<&ToolCall>,
    ) -> Classification {
        let mut rejected_tool_call = None;

        if let Some(call) = primary_tool_call {
            match call.to_decision() {
                Ok(decision) => {
                    return Classification {
                        decision,
                        intent: None,
                        rejected_tool_call: None,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        tool = %call.tool,
                        error = %e,
                        "Rejecting malformed tool call, falling back to pattern extraction"
                    );
                    rejected_tool_call = Some(e);
                }
            }
        }

        let intent = parse_user_intent(query);
        let decision = Self::decide_from_intent(&intent);

        tracing::debug!(
            target_agent = %decision.target,
            data_type = decision.data.kind(),
            mixed = decision.mixed,
            confidence = ?decision.confidence,
            "Pattern classification complete"
        );

        Classification {
            decision,
            intent: Some(intent),
            rejected_tool_call,
        }
    }

    /// Map an extracted intent to a decision using the fixed precedence
    pub fn decide_from_intent(intent: &ParsedIntent) -> RoutingDecision {
        let decision = |target, data| RoutingDecision::new(target, data, RoutingStrategy::Pattern);

        match Self::most_specific_data(intent) {
            None if intent.has_coaching_intent() => decision(AgentId::Chatur, DataRequest::None),
            None => decision(AgentId::Mill, DataRequest::General).with_confidence(Confidence::Low),
            Some(data) if intent.has_coaching_intent() => decision(AgentId::Mill, data).mixed(),
            Some(data) => decision(AgentId::Mill, data),
        }
    }

    /// recent > summary > expense > income
    fn most_specific_data(intent: &ParsedIntent) -> Option<DataRequest> {
        if let Some(recent) = intent.query_recent {
            return Some(DataRequest::RecentTransactions {
                count: recent.count,
            });
        }
        if intent.query_summary {
            return Some(DataRequest::Summary);
        }
        if let Some(entry) = &intent.log_expense {
            return Some(DataRequest::LogExpense {
                amount: entry.amount,
                description: entry.description.clone(),
            });
        }
        if let Some(entry) = &intent.log_income {
            return Some(DataRequest::LogIncome {
                amount: entry.amount,
                description: entry.description.clone(),
            });
        }
        None
    }
}
