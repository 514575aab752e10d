//! Tool-call classification (primary routing path)
//!
//! A language model is asked to pick one of Mill's or Chatur's tools for the
//! user's message. The reply is a single JSON object, e.g.
//! `{"tool": "log_expense", "arguments": {"amount": 500, "description": "groceries"}}`.
//!
//! Every failure here is recoverable: the [`QueryRouter`](crate::router::QueryRouter)
//! falls back to pattern extraction exactly once.

use crate::config::ToolCallerEndpoint;
use crate::router::{AgentId, DataRequest, RoutingDecision, RoutingStrategy};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured tool call returned by the tool-calling model
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToolCall {
    #[serde(alias = "name")]
    pub tool: String,
    #[serde(default, alias = "args", alias = "parameters")]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool: tool.into(),
            arguments,
        }
    }

    /// Convert to a routing decision, rejecting malformed arguments
    ///
    /// Amounts must be JSON numbers that are finite and non-negative;
    /// descriptions must be non-blank strings; counts must be positive and
    /// fit in `u32`.
    pub fn to_decision(&self) -> Result<RoutingDecision, ToolCallError> {
        let decision = |target, data| RoutingDecision::new(target, data, RoutingStrategy::ToolCall);

        match self.tool.as_str() {
            "log_expense" => {
                let (amount, description) = self.money_arguments()?;
                Ok(decision(
                    AgentId::Mill,
                    DataRequest::LogExpense {
                        amount,
                        description,
                    },
                ))
            }
            "log_income" => {
                let (amount, description) = self.money_arguments()?;
                Ok(decision(
                    AgentId::Mill,
                    DataRequest::LogIncome {
                        amount,
                        description,
                    },
                ))
            }
            "get_summary" => Ok(decision(AgentId::Mill, DataRequest::Summary)),
            "get_recent_transactions" => {
                let count = self.count_argument()?;
                Ok(decision(
                    AgentId::Mill,
                    DataRequest::RecentTransactions { count },
                ))
            }
            "escalate_to_coach" | "request_insights" => {
                Ok(decision(AgentId::Chatur, DataRequest::None))
            }
            other => Err(ToolCallError::UnknownTool {
                tool: other.to_string(),
            }),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> ToolCallError {
        ToolCallError::InvalidArguments {
            tool: self.tool.clone(),
            reason: reason.into(),
        }
    }

    fn money_arguments(&self) -> Result<(f64, String), ToolCallError> {
        let amount = match self.arguments.get("amount") {
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| self.invalid("amount is not representable as f64"))?,
            Some(other) => {
                return Err(self.invalid(format!("amount must be a number, got {other}")));
            }
            None => return Err(self.invalid("missing amount")),
        };
        if !amount.is_finite() || amount < 0.0 {
            return Err(self.invalid(format!(
                "amount must be finite and non-negative, got {amount}"
            )));
        }

        let description = match self.arguments.get("description") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::String(_)) => return Err(self.invalid("description is blank")),
            Some(other) => {
                return Err(self.invalid(format!("description must be a string, got {other}")));
            }
            None => return Err(self.invalid("missing description")),
        };

        Ok((amount, description))
    }

    fn count_argument(&self) -> Result<u32, ToolCallError> {
        let count = self
            .arguments
            .get("count")
            .ok_or_else(|| self.invalid("missing count"))?;
        let count = count
            .as_u64()
            .ok_or_else(|| self.invalid(format!("count must be a positive integer, got {count}")))?;
        match u32::try_from(count) {
            Ok(0) => Err(self.invalid("count must be greater than 0")),
            Ok(count) => Ok(count),
            Err(_) => Err(self.invalid(format!("count {count} exceeds {}", u32::MAX))),
        }
    }
}

/// Trait for the tool-calling collaborator
///
/// Allows dependency injection of different implementations, so tests can
/// use mocks that never touch the network.
#[async_trait]
pub trait ToolCaller: Send + Sync {
    /// Ask the model which tool answers `query`
    async fn call_tool(&self, query: &str) -> Result<ToolCall, ToolCallError>;
}

/// Errors from the primary (tool-call) routing path
#[derive(Debug, thiserror::Error)]
pub enum ToolCallError {
    /// Model returned no text at all
    #[error(
        "Tool-calling model returned empty response from {endpoint}. \
         Expected a JSON object with \"tool\" and \"arguments\"."
    )]
    EmptyResponse { endpoint: String },

    /// No JSON tool call could be read from the reply
    ///
    /// `response` holds a preview of at most 500 chars.
    #[error("Tool-calling model returned unparseable response ({response_length} bytes): {response}")]
    UnparseableResponse {
        endpoint: String,
        response: String,
        response_length: usize,
    },

    #[error(
        "Tool-calling response exceeded {max_size} bytes (got {size} bytes). Model not following instructions."
    )]
    SizeExceeded {
        endpoint: String,
        size: usize,
        max_size: usize,
    },

    #[error("Failed to configure AgentOptions for tool caller: {details}")]
    AgentOptionsConfigError { endpoint: String, details: String },

    #[error("Stream error after {bytes_received} bytes received: {error_message}")]
    StreamError {
        endpoint: String,
        bytes_received: usize,
        error_message: String,
    },

    #[error("Tool call to {endpoint} timed out after {timeout_seconds}s")]
    Timeout {
        endpoint: String,
        timeout_seconds: u64,
    },

    #[error("Tool-calling model chose unknown tool '{tool}'")]
    UnknownTool { tool: String },

    #[error("Tool '{tool}' called with invalid arguments: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

impl ToolCallError {
    /// Network or endpoint trouble, as opposed to the model misbehaving
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StreamError { .. } | Self::Timeout { .. })
    }

    /// Short label for the fallback metric
    pub fn cause(&self) -> &'static str {
        match self {
            Self::EmptyResponse { .. } => "empty_response",
            Self::UnparseableResponse { .. } => "unparseable_response",
            Self::SizeExceeded { .. } => "size_exceeded",
            Self::AgentOptionsConfigError { .. } => "config_error",
            Self::StreamError { .. } => "stream_error",
            Self::Timeout { .. } => "timeout",
            Self::UnknownTool { .. } => "unknown_tool",
            Self::InvalidArguments { .. } => "invalid_arguments",
        }
    }
}

/// Maximum size for a tool-call reply (bytes)
///
/// A well-formed reply is well under 200 bytes; anything past this limit is
/// the model writing prose instead of a tool call.
const MAX_TOOL_RESPONSE: usize = 2048;

/// User messages longer than this are truncated before prompting
const MAX_USER_MESSAGE_CHARS: usize = 500;

/// Tool caller backed by an OpenAI-compatible endpoint through open-agent-sdk
pub struct LlmToolCaller {
    endpoint: ToolCallerEndpoint,
}

impl LlmToolCaller {
    pub fn new(endpoint: ToolCallerEndpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &ToolCallerEndpoint {
        &self.endpoint
    }

    /// Build the classification prompt
    ///
    /// The user message is truncated and followed by the reply instructions so
    /// a long message cannot push them out of context.
    fn build_tool_prompt(user_message: &str) -> String {
        let char_count = user_message.chars().count();
        let message = if char_count > MAX_USER_MESSAGE_CHARS {
            let truncated: String = user_message.chars().take(MAX_USER_MESSAGE_CHARS).collect();
            format!("{}... [truncated]", truncated)
        } else {
            user_message.to_string()
        };

        format!(
            "You are a router for a personal finance assistant. Pick exactly one tool.\n\n\
             Tools answered by Mill (transaction data):\n\
             - log_expense {{\"amount\": number, \"description\": string}}: record money spent.\n\
             - log_income {{\"amount\": number, \"description\": string}}: record money received.\n\
             - get_summary {{}}: totals of spending and income.\n\
             - get_recent_transactions {{\"count\": integer}}: the last N transactions.\n\n\
             Tools answered by Chatur (financial coach):\n\
             - escalate_to_coach {{}}: budgeting help, advice, what the user should do.\n\
             - request_insights {{}}: habits, patterns, why the user spends the way they do.\n\n\
             User message:\n{}\n\n\
             Respond with ONLY a JSON object of the form \
             {{\"tool\": \"<tool name>\", \"arguments\": {{...}}}}.\n\
             Do not include explanations or other text.",
            message
        )
    }

    /// Read a tool call out of the model's reply
    ///
    /// Tolerates code fences and chatter around the object: the text between
    /// the first `{` and the last `}` is parsed.
    fn parse_tool_call(response: &str, endpoint: &str) -> Result<ToolCall, ToolCallError> {
        let trimmed = response.trim();
        if trimmed.is_empty() {
            return Err(ToolCallError::EmptyResponse {
                endpoint: endpoint.to_string(),
            });
        }

        let unparseable = || {
            let preview = if response.chars().count() > 500 {
                format!("{}... [truncated]", response.chars().take(500).collect::<String>())
            } else {
                response.to_string()
            };
            ToolCallError::UnparseableResponse {
                endpoint: endpoint.to_string(),
                response: preview,
                response_length: response.len(),
            }
        };

        let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) else {
            return Err(unparseable());
        };
        if end < start {
            return Err(unparseable());
        }

        serde_json::from_str::<ToolCall>(&trimmed[start..=end]).map_err(|e| {
            tracing::debug!(
                error = %e,
                response_length = response.len(),
                "Tool-call reply is not a valid tool call object"
            );
            unparseable()
        })
    }

    async fn query_endpoint(&self, prompt: &str) -> Result<String, ToolCallError> {
        let endpoint = &self.endpoint;
        let options = open_agent::AgentOptions::builder()
            .model(endpoint.name())
            .base_url(endpoint.base_url())
            .max_tokens(endpoint.max_tokens() as u32)
            .temperature(endpoint.temperature() as f32)
            .build()
            .map_err(|e| ToolCallError::AgentOptionsConfigError {
                endpoint: endpoint.base_url().to_string(),
                details: format!(
                    "{}. Check configuration: model='{}', max_tokens={}, base_url='{}'",
                    e,
                    endpoint.name(),
                    endpoint.max_tokens(),
                    endpoint.base_url()
                ),
            })?;

        use futures::StreamExt;

        let mut stream = open_agent::query(prompt, &options).await.map_err(|e| {
            ToolCallError::StreamError {
                endpoint: endpoint.base_url().to_string(),
                bytes_received: 0,
                error_message: format!("Tool call query failed: {}", e),
            }
        })?;

        let mut response_text = String::new();
        while let Some(result) = stream.next().await {
            match result {
                Ok(block) => {
                    use open_agent::ContentBlock;
                    match block {
                        ContentBlock::Text(text_block) => {
                            if response_text.len() + text_block.text.len() > MAX_TOOL_RESPONSE {
                                return Err(ToolCallError::SizeExceeded {
                                    endpoint: endpoint.base_url().to_string(),
                                    size: response_text.len() + text_block.text.len(),
                                    max_size: MAX_TOOL_RESPONSE,
                                });
                            }
                            response_text.push_str(&text_block.text);
                        }
                        other_block => {
                            tracing::warn!(
                                endpoint_name = %endpoint.name(),
                                block_type = ?other_block,
                                "Received non-text content block from tool caller, skipping"
                            );
                        }
                    }
                }
                Err(e) => {
                    return Err(ToolCallError::StreamError {
                        endpoint: endpoint.base_url().to_string(),
                        bytes_received: response_text.len(),
                        error_message: format!("{}", e),
                    });
                }
            }
        }

        Ok(response_text)
    }
}

#[async_trait]
impl ToolCaller for LlmToolCaller {
    async fn call_tool(&self, query: &str) -> Result<ToolCall, ToolCallError> {
        let prompt = Self::build_tool_prompt(query);
        let timeout_seconds = self.endpoint.timeout_seconds();

        tracing::debug!(
            endpoint_name = %self.endpoint.name(),
            prompt_length = prompt.len(),
            timeout_seconds = timeout_seconds,
            "Querying tool-calling model"
        );

        let response = tokio::time::timeout(
            std::time::Duration::from_secs(timeout_seconds),
            self.query_endpoint(&prompt),
        )
        .await
        .map_err(|_elapsed| ToolCallError::Timeout {
            endpoint: self.endpoint.base_url().to_string(),
            timeout_seconds,
        })??;

        let call = Self::parse_tool_call(&response, self.endpoint.base_url())?;

        tracing::debug!(
            endpoint_name = %self.endpoint.name(),
            tool = %call.tool,
            "Tool-calling model selected tool"
        );

        Ok(call)
    }
}

#[cfg(test)]
mod parsing_tests;


#[cfg(test)]
mod error_type_tests;
