//! Configuration management for millroute
//!
//! Parses TOML configuration files and provides typed access to settings.

use crate::agents::AgentDefinition;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Root configuration structure
///
/// Every section is optional; an empty file yields a pattern-only router
/// with an empty ledger.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Tool-calling model endpoint, required when `routing.strategy = "hybrid"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_caller: Option<ToolCallerEndpoint>,
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

/// How queries are classified
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    /// Tool-calling model first, pattern fallback on failure
    Hybrid,
    /// Pattern extraction only
    #[default]
    Pattern,
}

/// Routing configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub strategy: RoutingMode,
}

/// OpenAI-compatible endpoint used for tool-call classification
///
/// Fields are private; values are checked by `Config::validate()` and cannot
/// be mutated afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolCallerEndpoint {
    name: String,
    base_url: String,
    #[serde(default = "default_tool_max_tokens")]
    max_tokens: usize,
    #[serde(default = "default_tool_temperature")]
    temperature: f64,
    #[serde(default = "default_tool_timeout")]
    timeout_seconds: u64,
}

impl ToolCallerEndpoint {
    /// Model identifier sent to the endpoint
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Upper bound on one tool-call round trip
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }
}

fn default_tool_max_tokens() -> usize {
    256
}

fn default_tool_temperature() -> f64 {
    0.0
}

fn default_tool_timeout() -> u64 {
    10
}

/// Display metadata for the two agents
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentsConfig {
    #[serde(default = "AgentDefinition::default_mill")]
    pub mill: AgentDefinition,
    #[serde(default = "AgentDefinition::default_chatur")]
    pub chatur: AgentDefinition,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            mill: AgentDefinition::default_mill(),
            chatur: AgentDefinition::default_chatur(),
        }
    }
}

/// In-memory ledger used by the Mill data agent
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    /// JSON array of transactions loaded at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_file: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Oldest entries are evicted past this many
    #[serde(default = "default_max_transactions")]
    pub max_transactions: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            seed_file: None,
            currency: default_currency(),
            max_transactions: default_max_transactions(),
        }
    }
}

fn default_max_transactions() -> usize {
    crate::data::DEFAULT_MAX_TRANSACTIONS
}

fn default_currency() -> String {
    "Rs".to_string()
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            crate::error::AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|source| {
            crate::error::AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            }
        })?;

        config
            .validate()
            .map_err(|e| crate::error::AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Tool-caller endpoint to use, if the routing mode calls for one
    pub fn active_tool_caller(&self) -> Option<&ToolCallerEndpoint> {
        match self.routing.strategy {
            RoutingMode::Hybrid => self.tool_caller.as_ref(),
            RoutingMode::Pattern => None,
        }
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()` and `from_str()`; call it yourself when building
    /// a `Config` by hand.
    pub fn validate(&self) -> crate::error::AppResult<()> {
        use crate::error::AppError;

        if self.routing.strategy == RoutingMode::Hybrid && self.tool_caller.is_none() {
            return Err(AppError::Config(
                "routing.strategy = \"hybrid\" requires a [tool_caller] section.\n\n\
                Example fix - add to config.toml:\n\
                [tool_caller]\n\
                name = \"my-tool-model\"\n\
                base_url = \"http://localhost:1234/v1\""
                    .to_string(),
            ));
        }

        if let Some(endpoint) = &self.tool_caller {
            if endpoint.name.trim().is_empty() {
                return Err(AppError::Config(
                    "tool_caller.name must not be empty".to_string(),
                ));
            }

            if !endpoint.base_url.starts_with("http://")
                && !endpoint.base_url.starts_with("https://")
            {
                return Err(AppError::Config(format!(
                    "tool_caller.base_url '{}' must start with 'http://' or 'https://'",
                    endpoint.base_url
                )));
            }

            if !endpoint.base_url.ends_with("/v1") {
                return Err(AppError::Config(format!(
                    "tool_caller.base_url '{}' must end with '/v1' (e.g., 'http://host:port/v1')",
                    endpoint.base_url
                )));
            }

            // open-agent-sdk takes max_tokens as u32
            if endpoint.max_tokens == 0 || endpoint.max_tokens > u32::MAX as usize {
                return Err(AppError::Config(format!(
                    "tool_caller.max_tokens must be between 1 and {}, got {}",
                    u32::MAX,
                    endpoint.max_tokens
                )));
            }

            if !endpoint.temperature.is_finite()
                || endpoint.temperature < 0.0
                || endpoint.temperature > 2.0
            {
                return Err(AppError::Config(format!(
                    "tool_caller.temperature must be a finite number between 0.0 and 2.0, got {}",
                    endpoint.temperature
                )));
            }

            if endpoint.timeout_seconds == 0 || endpoint.timeout_seconds > 300 {
                return Err(AppError::Config(format!(
                    "tool_caller.timeout_seconds must be in (0, 300], got {}",
                    endpoint.timeout_seconds
                )));
            }
        }

        for (key, agent) in [("mill", &self.agents.mill), ("chatur", &self.agents.chatur)] {
            if agent.name.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "agents.{key}.name must not be empty"
                )));
            }
        }

        if self.ledger.currency.trim().is_empty() {
            return Err(AppError::Config(
                "ledger.currency must not be empty".to_string(),
            ));
        }

        if self.ledger.max_transactions == 0 || self.ledger.max_transactions > 1_000_000 {
            return Err(AppError::Config(format!(
                "ledger.max_transactions must be between 1 and 1000000, got {}",
                self.ledger.max_transactions
            )));
        }

        if self.server.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "request_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.server.request_timeout_seconds > 300 {
            return Err(AppError::Config(format!(
                "request_timeout_seconds cannot exceed 300 seconds (5 minutes), got {}",
                self.server.request_timeout_seconds
            )));
        }

        // Tool caller must time out before the request does
        if let Some(endpoint) = self.active_tool_caller() {
            if endpoint.timeout_seconds >= self.server.request_timeout_seconds {
                return Err(AppError::Config(format!(
                    "tool_caller.timeout_seconds ({}) must be less than \
                     server.request_timeout_seconds ({})",
                    endpoint.timeout_seconds, self.server.request_timeout_seconds
                )));
            }
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = crate::error::AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(toml_str).map_err(|source| {
            crate::error::AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            }
        })?;

        config.validate()?;
        Ok(config)
    }
}
