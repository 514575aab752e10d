//! Agent definitions
//!
//! The registry is built once at startup from configuration and shared by
//! reference. There is no global registry.

use crate::config::AgentsConfig;
use crate::router::AgentId;
use serde::{Deserialize, Serialize};

/// Display metadata for one agent
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AgentDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn default_mill() -> Self {
        Self::new("Mill", "answers questions about your transactions")
    }

    pub fn default_chatur() -> Self {
        Self::new("Chatur", "your personal financial coach")
    }
}

/// Fixed mapping from [`AgentId`] to its definition
///
/// Every `AgentId` has an entry; construction is the only way in.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    mill: AgentDefinition,
    chatur: AgentDefinition,
}

impl AgentRegistry {
    pub fn new(mill: AgentDefinition, chatur: AgentDefinition) -> Self {
        Self { mill, chatur }
    }

    pub fn from_config(config: &AgentsConfig) -> Self {
        Self::new(config.mill.clone(), config.chatur.clone())
    }

    pub fn get(&self, id: AgentId) -> &AgentDefinition {
        match id {
            AgentId::Mill => &self.mill,
            AgentId::Chatur => &self.chatur,
        }
    }

    /// Display name, e.g. "Chatur"
    pub fn name(&self, id: AgentId) -> &str {
        &self.get(id).name
    }

    /// "Chatur (your personal financial coach)", or just the name when there
    /// is no description
    pub fn label(&self, id: AgentId) -> String {
        let agent = self.get(id);
        if agent.description.trim().is_empty() {
            agent.name.clone()
        } else {
            format!("{} ({})", agent.name, agent.description)
        }
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::from_config(&AgentsConfig::default())
    }
}
