//! millroute - query router for a personal-finance assistant
//!
//! Routes each user message to the Mill data agent, the Chatur coaching
//! agent, or both. A tool-calling model classifies queries when configured;
//! regex intent extraction takes over whenever it is absent or fails.

pub mod agents;
pub mod chat;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod telemetry;
