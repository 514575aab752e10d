//! Command-line interface for millroute
//!
//! Argument parsing, subcommands and the report printed by `millroute query`.

use crate::router::QueryResult;
use clap::{Parser, Subcommand};
use std::fmt::Write;

/// Routes money questions between a data agent and a coaching agent
#[derive(Parser)]
#[command(name = "millroute")]
#[command(version)]
#[command(about = "Routes money questions between a data agent and a coaching agent")]
#[command(
    long_about = "millroute answers expense, income and summary questions from a local ledger \
    (Mill) and hands coaching or insight questions to a financial coach (Chatur). Queries are \
    classified by a tool-calling model when one is configured, with regex fallback."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: String,

    /// Runs the HTTP server when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Subcommand)]
pub enum Command {
    /// Route one query and print a routing report
    Query {
        /// The user's message
        text: String,

        /// Append a one-line routing summary to the response
        #[arg(long)]
        show_routing: bool,
    },

    /// Route one chat message and print only the reply
    Chat {
        /// The user's message
        text: String,
    },

    /// Start the HTTP server
    Serve,

    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Render a [`QueryResult`] as the `millroute query` report
pub fn format_report(query: &str, result: &QueryResult) -> String {
    let mut report = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(report, "Query:      {query}");
    let _ = writeln!(report, "Response:   {}", result.response);
    let _ = writeln!(report, "Handled:    {}", result.handled);
    let _ = writeln!(report, "Agent:      {}", result.routing.target);
    let _ = writeln!(report, "Data:       {}", result.routing.data.kind());
    let _ = writeln!(report, "Escalation: {}", result.escalation_needed);
    if let Some(context) = &result.escalation_context {
        let _ = writeln!(report, "Reason:     {}", context.reason);
    }
    report
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# millroute Configuration
# =======================
#
# Every section is optional. An empty file gives pattern-only routing with an
# empty in-memory ledger.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "127.0.0.1"

# Port to listen on
port = 3000

# Request timeout in seconds (1-300)
request_timeout_seconds = 30

# ─────────────────────────────────────────────────────────────────────────────
# ROUTING CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[routing]
# Routing strategy:
#   - "pattern": Regex intent extraction only (no model calls)
#   - "hybrid": Tool-calling model first, regex fallback on any failure
strategy = "pattern"

# ─────────────────────────────────────────────────────────────────────────────
# TOOL CALLER (used when strategy = "hybrid")
# ─────────────────────────────────────────────────────────────────────────────
#
# Any OpenAI-compatible endpoint. The model is asked to pick one of:
# log_expense, log_income, get_summary, get_recent_transactions,
# escalate_to_coach, request_insights.

[tool_caller]
name = "your-tool-calling-model"
base_url = "http://localhost:11434/v1"
max_tokens = 256
temperature = 0.0
# Seconds before the pattern fallback takes over (1-300, and below
# server.request_timeout_seconds)
timeout_seconds = 10

# ─────────────────────────────────────────────────────────────────────────────
# AGENTS
# ─────────────────────────────────────────────────────────────────────────────

[agents.mill]
name = "Mill"
description = "answers questions about your transactions"

[agents.chatur]
name = "Chatur"
description = "your personal financial coach"

# ─────────────────────────────────────────────────────────────────────────────
# LEDGER
# ─────────────────────────────────────────────────────────────────────────────

[ledger]
# Prefix used when formatting amounts
currency = "Rs"

# Transactions kept in memory; the oldest is dropped once full (1-1000000)
max_transactions = 10000

# Optional JSON array loaded at startup, e.g.
# [{"kind": "expense", "amount": 120, "description": "chai"}]
# seed_file = "ledger.json"

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}
