//! Telemetry and observability setup
//!
//! Configures structured logging with tracing and tracing-subscriber.
//! Logs go to stderr so CLI output on stdout stays clean.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Build the default filter directive for `level`
fn default_directive(level: &str) -> String {
    format!("millroute={},tower_http=debug", level)
}

/// Initialize tracing subscriber for structured logging
///
/// Only the first call per process has an effect.
///
/// Reads the filter from `RUST_LOG`, defaulting to `level` for this crate.
///
/// # Examples
///
/// ```no_run
/// millroute::telemetry::init("info");
/// tracing::info!("Application started");
/// ```
pub fn init(level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    });
}
