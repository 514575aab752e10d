//! millroute binary
//!
//! One-shot `query`/`chat` commands, template generation, or the HTTP server.

use clap::Parser;
use millroute::{
    chat::ChatAdapter,
    cli::{Cli, Command, DEFAULT_CONFIG_PATH, format_report, generate_config_template},
    config::Config,
    error::{AppError, AppResult},
    handlers::{self, AppState},
    metrics::Metrics,
    router::{QueryOptions, QueryRouter},
    telemetry,
};
use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    if let Some(Command::Config { output }) = &cli.command {
        return write_template(output.as_deref());
    }

    let config = load_config(&cli.config)?;
    telemetry::init(&config.observability.log_level);

    let metrics = Arc::new(
        Metrics::new().map_err(|e| AppError::Internal(format!("metrics setup failed: {e}")))?,
    );
    let router = Arc::new(QueryRouter::from_config(&config, metrics.clone())?);

    match cli.command {
        Some(Command::Query { text, show_routing }) => {
            let result = router
                .process_user_query(&text, QueryOptions { show_routing })
                .await?;
            print!("{}", format_report(&text, &result));
            Ok(())
        }
        Some(Command::Chat { text }) => {
            let reply = ChatAdapter::new(router).chat_query(&text).await?;
            println!("{reply}");
            Ok(())
        }
        Some(Command::Serve) | None => {
            let timeout = Duration::from_secs(config.server.request_timeout_seconds);
            serve(&config, AppState::new(router, metrics, timeout)).await
        }
        Some(Command::Config { .. }) => Ok(()),
    }
}

/// Missing default config falls back to built-in defaults; an explicit path
/// must exist
fn load_config(path: &str) -> AppResult<Config> {
    if path == DEFAULT_CONFIG_PATH && !Path::new(path).exists() {
        return Ok(Config::default());
    }
    Config::from_file(path)
}

fn write_template(output: Option<&str>) -> AppResult<()> {
    let template = generate_config_template();
    match output {
        Some(path) => {
            std::fs::write(path, template)
                .map_err(|e| AppError::Internal(format!("failed to write '{path}': {e}")))?;
            eprintln!("Configuration template written to {path}");
        }
        None => print!("{template}"),
    }
    Ok(())
}

async fn serve(config: &Config, state: AppState) -> AppResult<()> {
    let host = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .map_err(|e| AppError::Config(format!("invalid server.host '{}': {e}", config.server.host)))?;
    let addr = SocketAddr::from((host, config.server.port));

    let app = handlers::app(state);

    tracing::info!("Starting millroute server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Internal(format!("failed to bind {addr}: {e}")))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("server error: {e}")))?;

    Ok(())
}
