//! Configuration loading and validation tests
//!
//! Exercises `Config::from_file` read/parse/validate phases against real
//! files on disk.

use millroute::config::{Config, RoutingMode};
use millroute::error::AppError;
use std::fs;
use std::str::FromStr;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).expect("Failed to write config");
    path
}

#[test]
fn test_missing_file_is_read_error_with_path() {
    let err = Config::from_file("/definitely/not/here.toml").expect_err("should fail");
    match err {
        AppError::ConfigFileRead { path, .. } => assert_eq!(path, "/definitely/not/here.toml"),
        other => panic!("expected ConfigFileRead, got {other:?}"),
    }
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, "[routing\nstrategy = ");
    let err = Config::from_file(&path).expect_err("should fail");
    assert!(matches!(err, AppError::ConfigParseFailed { .. }));
}

#[test]
fn test_unknown_strategy_is_parse_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, "[routing]\nstrategy = \"telepathy\"\n");
    let err = Config::from_file(&path).expect_err("should fail");
    assert!(matches!(err, AppError::ConfigParseFailed { .. }));
}

#[test]
fn test_hybrid_without_tool_caller_fails_validation() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, "[routing]\nstrategy = \"hybrid\"\n");
    let err = Config::from_file(&path).expect_err("should fail");
    match err {
        AppError::ConfigValidationFailed { reason, .. } => {
            assert!(reason.contains("[tool_caller]"), "{reason}");
        }
        other => panic!("expected ConfigValidationFailed, got {other:?}"),
    }
}

#[test]
fn test_tool_caller_url_must_end_with_v1() {
    let err = Config::from_str(
        r#"
[routing]
strategy = "hybrid"

[tool_caller]
name = "tiny"
base_url = "http://localhost:1234"
"#,
    )
    .expect_err("should fail");
    assert!(err.to_string().contains("/v1"));
}

#[test]
fn test_tool_caller_timeout_bounds() {
    for timeout in [0, 301] {
        let toml = format!(
            r#"
[tool_caller]
name = "tiny"
base_url = "http://localhost:1234/v1"
timeout_seconds = {timeout}
"#
        );
        assert!(Config::from_str(&toml).is_err(), "timeout {timeout}");
    }
}

#[test]
fn test_slow_tool_caller_rejected_in_hybrid_mode() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(
        &dir,
        r#"
[server]
request_timeout_seconds = 5

[routing]
strategy = "hybrid"

[tool_caller]
name = "slow"
base_url = "http://localhost:1234/v1"
timeout_seconds = 60
"#,
    );

    let err = Config::from_file(&path).expect_err("should fail");
    match err {
        AppError::ConfigValidationFailed { reason, .. } => {
            assert!(reason.contains("tool_caller.timeout_seconds (60)"), "{reason}");
            assert!(reason.contains("server.request_timeout_seconds (5)"), "{reason}");
        }
        other => panic!("expected ConfigValidationFailed, got {other:?}"),
    }
}

#[test]
fn test_slow_tool_caller_allowed_in_pattern_mode() {
    let config = Config::from_str(
        r#"
[server]
request_timeout_seconds = 5

[routing]
strategy = "pattern"

[tool_caller]
name = "slow"
base_url = "http://localhost:1234/v1"
timeout_seconds = 60
"#,
    )
    .expect("unused tool caller is not bound by the request timeout");
    assert!(config.active_tool_caller().is_none());
}

#[test]
fn test_blank_agent_name_rejected() {
    let err = Config::from_str("[agents.chatur]\nname = \"  \"\n").expect_err("should fail");
    assert!(err.to_string().contains("agents.chatur.name"));
}

#[test]
fn test_pattern_mode_ignores_tool_caller() {
    let config = Config::from_str(
        r#"
[routing]
strategy = "pattern"

[tool_caller]
name = "tiny"
base_url = "https://models.example.com/v1"
"#,
    )
    .expect("should parse");
    assert_eq!(config.routing.strategy, RoutingMode::Pattern);
    assert!(config.active_tool_caller().is_none());
}

#[test]
fn test_full_file_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(
        &dir,
        r#"
[server]
port = 8088

[routing]
strategy = "hybrid"

[tool_caller]
name = "qwen"
base_url = "http://127.0.0.1:8080/v1"

[ledger]
currency = "$"
seed_file = "ledger.json"
"#,
    );

    let config = Config::from_file(&path).expect("should load");
    assert_eq!(config.server.port, 8088);
    assert_eq!(config.ledger.currency, "$");
    assert_eq!(config.ledger.seed_file.as_deref(), Some("ledger.json"));
    let endpoint = config.active_tool_caller().expect("hybrid endpoint");
    assert_eq!(endpoint.max_tokens(), 256);
    assert_eq!(endpoint.timeout_seconds(), 10);
}
