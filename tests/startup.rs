//! End-to-end runs through the startup path with in-memory servers.

use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use checkfallbacks::config::CheckConfig;
use checkfallbacks::fallback::FallbackError;
use checkfallbacks::lifecycle::{run_checks, StartupError};

mod common;

use common::{Behavior, MockDialerFactory};

fn fallbacks_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn config_for(file: &NamedTempFile) -> CheckConfig {
    let mut config = CheckConfig::default();
    config.fallbacks_file = file.path().to_path_buf();
    config.workers = 2;
    config.trust.enabled = false;
    config
}

#[tokio::test]
async fn test_malformed_input_aborts_before_dispatch() {
    let file = fallbacks_file("[[{\"addr\": ");
    let factory = Arc::new(MockDialerFactory::new());
    let mut out = Vec::new();

    let result = run_checks(&config_for(&file), factory.clone(), &mut out, CancellationToken::new()).await;

    assert!(matches!(result, Err(StartupError::Fallbacks(FallbackError::Parse { .. }))));
    assert!(out.is_empty());
    assert!(factory.created().is_empty());
}

#[tokio::test]
async fn test_missing_input_file_is_fatal() {
    let mut config = CheckConfig::default();
    config.fallbacks_file = "/nonexistent/fallbacks.json".into();
    let mut out = Vec::new();

    let result = run_checks(&config, Arc::new(MockDialerFactory::new()), &mut out, CancellationToken::new()).await;

    assert!(matches!(result, Err(StartupError::Fallbacks(FallbackError::Io { .. }))));
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_report_lists_each_fallback() {
    let file = fallbacks_file(
        r#"[
            [{"addr": "198.51.100.1:443", "authtoken": "a"}],
            [{"addr": "198.51.100.2:443", "authtoken": "b"},
             {"addr": "198.51.100.3:443", "authtoken": "c"}]
        ]"#,
    );
    let factory = Arc::new(
        MockDialerFactory::new().with_behavior("198.51.100.2:443", Behavior { status: 502, ..Behavior::default() }),
    );
    let mut out = Vec::new();

    let summary = run_checks(&config_for(&file), factory, &mut out, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.total(), 3);
    assert_eq!(summary.failed, 1);

    let text = String::from_utf8(out).unwrap();
    let mut lines: Vec<_> = text.lines().collect();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "Fallback 198.51.100.1:443 OK.",
            "Fallback 198.51.100.3:443 OK.",
            "[failed fallback check] 198.51.100.2:443: bad status code: 502",
        ]
    );
}

#[tokio::test]
async fn test_failures_only_report() {
    let file = fallbacks_file(r#"[[{"addr": "198.51.100.7:443"}, {"addr": "198.51.100.8:443"}]]"#);
    let factory = Arc::new(MockDialerFactory::new().with_broken("198.51.100.8:443"));
    let mut config = config_for(&file);
    config.report_success = false;
    let mut out = Vec::new();

    let summary = run_checks(&config, factory, &mut out, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!((summary.ok, summary.failed), (1, 1));
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("[failed fallback check] 198.51.100.8:443: "));
}

#[tokio::test]
async fn test_unreachable_server_is_reported_and_run_succeeds() {
    let file = fallbacks_file(r#"[[{"addr": "198.51.100.11:443"}, {"addr": "198.51.100.12:443"}]]"#);
    let factory = Arc::new(MockDialerFactory::new().with_unreachable("198.51.100.12:443"));
    let mut config = config_for(&file);
    config.workers = 1;
    let mut out = Vec::new();

    let summary = run_checks(&config, factory, &mut out, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!((summary.ok, summary.failed), (1, 1));
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "Fallback 198.51.100.11:443 OK.");
    assert!(
        lines[1].starts_with(
            "[failed fallback check] 198.51.100.12:443: ping failed: connect to 198.51.100.12:443 failed"
        ),
        "{}",
        lines[1]
    );
}
