//! Startup orchestration.
//!
//! # Responsibilities
//! - Bootstrap trust material and build the dialer factory
//! - Load the fallback list and select the check strategy
//! - Wire executor, dispatcher and aggregator, then drain the results
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and happens before dispatch
//! - Per-record failures never surface here; they are part of the report

use std::io::Write;
use std::sync::Arc;
use bytes::Bytes;
use http::header::HeaderName;
use http::Uri;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use crate::bootstrap::{fetch_trust_bundle, BootstrapError, TrustBundle};
use crate::config::{CheckConfig, CheckMode, TrustConfig, VerifyBodyMode};
use crate::dialer::{DialerFactory, DirectDialerFactory};
use crate::dispatch::Dispatcher;
use crate::fallback::{load_fallbacks, FallbackError};
use crate::probe::{BodyCheck, CheckStrategy, Ping, ProbeExecutor, ProbeSettings, VerifyUpstream};
use crate::report::{ResultAggregator, Summary};

/// Fatal errors that stop a run before or while reporting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Fallbacks(#[from] FallbackError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error("invalid verify settings: {0}")]
    Verify(String),

    #[error("unable to write report: {0}")]
    Output(#[from] std::io::Error),
}

/// Select the check strategy for this run.
pub fn build_strategy(config: &CheckConfig) -> Result<Arc<dyn CheckStrategy>, StartupError> {
    match config.mode {
        CheckMode::Ping => Ok(Arc::new(Ping::new())),
        CheckMode::Verify => {
            let verify = &config.verify;
            let uri: Uri = verify
                .url
                .parse()
                .map_err(|e| StartupError::Verify(format!("url {:?}: {}", verify.url, e)))?;
            let marker = HeaderName::from_bytes(verify.marker_header.as_bytes())
                .map_err(|e| StartupError::Verify(format!("header {:?}: {}", verify.marker_header, e)))?;
            let body = match verify.body {
                VerifyBodyMode::GzipYaml => BodyCheck::GzipYaml,
                VerifyBodyMode::Exact => BodyCheck::Exact(Bytes::from(verify.expected_body.clone())),
            };
            Ok(Arc::new(VerifyUpstream::new(uri, marker, body)))
        }
    }
}

/// Fetch the trust bundle, or use an empty one when bootstrap is disabled.
pub async fn build_trust(config: &TrustConfig) -> Result<TrustBundle, StartupError> {
    if !config.enabled {
        tracing::info!("Trust bootstrap disabled");
        return Ok(TrustBundle::default());
    }
    Ok(fetch_trust_bundle(&config.global_config_url, config.fetch_timeout()).await?)
}

/// Probe every fallback in the configured file and report to `out`.
pub async fn run_checks<W: Write>(
    config: &CheckConfig,
    factory: Arc<dyn DialerFactory>,
    out: W,
    cancel: CancellationToken,
) -> Result<Summary, StartupError> {
    let records = load_fallbacks(&config.fallbacks_file)?;
    let strategy = build_strategy(config)?;

    tracing::info!(
        fallbacks = records.len(),
        workers = config.workers,
        checks = config.checks,
        mode = ?config.mode,
        timeout_secs = config.timeout_secs,
        "Testing fallbacks"
    );

    let executor = Arc::new(ProbeExecutor::new(
        factory,
        strategy,
        ProbeSettings::from_config(config),
    ));
    let dispatcher = Dispatcher::new(executor, config.workers);
    let outcomes = dispatcher.dispatch(records, cancel);

    let summary = ResultAggregator::new(out, config.verbose, config.report_success)
        .consume(outcomes)
        .await?;

    tracing::info!(ok = summary.ok, failed = summary.failed, "Finished testing fallbacks");
    Ok(summary)
}

/// Full run with the built-in direct dialers.
pub async fn run<W: Write>(
    config: &CheckConfig,
    out: W,
    cancel: CancellationToken,
) -> Result<Summary, StartupError> {
    let trust = build_trust(&config.trust).await?;
    let factory = Arc::new(DirectDialerFactory::new(Arc::new(trust), config.dial_timeout()));
    run_checks(config, factory, out, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_is_the_default_strategy() {
        let strategy = build_strategy(&CheckConfig::default()).unwrap();
        assert_eq!(strategy.name(), "ping");
    }

    #[test]
    fn verify_mode_builds_upstream_check() {
        let mut config = CheckConfig::default();
        config.mode = CheckMode::Verify;
        let strategy = build_strategy(&config).unwrap();
        assert_eq!(strategy.name(), "verify upstream");
    }

    #[test]
    fn verify_mode_rejects_bad_header() {
        let mut config = CheckConfig::default();
        config.mode = CheckMode::Verify;
        config.verify.marker_header = "bad header".into();
        assert!(matches!(build_strategy(&config), Err(StartupError::Verify(_))));
    }

    #[tokio::test]
    async fn disabled_trust_bootstrap_is_empty() {
        let mut trust = TrustConfig::default();
        trust.enabled = false;
        assert!(build_trust(&trust).await.unwrap().is_empty());
    }
}
