//! Probe execution for a single server record.
//!
//! # Responsibilities
//! - Derive the effective protocol and obtain a scoped dialer
//! - Run the configured check, repeated on the same connection
//! - Bound every check with a hard deadline that also tears down I/O
//! - Fold every failure into the outcome

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use crate::config::CheckConfig;
use crate::dialer::{DeviceIdentity, DialerFactory};
use crate::fallback::{ProbeOutcome, Protocol, ServerRecord};
use crate::probe::client::ProbeClient;
use crate::probe::check::CheckStrategy;
use crate::probe::dump::{dump_request, dump_response};
use crate::probe::{FailureKind, ProbeError};
use crate::resilience::timeouts::{with_deadline, DeadlineError};

/// Immutable per-run probe settings.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Checks per connection, run sequentially.
    pub checks: u32,
    /// Deadline for each check.
    pub timeout: Duration,
    /// Capture request/response dumps.
    pub verbose: bool,
    pub identity: DeviceIdentity,
}

impl ProbeSettings {
    pub fn from_config(config: &CheckConfig) -> Self {
        Self {
            checks: config.checks,
            timeout: config.timeout(),
            verbose: config.verbose,
            identity: DeviceIdentity::default(),
        }
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            checks: 1,
            timeout: Duration::from_secs(30),
            verbose: false,
            identity: DeviceIdentity::default(),
        }
    }
}

/// Runs a check strategy against one record at a time.
pub struct ProbeExecutor {
    factory: Arc<dyn DialerFactory>,
    strategy: Arc<dyn CheckStrategy>,
    settings: ProbeSettings,
}

impl ProbeExecutor {
    pub fn new(
        factory: Arc<dyn DialerFactory>,
        strategy: Arc<dyn CheckStrategy>,
        settings: ProbeSettings,
    ) -> Self {
        Self {
            factory,
            strategy,
            settings,
        }
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Probe one record. Never fails; failures are carried in the outcome.
    pub async fn probe(
        &self,
        record: &ServerRecord,
        worker_id: usize,
        cancel: &CancellationToken,
    ) -> ProbeOutcome {
        let mut diagnostics = Vec::new();
        let outcome = match self.run(record, worker_id, cancel, &mut diagnostics).await {
            Ok(()) => ProbeOutcome::success(record.address.clone()),
            Err(error) => {
                match error.kind() {
                    FailureKind::Dialer | FailureKind::Network => tracing::warn!(
                        worker = worker_id,
                        addr = %record.address,
                        error = %error,
                        "Unable to reach fallback"
                    ),
                    kind => tracing::debug!(
                        worker = worker_id,
                        addr = %record.address,
                        kind = ?kind,
                        error = %error,
                        "Probe failed"
                    ),
                }
                ProbeOutcome::failure(record.address.clone(), error)
            }
        };

        if self.settings.verbose {
            outcome.with_diagnostics(diagnostics)
        } else {
            outcome
        }
    }

    async fn run(
        &self,
        record: &ServerRecord,
        worker_id: usize,
        cancel: &CancellationToken,
        diagnostics: &mut Vec<String>,
    ) -> Result<(), ProbeError> {
        if cancel.is_cancelled() {
            return Err(ProbeError::Cancelled);
        }

        let protocol = Protocol::of(record);
        let name = format!("{} ({})", record.address, protocol);
        tracing::debug!(worker = worker_id, dialer = %name, "Testing fallback");

        let scoped = record.scoped_for_probe();
        let dialer = self
            .factory
            .create_dialer(&name, &scoped, &protocol, &self.settings.identity)
            .map_err(ProbeError::Dialer)?;

        // Dropping the guard stops the connection driver once the probe ends.
        let probe_cancel = cancel.child_token();
        let _teardown = probe_cancel.clone().drop_guard();
        let mut client = ProbeClient::new(dialer, probe_cancel.clone());

        for attempt in 1..=self.settings.checks.max(1) {
            let check = self.check_once(&mut client, &scoped, diagnostics);
            match with_deadline(self.settings.timeout, &probe_cancel, check).await {
                Ok(result) => result?,
                Err(DeadlineError::Elapsed(limit)) => {
                    tracing::warn!(
                        worker = worker_id,
                        addr = %record.address,
                        attempt,
                        "Check timed out"
                    );
                    return Err(ProbeError::Timeout(limit));
                }
                Err(DeadlineError::Cancelled) => return Err(ProbeError::Cancelled),
            }
        }

        Ok(())
    }

    async fn check_once(
        &self,
        client: &mut ProbeClient,
        record: &ServerRecord,
        diagnostics: &mut Vec<String>,
    ) -> Result<(), ProbeError> {
        let check = self.strategy.name();
        let request = self
            .strategy
            .build_request(&self.settings.identity, &record.auth_token)
            .map_err(|source| ProbeError::Request { check, source })?;

        if self.settings.verbose {
            diagnostics.push(dump_request(&request));
        }

        let response = client
            .send(request)
            .await
            .map_err(|source| ProbeError::Network { check, source })?;

        if self.settings.verbose {
            diagnostics.push(dump_response(&response));
        }

        self.strategy.evaluate(&response)
    }
}
