//! checkfallbacks
//!
//! Probes every fallback proxy server in a JSON list and reports which ones
//! fail to relay traffic.
//!
//! # Architecture Overview
//!
//! ```text
//!   fallbacks.json ──▶ fallback::loader ──▶ dispatch (N workers)
//!                                               │
//!                                               ▼
//!                      dialer factory ◀── probe::executor ──▶ check strategy
//!                     (tcp / tls)               │            (ping / verify)
//!                                               ▼
//!                                      report::aggregator ──▶ stdout
//! ```
//!
//! Logs go to stderr and a JSON log file; stdout carries only the report
//! lines.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use checkfallbacks::config::{read_config, validate_config, CheckConfig, CheckMode, ConfigError};
use checkfallbacks::lifecycle::{self, signals, StartupError};
use checkfallbacks::observability::init_logging;
use checkfallbacks::report::Summary;

const EXIT_SUCCESS: u8 = 0;
/// Exit code for input, trust bootstrap and logging failures.
const EXIT_FAILURE: u8 = 1;
/// Exit code for an invalid configuration.
const EXIT_INVALID_CONFIG: u8 = 2;
/// Exit code after an interrupt, as shells report SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "checkfallbacks")]
#[command(about = "Check that fallback proxy servers are reachable and relaying", long_about = None)]
struct Cli {
    /// Optional TOML config file; flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file with an array of arrays of fallback servers.
    #[arg(long)]
    fallbacks: Option<PathBuf>,

    /// Number of concurrent connections.
    #[arg(short = 'n', long)]
    connections: Option<usize>,

    /// Checks per connection.
    #[arg(long)]
    checks: Option<u32>,

    /// Deadline for each check, in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Deadline for establishing a connection, in seconds.
    #[arg(long)]
    dial_timeout_secs: Option<u64>,

    /// Print request and response dumps.
    #[arg(short, long)]
    verbose: bool,

    /// Verify that upstream content is relayed instead of pinging.
    #[arg(long)]
    verify: bool,

    /// Only print failed fallbacks.
    #[arg(long)]
    failures_only: bool,

    /// Skip fetching trusted CAs from the global config.
    #[arg(long)]
    no_trust_bootstrap: bool,

    #[arg(long)]
    log_level: Option<String>,

    /// Directory for the JSON log file.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log to the console only.
    #[arg(long)]
    no_log_file: bool,
}

impl Cli {
    /// Read the config file (if any) and apply flags on top.
    fn into_config(self) -> Result<CheckConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => CheckConfig::default(),
        };

        if let Some(path) = self.fallbacks {
            config.fallbacks_file = path;
        }
        if let Some(n) = self.connections {
            config.workers = n;
        }
        if let Some(n) = self.checks {
            config.checks = n;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(secs) = self.dial_timeout_secs {
            config.dial_timeout_secs = secs;
        }
        if self.verbose {
            config.verbose = true;
        }
        if self.verify {
            config.mode = CheckMode::Verify;
        }
        if self.failures_only {
            config.report_success = false;
        }
        if self.no_trust_bootstrap {
            config.trust.enabled = false;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(dir) = self.log_dir {
            config.observability.log_dir = dir;
        }
        if self.no_log_file {
            config.observability.log_file = false;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("checkfallbacks: {}", e);
            return ExitCode::from(EXIT_INVALID_CONFIG);
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("checkfallbacks: {}", e);
        return ExitCode::from(EXIT_FAILURE);
    }

    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id);
    let cancel = CancellationToken::new();
    let interrupt = signals::cancel_on_interrupt(cancel.clone());
    let started = Instant::now();

    let result = lifecycle::run(&config, io::stdout(), cancel.clone())
        .instrument(span.clone())
        .await;
    let interrupted = cancel.is_cancelled();
    cancel.cancel();
    if let Err(e) = interrupt.await {
        tracing::debug!(error = %e, "Interrupt listener terminated abnormally");
    }

    let _entered = span.enter();
    match &result {
        Ok(summary) => tracing::info!(
            total = summary.total(),
            failed = summary.failed,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Checks complete"
        ),
        Err(e) => tracing::error!(error = %e, "Run aborted"),
    }
    ExitCode::from(exit_status(&result, interrupted))
}

/// Map a finished run to the process exit status.
///
/// Failed fallbacks are part of the report, not a process failure.
fn exit_status(result: &Result<Summary, StartupError>, interrupted: bool) -> u8 {
    match result {
        Err(_) => EXIT_FAILURE,
        Ok(_) if interrupted => EXIT_INTERRUPTED,
        Ok(_) => EXIT_SUCCESS,
    }
}
