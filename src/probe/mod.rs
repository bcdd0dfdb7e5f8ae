//! Probe subsystem: one server record in, one outcome out.
//!
//! # Data Flow
//! ```text
//! ServerRecord
//!     → executor.rs (derive protocol, build dialer, repeat checks)
//!     → check.rs (build request, judge response)
//!     → client.rs (lazy dial, HTTP/1 exchange over the dialed stream)
//!     → dump.rs (verbose request/response text)
//!     → ProbeOutcome
//! ```
//!
//! # Design Decisions
//! - Every check is raced against a hard deadline (resilience::timeouts)
//! - Failures are values: nothing a server does can abort the run
//! - Error text never includes the auth token

pub mod check;
pub mod client;
pub mod dump;
pub mod executor;

use std::time::Duration;
use thiserror::Error;
use crate::dialer::DialError;

pub use check::{BodyCheck, CheckStrategy, Ping, ProbeResponse, VerifyUpstream};
pub use client::{ClientError, ProbeClient};
pub use executor::{ProbeExecutor, ProbeSettings};

/// Coarse classification of probe failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Dialer,
    Request,
    Network,
    Verification,
    Timeout,
    Cancelled,
}

/// Why a probe failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("error building dialer: {0}")]
    Dialer(#[source] DialError),

    #[error("building {check} request failed: {source}")]
    Request {
        check: &'static str,
        #[source]
        source: http::Error,
    },

    #[error("{check} failed: {source}")]
    Network {
        check: &'static str,
        #[source]
        source: ClientError,
    },

    #[error("bad status code: {0}")]
    BadStatus(u16),

    #[error("wrong body size: {0}")]
    WrongBodySize(usize),

    #[error("missing {0} header")]
    MissingHeader(String),

    #[error("body does not match the expected content")]
    BodyMismatch,

    #[error("can't open gzip reader for config body: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("can't parse config response: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("check timed out after {0:?}")]
    Timeout(Duration),

    #[error("check cancelled")]
    Cancelled,
}

impl ProbeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProbeError::Dialer(_) => FailureKind::Dialer,
            ProbeError::Request { .. } => FailureKind::Request,
            ProbeError::Network { .. } => FailureKind::Network,
            ProbeError::BadStatus(_)
            | ProbeError::WrongBodySize(_)
            | ProbeError::MissingHeader(_)
            | ProbeError::BodyMismatch
            | ProbeError::Decompress(_)
            | ProbeError::Parse(_) => FailureKind::Verification,
            ProbeError::Timeout(_) => FailureKind::Timeout,
            ProbeError::Cancelled => FailureKind::Cancelled,
        }
    }
}
