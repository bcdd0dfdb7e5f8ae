//! Dialer seam between the probe engine and transports.
//!
//! # Data Flow
//! ```text
//! ProbeExecutor
//!     → DialerFactory::create_dialer (sync, never blocks)
//!     → Arc<dyn Dialer> scoped to one record + protocol
//!     → Dialer::connect (lazy, on first HTTP request)
//!     → BoxedStream handed to the HTTP/1 client
//! ```
//!
//! # Design Decisions
//! - Transport complexity (TLS, pluggable and UDP transports) lives behind the trait
//! - Every connect honours the caller's cancellation token
//! - direct.rs ships plain TCP and TLS; other transports are refused per record

pub mod direct;
pub mod tls;

use std::sync::Arc;
use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use crate::fallback::{Protocol, ServerRecord};

pub use direct::DirectDialerFactory;

/// Reserved device ID that exempts probe traffic from throttling.
///
/// Regular device IDs are base64, which never contains a tilde.
pub const PROBE_DEVICE_ID: &str = "~~~~~~";

/// A bidirectional byte stream to a fallback server.
pub trait Connection: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> Connection for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

pub type BoxedStream = Box<dyn Connection>;

/// Identity of the probing client, presented to every server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub device_id: String,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            device_id: PROBE_DEVICE_ID.to_string(),
        }
    }
}

/// Error type for dialer construction and connection establishment.
#[derive(Debug, Error)]
pub enum DialError {
    #[error("unsupported protocol {0}")]
    UnsupportedProtocol(String),

    #[error("invalid certificate: {0}")]
    Certificate(String),

    #[error("invalid server name {0}")]
    ServerName(String),

    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tls handshake with {addr} failed: {source}")]
    Handshake {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connect to {0} timed out")]
    Timeout(String),

    #[error("dial cancelled")]
    Cancelled,
}

/// Connection-establishing capability scoped to one server.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Open a stream that carries traffic for `address` through the server.
    async fn connect(
        &self,
        cancel: &CancellationToken,
        network: &str,
        address: &str,
    ) -> Result<BoxedStream, DialError>;
}

/// Produces dialers for server records.
pub trait DialerFactory: Send + Sync {
    fn create_dialer(
        &self,
        name: &str,
        record: &ServerRecord,
        protocol: &Protocol,
        identity: &DeviceIdentity,
    ) -> Result<Arc<dyn Dialer>, DialError>;
}
