//! Direct TCP and TLS dialers.
//!
//! # Responsibilities
//! - Dial the fallback server itself (the HTTP request carries the target)
//! - Wrap the stream in TLS pinned to the record certificate when required
//! - Refuse transports this build cannot speak

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;
use tokio_util::sync::CancellationToken;
use crate::bootstrap::TrustBundle;
use crate::dialer::{tls, BoxedStream, DeviceIdentity, DialError, Dialer, DialerFactory};
use crate::fallback::{Protocol, ServerRecord};

/// Factory for dialers that connect straight to the server over TCP.
pub struct DirectDialerFactory {
    trust: Arc<TrustBundle>,
    dial_timeout: Duration,
}

impl DirectDialerFactory {
    pub fn new(trust: Arc<TrustBundle>, dial_timeout: Duration) -> Self {
        Self {
            trust,
            dial_timeout,
        }
    }
}

impl DialerFactory for DirectDialerFactory {
    fn create_dialer(
        &self,
        name: &str,
        record: &ServerRecord,
        protocol: &Protocol,
        identity: &DeviceIdentity,
    ) -> Result<Arc<dyn Dialer>, DialError> {
        let tls = match protocol {
            Protocol::Http => None,
            Protocol::Https => Some(TlsSettings {
                connector: tls::pinned_connector(&record.certificate, &self.trust)?,
                server_name: tls::server_name(record.host())?,
            }),
            other => return Err(DialError::UnsupportedProtocol(other.to_string())),
        };

        tracing::debug!(
            dialer = %name,
            device_id = %identity.device_id,
            "Direct dialer created"
        );

        Ok(Arc::new(DirectDialer {
            server: record.address.clone(),
            tls,
            dial_timeout: self.dial_timeout,
        }))
    }
}

struct TlsSettings {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

/// Dialer bound to one fallback server.
struct DirectDialer {
    server: String,
    tls: Option<TlsSettings>,
    dial_timeout: Duration,
}

impl DirectDialer {
    async fn establish(&self) -> Result<BoxedStream, DialError> {
        let tcp = TcpStream::connect(&self.server)
            .await
            .map_err(|source| DialError::Connect {
                addr: self.server.clone(),
                source,
            })?;
        if let Err(e) = tcp.set_nodelay(true) {
            tracing::trace!(server = %self.server, error = %e, "Unable to set TCP_NODELAY");
        }

        match &self.tls {
            None => Ok(Box::new(tcp)),
            Some(settings) => {
                let stream = settings
                    .connector
                    .connect(settings.server_name.clone(), tcp)
                    .await
                    .map_err(|source| DialError::Handshake {
                        addr: self.server.clone(),
                        source,
                    })?;
                Ok(Box::new(stream))
            }
        }
    }
}

#[async_trait]
impl Dialer for DirectDialer {
    async fn connect(
        &self,
        cancel: &CancellationToken,
        network: &str,
        address: &str,
    ) -> Result<BoxedStream, DialError> {
        tracing::trace!(server = %self.server, network, target = address, "Dialing");

        tokio::select! {
            _ = cancel.cancelled() => Err(DialError::Cancelled),
            result = time::timeout(self.dial_timeout, self.establish()) => match result {
                Ok(stream) => stream,
                Err(_) => Err(DialError::Timeout(self.server.clone())),
            },
        }
    }
}
