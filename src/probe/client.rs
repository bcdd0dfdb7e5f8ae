//! HTTP/1 client over a lazily dialed stream.

use std::sync::Arc;
use bytes::Bytes;
use http::{Request, Uri};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use crate::dialer::{DialError, Dialer};
use crate::probe::check::ProbeResponse;

/// Error type for a single request/response exchange.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request has no host")]
    MissingHost,

    #[error(transparent)]
    Dial(#[from] DialError),

    #[error("http handshake failed: {0}")]
    Handshake(#[source] hyper::Error),

    #[error("{0}")]
    Send(#[source] hyper::Error),

    #[error("error reading response body: {0}")]
    Body(#[source] hyper::Error),
}

/// Request-issuing client for one fallback server.
///
/// The dialer is not touched until the first request. The connection is
/// kept for later requests while the server keeps it open.
pub struct ProbeClient {
    dialer: Arc<dyn Dialer>,
    cancel: CancellationToken,
    sender: Option<SendRequest<Full<Bytes>>>,
    dials: usize,
}

impl ProbeClient {
    pub fn new(dialer: Arc<dyn Dialer>, cancel: CancellationToken) -> Self {
        Self {
            dialer,
            cancel,
            sender: None,
            dials: 0,
        }
    }

    /// Number of connections dialed so far.
    pub fn dial_count(&self) -> usize {
        self.dials
    }

    /// Send a request and read the whole response.
    pub async fn send(&mut self, request: Request<Full<Bytes>>) -> Result<ProbeResponse, ClientError> {
        let mut sender = match self.sender.take() {
            Some(sender) if !sender.is_closed() => sender,
            _ => self.establish(request.uri()).await?,
        };

        sender.ready().await.map_err(ClientError::Send)?;
        let response = sender
            .send_request(request)
            .await
            .map_err(ClientError::Send)?;
        self.sender = Some(sender);

        let (parts, body) = response.into_parts();
        let body = body.collect().await.map_err(ClientError::Body)?.to_bytes();

        Ok(ProbeResponse {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            body,
        })
    }

    async fn establish(&mut self, uri: &Uri) -> Result<SendRequest<Full<Bytes>>, ClientError> {
        let host = uri.host().ok_or(ClientError::MissingHost)?;
        let target = format!("{}:{}", host, uri.port_u16().unwrap_or(80));

        let stream = self.dialer.connect(&self.cancel, "tcp", &target).await?;
        self.dials += 1;

        let (sender, connection) = http1::handshake(TokioIo::new(stream))
            .await
            .map_err(ClientError::Handshake)?;

        // The driver lives until the server closes or the probe is torn down.
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::trace!("Connection driver cancelled");
                }
                result = connection => {
                    if let Err(e) = result {
                        tracing::debug!(error = %e, "Connection closed with error");
                    }
                }
            }
        });

        Ok(sender)
    }
}
