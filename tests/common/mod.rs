//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::rustls::crypto::aws_lc_rs;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use checkfallbacks::dialer::{BoxedStream, DeviceIdentity, DialError, Dialer, DialerFactory};
use checkfallbacks::fallback::{ProbeOutcome, Protocol, ServerRecord};
use checkfallbacks::probe::{Ping, ProbeExecutor, ProbeSettings};
use checkfallbacks::Dispatcher;

pub const PING_BODY_LEN: usize = 1024;

/// How a mock server answers.
#[derive(Debug, Clone)]
pub struct Behavior {
    pub status: u16,
    pub body_len: usize,
    pub delay: Duration,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            status: 200,
            body_len: PING_BODY_LEN,
            delay: Duration::ZERO,
        }
    }
}

/// Dialer factory backed by in-memory servers.
#[derive(Default)]
pub struct MockDialerFactory {
    behaviors: HashMap<String, Behavior>,
    broken: HashSet<String>,
    unreachable: HashSet<String>,
    default: Behavior,
    created: Mutex<Vec<(String, Protocol)>>,
    dials: Arc<AtomicUsize>,
    requests: Arc<AtomicUsize>,
}

impl MockDialerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(mut self, addr: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(addr.to_string(), behavior);
        self
    }

    /// Make `create_dialer` fail for `addr`.
    pub fn with_broken(mut self, addr: &str) -> Self {
        self.broken.insert(addr.to_string());
        self
    }

    /// Make every `connect` for `addr` fail as if the port were closed.
    pub fn with_unreachable(mut self, addr: &str) -> Self {
        self.unreachable.insert(addr.to_string());
        self
    }

    pub fn with_default(mut self, behavior: Behavior) -> Self {
        self.default = behavior;
        self
    }

    /// Addresses and protocols passed to `create_dialer`, in call order.
    pub fn created(&self) -> Vec<(String, Protocol)> {
        self.created.lock().unwrap().clone()
    }

    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl DialerFactory for MockDialerFactory {
    fn create_dialer(
        &self,
        _name: &str,
        record: &ServerRecord,
        protocol: &Protocol,
        _identity: &DeviceIdentity,
    ) -> Result<Arc<dyn Dialer>, DialError> {
        self.created
            .lock()
            .unwrap()
            .push((record.address.clone(), protocol.clone()));

        if self.broken.contains(&record.address) {
            return Err(DialError::Certificate(format!("no usable certificate for {}", record.address)));
        }

        let behavior = self
            .behaviors
            .get(&record.address)
            .cloned()
            .unwrap_or_else(|| self.default.clone());
        Ok(Arc::new(MockDialer {
            server: record.address.clone(),
            reachable: !self.unreachable.contains(&record.address),
            behavior,
            dials: self.dials.clone(),
            requests: self.requests.clone(),
        }))
    }
}

struct MockDialer {
    server: String,
    reachable: bool,
    behavior: Behavior,
    dials: Arc<AtomicUsize>,
    requests: Arc<AtomicUsize>,
}

#[async_trait]
impl Dialer for MockDialer {
    async fn connect(
        &self,
        _cancel: &CancellationToken,
        _network: &str,
        _address: &str,
    ) -> Result<BoxedStream, DialError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        if !self.reachable {
            return Err(DialError::Connect {
                addr: self.server.clone(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            });
        }
        let (client, server) = tokio::io::duplex(64 * 1024);
        tokio::spawn(serve(server, self.behavior.clone(), self.requests.clone()));
        Ok(Box::new(client))
    }
}

/// Answer every request head on `stream` with the canned response.
async fn serve<S>(mut stream: S, behavior: Behavior, requests: Arc<AtomicUsize>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; 4096];
    let mut pending = Vec::new();
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        pending.extend_from_slice(&buf[..n]);
        while let Some(end) = pending.windows(4).position(|w| w == b"\r\n\r\n") {
            pending.drain(..end + 4);
            requests.fetch_add(1, Ordering::SeqCst);
            if !behavior.delay.is_zero() {
                tokio::time::sleep(behavior.delay).await;
            }
            let head = format!(
                "HTTP/1.1 {} Mock\r\nContent-Length: {}\r\n\r\n",
                behavior.status, behavior.body_len
            );
            if stream.write_all(head.as_bytes()).await.is_err()
                || stream.write_all(&vec![b'x'; behavior.body_len]).await.is_err()
            {
                return;
            }
        }
    }
}

/// Start a plaintext mock proxy on an ephemeral local port.
pub async fn start_mock_proxy(behavior: Behavior) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(serve(socket, behavior.clone(), requests.clone()));
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// Start a TLS mock proxy presenting the given certificate and PKCS#8 key.
pub async fn start_tls_mock_proxy(behavior: Behavior, cert_pem: &str, key_pem: &str) -> SocketAddr {
    let certs = rustls_pemfile::certs(&mut cert_pem.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let key = rustls_pemfile::private_key(&mut key_pem.as_bytes()).unwrap().unwrap();
    let config = ServerConfig::builder_with_provider(Arc::new(aws_lc_rs::default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let behavior = behavior.clone();
            let requests = requests.clone();
            tokio::spawn(async move {
                if let Ok(stream) = acceptor.accept(socket).await {
                    serve(stream, behavior, requests).await;
                }
            });
        }
    });
    addr
}

pub fn record(addr: &str) -> ServerRecord {
    ServerRecord::new(addr, "test-token")
}

pub fn ping_executor(factory: Arc<dyn DialerFactory>, settings: ProbeSettings) -> Arc<ProbeExecutor> {
    Arc::new(ProbeExecutor::new(factory, Arc::new(Ping::new()), settings))
}

/// Dispatch `records` and collect every outcome.
pub async fn run_all(
    executor: Arc<ProbeExecutor>,
    workers: usize,
    records: Vec<ServerRecord>,
    cancel: CancellationToken,
) -> Vec<ProbeOutcome> {
    let mut rx = Dispatcher::new(executor, workers).dispatch(records, cancel);
    let mut outcomes = Vec::new();
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
    }
    outcomes
}
