//! Server record and transport protocol derivation.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};

/// One fallback server under test.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ServerRecord {
    /// Network endpoint (host:port).
    #[serde(rename = "addr", alias = "Addr")]
    pub address: String,

    /// PEM certificate. Presence implies a TLS-capable transport.
    #[serde(rename = "cert", alias = "Cert", default)]
    pub certificate: String,

    /// Name of a non-default transport; empty means default.
    #[serde(rename = "pluggabletransport", alias = "PluggableTransport", default)]
    pub pluggable_transport: String,

    /// Opaque settings for the named pluggable transport.
    #[serde(
        rename = "pluggabletransportsettings",
        alias = "PluggableTransportSettings",
        default
    )]
    pub pluggable_transport_settings: BTreeMap<String, String>,

    /// UDP-class transport settings. Non-empty overrides everything else.
    #[serde(rename = "kcpsettings", alias = "KCPSettings", default)]
    pub transport_settings: serde_json::Map<String, serde_json::Value>,

    /// Credential attached to every check request.
    #[serde(rename = "authtoken", alias = "AuthToken", default)]
    pub auth_token: String,

    #[serde(alias = "Trusted", default)]
    pub trusted: bool,

    /// Preconnect hint for dialers that keep warm connections.
    #[serde(rename = "maxpreconnect", alias = "MaxPreconnect", default)]
    pub max_preconnect: Option<u32>,
}

impl ServerRecord {
    /// Create a plaintext record for the given address.
    pub fn new(address: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            auth_token: auth_token.into(),
            ..Self::default()
        }
    }

    /// Copy of this record scoped for a single probe.
    ///
    /// Probes dial on demand, so warm connections are capped at one.
    pub fn scoped_for_probe(&self) -> Self {
        Self {
            max_preconnect: Some(1),
            ..self.clone()
        }
    }

    /// Host part of `address`, without the port.
    pub fn host(&self) -> &str {
        match self.address.rsplit_once(':') {
            Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => {
                host.trim_start_matches('[').trim_end_matches(']')
            }
            _ => &self.address,
        }
    }
}

/// Effective transport protocol of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Plain TCP.
    Http,
    /// TLS over TCP, pinned to the record certificate.
    Https,
    /// A named pluggable transport.
    Pluggable(String),
    /// UDP-class transport configured through `kcpsettings`.
    Kcp,
}

impl Protocol {
    /// Derive the protocol of a record.
    ///
    /// Precedence: transport settings, then pluggable transport name, then
    /// certificate, then plaintext.
    pub fn of(record: &ServerRecord) -> Self {
        if !record.transport_settings.is_empty() {
            Protocol::Kcp
        } else if !record.pluggable_transport.is_empty() {
            Protocol::Pluggable(record.pluggable_transport.clone())
        } else if !record.certificate.is_empty() {
            Protocol::Https
        } else {
            Protocol::Http
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
            Protocol::Pluggable(name) => name,
            Protocol::Kcp => "kcp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
