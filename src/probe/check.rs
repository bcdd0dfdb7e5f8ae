//! Check strategies: what to ask a fallback server and how to judge the answer.
//!
//! # Strategies
//! - `Ping`: the proxy itself echoes a fixed-size payload, no origin involved
//! - `VerifyUpstream`: a real upstream fetch through the proxy, end to end
//!
//! Both attach the probe device ID and the record's auth token.

use std::collections::BTreeMap;
use std::io::Read;
use bytes::Bytes;
use flate2::read::GzDecoder;
use http::header::{HeaderName, HOST};
use http::{HeaderMap, Request, StatusCode, Uri, Version};
use http_body_util::Full;
use crate::dialer::DeviceIdentity;
use crate::probe::ProbeError;

pub const DEVICE_ID_HEADER: &str = "X-Lantern-Device-Id";
pub const TOKEN_HEADER: &str = "X-Lantern-Auth-Token";
pub const PING_HEADER: &str = "X-Lantern-Ping";

/// Synthetic host answered by the proxy itself.
pub const PING_URL: &str = "http://ping-chained-server";
/// Payload size requested by the ping header value `1` (one KiB).
pub const PING_PAYLOAD_SIZE: usize = 1024;

/// A fully read response.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// One request/response verification procedure.
pub trait CheckStrategy: Send + Sync {
    /// Short name used in error messages.
    fn name(&self) -> &'static str;

    fn build_request(
        &self,
        identity: &DeviceIdentity,
        auth_token: &str,
    ) -> Result<Request<Full<Bytes>>, http::Error>;

    fn evaluate(&self, response: &ProbeResponse) -> Result<(), ProbeError>;
}

/// Absolute-form GET carrying the probe identity headers.
fn probe_request(
    uri: &Uri,
    identity: &DeviceIdentity,
    auth_token: &str,
) -> http::request::Builder {
    let mut builder = Request::get(uri.clone())
        .header(DEVICE_ID_HEADER, identity.device_id.as_str())
        .header(TOKEN_HEADER, auth_token);
    if let Some(authority) = uri.authority() {
        builder = builder.header(HOST, authority.as_str());
    }
    builder
}

fn expect_ok(response: &ProbeResponse) -> Result<(), ProbeError> {
    if response.status != StatusCode::OK {
        return Err(ProbeError::BadStatus(response.status.as_u16()));
    }
    Ok(())
}

/// Ask the proxy to echo a 1 KiB payload.
#[derive(Debug, Clone)]
pub struct Ping {
    uri: Uri,
}

impl Ping {
    pub fn new() -> Self {
        Self {
            uri: Uri::from_static(PING_URL),
        }
    }
}

impl Default for Ping {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckStrategy for Ping {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn build_request(
        &self,
        identity: &DeviceIdentity,
        auth_token: &str,
    ) -> Result<Request<Full<Bytes>>, http::Error> {
        probe_request(&self.uri, identity, auth_token)
            .header(PING_HEADER, "1")
            .body(Full::new(Bytes::new()))
    }

    fn evaluate(&self, response: &ProbeResponse) -> Result<(), ProbeError> {
        expect_ok(response)?;
        if response.body.len() != PING_PAYLOAD_SIZE {
            return Err(ProbeError::WrongBodySize(response.body.len()));
        }
        Ok(())
    }
}

/// How the upstream response body is judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyCheck {
    /// Gzipped YAML mapping of proxy name to server entry.
    GzipYaml,
    /// Byte-for-byte match.
    Exact(Bytes),
}

/// Fetch a real upstream resource through the proxy.
#[derive(Debug, Clone)]
pub struct VerifyUpstream {
    uri: Uri,
    marker_header: HeaderName,
    body: BodyCheck,
}

impl VerifyUpstream {
    pub fn new(uri: Uri, marker_header: HeaderName, body: BodyCheck) -> Self {
        Self {
            uri,
            marker_header,
            body,
        }
    }

    fn check_body(&self, body: &[u8]) -> Result<(), ProbeError> {
        match &self.body {
            BodyCheck::Exact(expected) => {
                if body != &expected[..] {
                    return Err(ProbeError::BodyMismatch);
                }
                Ok(())
            }
            BodyCheck::GzipYaml => {
                let mut yaml = Vec::new();
                GzDecoder::new(body)
                    .read_to_end(&mut yaml)
                    .map_err(ProbeError::Decompress)?;
                serde_yaml::from_slice::<BTreeMap<String, serde_yaml::Value>>(&yaml)
                    .map_err(ProbeError::Parse)?;
                Ok(())
            }
        }
    }
}

impl CheckStrategy for VerifyUpstream {
    fn name(&self) -> &'static str {
        "verify upstream"
    }

    fn build_request(
        &self,
        identity: &DeviceIdentity,
        auth_token: &str,
    ) -> Result<Request<Full<Bytes>>, http::Error> {
        probe_request(&self.uri, identity, auth_token).body(Full::new(Bytes::new()))
    }

    fn evaluate(&self, response: &ProbeResponse) -> Result<(), ProbeError> {
        expect_ok(response)?;
        if !response.headers.contains_key(&self.marker_header) {
            return Err(ProbeError::MissingHeader(self.marker_header.to_string()));
        }
        self.check_body(&response.body)
    }
}
