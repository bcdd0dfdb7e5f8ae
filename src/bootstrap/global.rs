//! Global config fetch and trusted CA extraction.

use std::io::Read;
use std::time::Duration;
use flate2::read::GzDecoder;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use crate::bootstrap::TrustBundle;
use crate::dialer::tls::parse_pem_certificates;

/// Error type for trust bootstrap. Always fatal to the run.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("unable to get global config: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response status fetching global config: {0}")]
    Status(StatusCode),

    #[error("unable to read gzipped global config: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("unable to unmarshal global config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("trusted CA {common_name} has an invalid certificate: {reason}")]
    Certificate { common_name: String, reason: String },
}

#[derive(Debug, Deserialize)]
struct GlobalConfig {
    #[serde(default)]
    trustedcas: Vec<TrustedCa>,
}

#[derive(Debug, Deserialize)]
struct TrustedCa {
    #[serde(default)]
    commonname: String,
    cert: String,
}

/// Fetch the global config and build the trust bundle from it.
pub async fn fetch_trust_bundle(url: &str, timeout: Duration) -> Result<TrustBundle, BootstrapError> {
    tracing::info!(url = %url, "Fetching global config");

    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client.get(url).send().await?;
    if response.status() != StatusCode::OK {
        return Err(BootstrapError::Status(response.status()));
    }
    let body = response.bytes().await?;

    let bundle = parse_global_config(&body)?;
    tracing::info!(trusted_cas = bundle.len(), "Trust bundle loaded");
    Ok(bundle)
}

/// Decode a gzipped global config document into a trust bundle.
pub fn parse_global_config(gzipped: &[u8]) -> Result<TrustBundle, BootstrapError> {
    let mut yaml = Vec::new();
    GzDecoder::new(gzipped)
        .read_to_end(&mut yaml)
        .map_err(BootstrapError::Decompress)?;

    let config: GlobalConfig = serde_yaml::from_slice(&yaml)?;

    let mut certificates = Vec::with_capacity(config.trustedcas.len());
    for ca in config.trustedcas {
        let certs = parse_pem_certificates(&ca.cert).map_err(|e| BootstrapError::Certificate {
            common_name: ca.commonname.clone(),
            reason: e.to_string(),
        })?;
        certificates.extend(certs);
    }

    Ok(TrustBundle::new(certificates))
}
