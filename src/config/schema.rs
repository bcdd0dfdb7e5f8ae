//! Configuration schema definitions.
//!
//! This module defines the complete run configuration for the checker.
//! All types derive Serde traits for deserialization from config files;
//! command-line flags are applied on top.

use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Root configuration for one checker run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckConfig {
    /// JSON file holding an array of arrays of fallback servers.
    pub fallbacks_file: PathBuf,

    /// Number of concurrent workers.
    pub workers: usize,

    /// Checks per connection. Detects blocking after a few exchanges.
    pub checks: u32,

    /// Deadline for each check in seconds.
    pub timeout_secs: u64,

    /// Deadline for establishing a connection in seconds.
    pub dial_timeout_secs: u64,

    /// Print request/response dumps after each outcome.
    pub verbose: bool,

    /// Print a line for servers that passed, not only failures.
    pub report_success: bool,

    /// Which check to run.
    pub mode: CheckMode,

    /// Upstream verification settings (mode = "verify").
    pub verify: VerifyConfig,

    /// Trust bundle bootstrap settings.
    pub trust: TrustConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            fallbacks_file: PathBuf::from("fallbacks.json"),
            workers: 1,
            checks: 1,
            timeout_secs: 30,
            dial_timeout_secs: 15,
            verbose: false,
            report_success: true,
            mode: CheckMode::Ping,
            verify: VerifyConfig::default(),
            trust: TrustConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl CheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_secs(self.dial_timeout_secs)
    }
}

/// Check strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    /// Ask the proxy to echo a 1 KiB payload.
    Ping,
    /// Fetch a real upstream resource through the proxy.
    Verify,
}

/// Upstream verification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Upstream URL fetched through the proxy (plain http).
    pub url: String,

    /// Header that must be present on the upstream response.
    pub marker_header: String,

    /// How the response body is judged.
    pub body: VerifyBodyMode,

    /// Expected body for `body = "exact"`.
    pub expected_body: String,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            url: "http://config.getiantem.org/proxies.yaml.gz".to_string(),
            marker_header: "etag".to_string(),
            body: VerifyBodyMode::GzipYaml,
            expected_body: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerifyBodyMode {
    GzipYaml,
    Exact,
}

/// Trust bundle bootstrap configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Fetch trusted CAs before probing.
    pub enabled: bool,

    /// Gzipped YAML global config holding `trustedcas`.
    pub global_config_url: String,

    /// Fetch timeout in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            global_config_url: "https://globalconfig.flashlightproxy.com/global.yaml.gz".to_string(),
            fetch_timeout_secs: 30,
        }
    }
}

impl TrustConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Append JSON logs to a file in `log_dir` as well as the console.
    pub log_file: bool,

    /// Directory for the JSON log file.
    pub log_dir: PathBuf,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: true,
            log_dir: default_log_dir(),
        }
    }
}

/// Platform log directory: `/var/log/checkfallbacks` on Linux, otherwise
/// `checkfallbacks-logs` under the working directory.
pub fn default_log_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        PathBuf::from("/var/log/checkfallbacks")
    } else {
        PathBuf::from("checkfallbacks-logs")
    }
}
