//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (workers, checks, timeouts > 0)
//! - Validate the upstream URL and marker header used by verify mode
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CheckConfig → Result<(), Vec<ValidationError>>
//! - Runs before any network activity

use http::header::HeaderName;
use thiserror::Error;
use url::Url;
use crate::config::schema::{CheckConfig, CheckMode, VerifyBodyMode};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must be at least 1")]
    NotPositive(&'static str),

    #[error("fallbacks_file must not be empty")]
    MissingFallbacksFile,

    #[error("invalid {field} {value:?}: {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid marker header {0:?}")]
    InvalidHeader(String),

    #[error("invalid log level {0:?}")]
    InvalidLogLevel(String),
}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &CheckConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.fallbacks_file.as_os_str().is_empty() {
        errors.push(ValidationError::MissingFallbacksFile);
    }
    if config.workers == 0 {
        errors.push(ValidationError::NotPositive("workers"));
    }
    if config.checks == 0 {
        errors.push(ValidationError::NotPositive("checks"));
    }
    if config.timeout_secs == 0 {
        errors.push(ValidationError::NotPositive("timeout_secs"));
    }
    if config.dial_timeout_secs == 0 {
        errors.push(ValidationError::NotPositive("dial_timeout_secs"));
    }

    if config.mode == CheckMode::Verify {
        // The request goes out in absolute form over the proxy hop.
        if let Err(reason) = check_url(&config.verify.url, &["http"]) {
            errors.push(ValidationError::InvalidUrl {
                field: "verify.url",
                value: config.verify.url.clone(),
                reason,
            });
        }
        if HeaderName::from_bytes(config.verify.marker_header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeader(config.verify.marker_header.clone()));
        }
        if config.verify.body == VerifyBodyMode::Exact && config.verify.expected_body.is_empty() {
            errors.push(ValidationError::NotPositive("verify.expected_body length"));
        }
    }

    if config.trust.enabled {
        if let Err(reason) = check_url(&config.trust.global_config_url, &["http", "https"]) {
            errors.push(ValidationError::InvalidUrl {
                field: "trust.global_config_url",
                value: config.trust.global_config_url.clone(),
                reason,
            });
        }
        if config.trust.fetch_timeout_secs == 0 {
            errors.push(ValidationError::NotPositive("trust.fetch_timeout_secs"));
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(value: &str, schemes: &[&str]) -> Result<(), String> {
    let url = Url::parse(value).map_err(|e| e.to_string())?;
    if !schemes.contains(&url.scheme()) {
        return Err(format!("scheme must be one of {}", schemes.join(", ")));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&CheckConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_range_error() {
        let mut config = CheckConfig::default();
        config.workers = 0;
        config.checks = 0;
        config.timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::NotPositive("workers")));
        assert!(errors.contains(&ValidationError::NotPositive("checks")));
        assert!(errors.contains(&ValidationError::NotPositive("timeout_secs")));
    }

    #[test]
    fn verify_settings_checked_only_in_verify_mode() {
        let mut config = CheckConfig::default();
        config.verify.url = "ftp://example.com/file".into();
        config.verify.marker_header = "bad header".into();
        assert!(validate_config(&config).is_ok());

        config.mode = CheckMode::Verify;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ValidationError::InvalidUrl { field: "verify.url", .. }));
        assert_eq!(errors[1], ValidationError::InvalidHeader("bad header".into()));
    }

    #[test]
    fn exact_body_mode_needs_expected_body() {
        let mut config = CheckConfig::default();
        config.mode = CheckMode::Verify;
        config.verify.body = VerifyBodyMode::Exact;
        assert!(validate_config(&config).is_err());

        config.verify.expected_body = "pong".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn trust_url_ignored_when_disabled() {
        let mut config = CheckConfig::default();
        config.trust.global_config_url = "not a url".into();
        assert!(validate_config(&config).is_err());

        config.trust.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = CheckConfig::default();
        config.observability.log_level = "loud".into();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidLogLevel("loud".into())])
        );
    }
}
