//! Per-record probe outcome.

use crate::probe::ProbeError;

/// Result of probing one server record.
#[derive(Debug)]
pub struct ProbeOutcome {
    /// Address of the probed record, for correlation.
    pub address: String,
    /// Failure, if any. `None` means the probe passed.
    pub error: Option<ProbeError>,
    /// Raw request/response dumps, collected in verbose mode only.
    pub diagnostics: Vec<String>,
}

impl ProbeOutcome {
    pub fn success(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            error: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn failure(address: impl Into<String>, error: ProbeError) -> Self {
        Self {
            address: address.into(),
            error: Some(error),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<String>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_do_not_affect_success() {
        let ok = ProbeOutcome::success("1.2.3.4:443").with_diagnostics(vec!["dump".into()]);
        assert!(ok.is_success());

        let failed = ProbeOutcome::failure("1.2.3.4:443", ProbeError::BadStatus(502));
        assert!(!failed.is_success());
        assert!(failed.diagnostics.is_empty());
    }
}
