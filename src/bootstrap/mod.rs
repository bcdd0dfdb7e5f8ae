//! Trust material bootstrap.
//!
//! # Data Flow
//! ```text
//! global config URL (gzipped YAML)
//!     → global.rs (fetch, gunzip, parse trustedcas)
//!     → TrustBundle (immutable)
//!     → shared via Arc with the dialer factory only
//! ```
//!
//! # Design Decisions
//! - Runs once, before any record is dispatched
//! - Any failure is fatal to the run
//! - The probe engine never sees the bundle, only dialers do

pub mod global;

use tokio_rustls::rustls::pki_types::CertificateDer;

pub use global::{fetch_trust_bundle, parse_global_config, BootstrapError};

/// CA certificates trusted by dialers in addition to per-server pins.
#[derive(Debug, Clone, Default)]
pub struct TrustBundle {
    certificates: Vec<CertificateDer<'static>>,
}

impl TrustBundle {
    pub fn new(certificates: Vec<CertificateDer<'static>>) -> Self {
        Self { certificates }
    }

    pub fn certificates(&self) -> &[CertificateDer<'static>] {
        &self.certificates
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }
}
