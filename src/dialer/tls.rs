//! TLS client configuration and certificate loading.

use std::io::BufReader;
use std::sync::Arc;
use tokio_rustls::rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use tokio_rustls::rustls::client::WebPkiServerVerifier;
use tokio_rustls::rustls::crypto::{
    aws_lc_rs, verify_tls12_signature, verify_tls13_signature, CryptoProvider, WebPkiSupportedAlgorithms,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, Error as TlsError, RootCertStore, SignatureScheme,
};
use tokio_rustls::TlsConnector;
use crate::bootstrap::TrustBundle;
use crate::dialer::DialError;

/// Parse every certificate in a PEM string.
///
/// Fallback lists sometimes carry escaped newlines; those are unescaped first.
pub fn parse_pem_certificates(pem: &str) -> Result<Vec<CertificateDer<'static>>, DialError> {
    let pem = if pem.contains('\n') {
        pem.to_string()
    } else {
        pem.replace("\\n", "\n")
    };

    let mut reader = BufReader::new(pem.as_bytes());
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DialError::Certificate(e.to_string()))?;

    if certs.is_empty() {
        return Err(DialError::Certificate("no PEM certificate found".to_string()));
    }
    Ok(certs)
}

/// Build a connector for a server that presents `cert_pem`.
///
/// The server's certificate is pinned: an exact DER match is accepted
/// without chain or hostname checks, since fallback certificates are
/// self-signed. Anything else must chain to the trust bundle.
pub fn pinned_connector(cert_pem: &str, bundle: &TrustBundle) -> Result<TlsConnector, DialError> {
    let provider = Arc::new(aws_lc_rs::default_provider());
    let verifier = PinnedCertVerifier::new(parse_pem_certificates(cert_pem)?, bundle, provider.clone())?;

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| DialError::Certificate(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Accepts the pinned certificate, falling back to WebPKI over the bundle.
#[derive(Debug)]
pub struct PinnedCertVerifier {
    pinned: Vec<CertificateDer<'static>>,
    bundle: Option<Arc<WebPkiServerVerifier>>,
    algorithms: WebPkiSupportedAlgorithms,
}

impl PinnedCertVerifier {
    pub fn new(
        pinned: Vec<CertificateDer<'static>>,
        bundle: &TrustBundle,
        provider: Arc<CryptoProvider>,
    ) -> Result<Self, DialError> {
        let algorithms = provider.signature_verification_algorithms;

        let bundle = if bundle.is_empty() {
            None
        } else {
            let mut roots = RootCertStore::empty();
            let (added, ignored) = roots.add_parsable_certificates(bundle.certificates().iter().cloned());
            if ignored > 0 {
                tracing::debug!(added, ignored, "Skipped unparsable trust bundle certificates");
            }
            if roots.is_empty() {
                None
            } else {
                let verifier = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider)
                    .build()
                    .map_err(|e| DialError::Certificate(e.to_string()))?;
                Some(verifier)
            }
        };

        Ok(Self {
            pinned,
            bundle,
            algorithms,
        })
    }
}

impl ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        if self.pinned.iter().any(|cert| cert.as_ref() == end_entity.as_ref()) {
            return Ok(ServerCertVerified::assertion());
        }
        match &self.bundle {
            Some(verifier) => {
                verifier.verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
            }
            None => Err(TlsError::InvalidCertificate(CertificateError::UnknownIssuer)),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

/// SNI name for a host (DNS name or IP literal).
pub fn server_name(host: &str) -> Result<ServerName<'static>, DialError> {
    ServerName::try_from(host.to_string()).map_err(|_| DialError::ServerName(host.to_string()))
}
