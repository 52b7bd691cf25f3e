//! TLS trust pinned to the node's own certificate.
//!
//! LND serves its REST gateway with a self-issued certificate, so the client
//! trusts only the certificate(s) handed to it and never the platform store.

use std::sync::Arc;

use rustls::{
    client::{
        danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
        verify_server_name, WebPkiServerVerifier,
    },
    crypto::{aws_lc_rs, CryptoProvider},
    pki_types::{pem::PemObject, CertificateDer, ServerName, UnixTime},
    server::ParsedCertificate,
    CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};
use tracing::{debug, trace};
use x509_parser::prelude::{FromDer as _, X509Certificate};

use super::TransportError;

/// Parse every PEM `CERTIFICATE` block in `pem`.
///
/// # Errors
/// Fails when the input is not valid PEM or contains no certificate.
pub fn parse_pem_certificates(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, TransportError> {
    let certs = CertificateDer::pem_slice_iter(pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TransportError::tls_message(format!("invalid PEM certificate: {e:?}")))?;
    if certs.is_empty() {
        return Err(TransportError::tls_message(
            "no PEM certificate found in TLS certificate data",
        ));
    }
    Ok(certs)
}

/// Build a rustls client config whose only trust anchors are the given PEM certificates.
///
/// # Errors
/// Returns [`TransportError::Tls`] when the certificates cannot be parsed or used as anchors.
pub fn pinned_client_config(pem: &[u8]) -> Result<ClientConfig, TransportError> {
    let pinned = parse_pem_certificates(pem)?;
    let provider = Arc::new(aws_lc_rs::default_provider());
    let verifier = PinnedCertVerifier::new(pinned, provider.clone())?;
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::tls("unsupported TLS protocol versions", e))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    Ok(config)
}

/// Server verifier that accepts chains to the pinned anchors, plus an exact
/// match of a pinned certificate used directly as the server certificate.
///
/// The exact-match path covers LND's default `tls.cert`, which is self-signed
/// with `CA:TRUE` and therefore rejected by WebPKI as an end-entity certificate.
/// A pinned certificate must still be within its validity period and name the
/// host being dialed.
#[derive(Debug)]
pub struct PinnedCertVerifier {
    pinned: Vec<CertificateDer<'static>>,
    inner: Arc<WebPkiServerVerifier>,
}

impl PinnedCertVerifier {
    /// Build a verifier over `pinned` using `provider` for signature checks.
    ///
    /// # Errors
    /// Returns [`TransportError::Tls`] if a certificate is unusable as a trust anchor.
    pub fn new(
        pinned: Vec<CertificateDer<'static>>,
        provider: Arc<CryptoProvider>,
    ) -> Result<Self, TransportError> {
        let mut roots = RootCertStore::empty();
        for cert in &pinned {
            roots
                .add(cert.clone())
                .map_err(|e| TransportError::tls("pinned certificate is not a valid trust anchor", e))?;
        }
        debug!(target: "lnd_rest::tls", anchors = roots.len(), "pinned trust store built");
        let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider)
            .build()
            .map_err(|e| TransportError::tls("failed to build certificate verifier", e))?;
        Ok(Self { pinned, inner })
    }

    fn is_pinned(&self, cert: &CertificateDer<'_>) -> bool {
        self.pinned.iter().any(|p| p.as_ref() == cert.as_ref())
    }

    fn verify_pinned(
        cert: &CertificateDer<'_>,
        server_name: &ServerName<'_>,
        now: UnixTime,
    ) -> Result<(), rustls::Error> {
        check_validity_period(cert, now)?;
        verify_server_name(&ParsedCertificate::try_from(cert)?, server_name)
    }
}

fn check_validity_period(cert: &CertificateDer<'_>, now: UnixTime) -> Result<(), rustls::Error> {
    let (_, parsed) = X509Certificate::from_der(cert.as_ref())
        .map_err(|_| rustls::Error::InvalidCertificate(CertificateError::BadEncoding))?;
    let validity = parsed.validity();
    let now = i64::try_from(now.as_secs()).unwrap_or(i64::MAX);
    if now < validity.not_before.timestamp() {
        return Err(rustls::Error::InvalidCertificate(CertificateError::NotValidYet));
    }
    if now > validity.not_after.timestamp() {
        return Err(rustls::Error::InvalidCertificate(CertificateError::Expired));
    }
    Ok(())
}

impl ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if self.is_pinned(end_entity) {
            trace!(target: "lnd_rest::tls", "server presented a pinned certificate");
            return Self::verify_pinned(end_entity, server_name, now)
                .map(|()| ServerCertVerified::assertion())
                .inspect_err(|e| debug!(target: "lnd_rest::tls", error = %e, "pinned certificate rejected"));
        }
        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
            .inspect_err(|e| debug!(target: "lnd_rest::tls", error = %e, "server certificate rejected"))
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}
